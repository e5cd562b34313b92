//! Raw mjlog events and their classification.
//!
//! The log is a flat list of tagged records. Several categories share a
//! first letter (`T37` is a draw, `TAIKYOKU` is not), so classification
//! looks at the shape of the whole tag rather than its prefix alone.

use crate::errors::{ReshapeError, ReshapeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// One record of the input stream: a tag plus its string attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawEvent {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
}

impl RawEvent {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter, handy for fixtures.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Required attribute; a missing one is a malformed event.
    pub fn require(&self, key: &str, log_id: &str) -> ReshapeResult<&str> {
        self.get(key).ok_or_else(|| self.malformed(log_id, format!("missing '{}'", key)))
    }

    /// Required attribute parsed into `T`.
    pub fn parse<T: FromStr>(&self, key: &str, log_id: &str) -> ReshapeResult<T> {
        let raw = self.require(key, log_id)?;
        raw.trim()
            .parse()
            .map_err(|_| self.malformed(log_id, format!("bad '{}' value '{}'", key, raw)))
    }

    pub fn malformed(&self, log_id: &str, message: String) -> ReshapeError {
        ReshapeError::MalformedEvent {
            log_id: log_id.to_string(),
            tag: self.tag.clone(),
            message,
        }
    }
}

/// One game's worth of input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Game {
    pub log_id: String,
    pub events: Vec<RawEvent>,
}

impl Game {
    pub fn new(log_id: impl Into<String>, events: Vec<RawEvent>) -> Self {
        Self {
            log_id: log_id.into(),
            events,
        }
    }
}

/// Semantic category of a raw tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `INIT`
    HandStart,
    /// `SHUFFLE`, `GO`, `TAIKYOKU`
    Ignorable,
    /// `BYE`
    Disconnect,
    /// `UN`
    SeatIdentity,
    /// `DORA`
    DoraReveal,
    /// `AGARI`
    Win,
    /// `RYUUKYOKU`
    AbortiveDraw,
    /// `D`/`E`/`F`/`G` followed by a tile index.
    Discard { seat: u8, raw_tile: u8 },
    /// `T`/`U`/`V`/`W` followed by a tile index.
    Draw { seat: u8, raw_tile: u8 },
    /// `N`
    Call,
    /// `REACH`
    ReadyDeclare,
    Unknown,
}

const DISCARD_PREFIXES: [char; 4] = ['D', 'E', 'F', 'G'];
const DRAW_PREFIXES: [char; 4] = ['T', 'U', 'V', 'W'];

/// Classifies a tag. Total: anything unrecognised is `Unknown`.
pub fn classify(tag: &str) -> EventKind {
    match tag {
        "INIT" => return EventKind::HandStart,
        "SHUFFLE" | "GO" | "TAIKYOKU" => return EventKind::Ignorable,
        "BYE" => return EventKind::Disconnect,
        "UN" => return EventKind::SeatIdentity,
        "DORA" => return EventKind::DoraReveal,
        "AGARI" => return EventKind::Win,
        "RYUUKYOKU" => return EventKind::AbortiveDraw,
        "N" => return EventKind::Call,
        "REACH" => return EventKind::ReadyDeclare,
        _ => {}
    }

    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return EventKind::Unknown;
    };
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return EventKind::Unknown;
    }
    let Ok(raw_tile) = digits.parse::<u8>() else {
        return EventKind::Unknown;
    };

    if let Some(seat) = DISCARD_PREFIXES.iter().position(|&c| c == first) {
        EventKind::Discard {
            seat: seat as u8,
            raw_tile,
        }
    } else if let Some(seat) = DRAW_PREFIXES.iter().position(|&c| c == first) {
        EventKind::Draw {
            seat: seat as u8,
            raw_tile,
        }
    } else {
        EventKind::Unknown
    }
}

/// Parses a comma-separated list of values such as `sc`, `ten` or `hai0`.
pub(crate) fn parse_list<T: FromStr>(
    event: &RawEvent,
    key: &str,
    log_id: &str,
) -> ReshapeResult<Vec<T>> {
    let raw = event.require(key, log_id)?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|item| {
            item.trim().parse::<T>().map_err(|_| {
                event.malformed(log_id, format!("bad item '{}' in '{}'", item, key))
            })
        })
        .collect()
}

/// Parses the acting seat (`who`, `fromWho`), checking it is 0..=3.
pub(crate) fn parse_seat(event: &RawEvent, key: &str, log_id: &str) -> ReshapeResult<u8> {
    let seat: u8 = event.parse(key, log_id)?;
    if seat > 3 {
        return Err(event.malformed(log_id, format!("seat {} out of range", seat)));
    }
    Ok(seat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_tags() {
        assert_eq!(classify("INIT"), EventKind::HandStart);
        assert_eq!(classify("SHUFFLE"), EventKind::Ignorable);
        assert_eq!(classify("GO"), EventKind::Ignorable);
        assert_eq!(classify("TAIKYOKU"), EventKind::Ignorable);
        assert_eq!(classify("BYE"), EventKind::Disconnect);
        assert_eq!(classify("UN"), EventKind::SeatIdentity);
        assert_eq!(classify("DORA"), EventKind::DoraReveal);
        assert_eq!(classify("AGARI"), EventKind::Win);
        assert_eq!(classify("RYUUKYOKU"), EventKind::AbortiveDraw);
        assert_eq!(classify("N"), EventKind::Call);
        assert_eq!(classify("REACH"), EventKind::ReadyDeclare);
    }

    #[test]
    fn seat_from_first_letter() {
        assert_eq!(classify("T37"), EventKind::Draw { seat: 0, raw_tile: 37 });
        assert_eq!(classify("U5"), EventKind::Draw { seat: 1, raw_tile: 5 });
        assert_eq!(classify("V136"), EventKind::Draw { seat: 2, raw_tile: 136 });
        assert_eq!(classify("W1"), EventKind::Draw { seat: 3, raw_tile: 1 });
        assert_eq!(classify("D12"), EventKind::Discard { seat: 0, raw_tile: 12 });
        assert_eq!(classify("G99"), EventKind::Discard { seat: 3, raw_tile: 99 });
    }

    #[test]
    fn shared_prefixes_do_not_collide() {
        // same first letters as draw/discard tags, but not followed by digits
        assert_eq!(classify("TAIKYOKU"), EventKind::Ignorable);
        assert_eq!(classify("UN"), EventKind::SeatIdentity);
        assert_eq!(classify("DORA"), EventKind::DoraReveal);
        assert_eq!(classify("D"), EventKind::Unknown);
        assert_eq!(classify("T12x"), EventKind::Unknown);
        assert_eq!(classify("X12"), EventKind::Unknown);
        assert_eq!(classify(""), EventKind::Unknown);
        assert_eq!(classify("T999"), EventKind::Unknown);
    }

    #[test]
    fn list_and_seat_parsing() {
        let ev = RawEvent::new("AGARI")
            .with("sc", "250,-10,260,30")
            .with("who", "4");
        let sc: Vec<i32> = parse_list(&ev, "sc", "g").unwrap();
        assert_eq!(sc, vec![250, -10, 260, 30]);
        assert!(parse_seat(&ev, "who", "g").is_err());
        assert!(parse_seat(&ev, "fromWho", "g").is_err());
    }

    #[test]
    fn raw_event_round_trips_through_json() {
        let json = r#"{"tag":"INIT","attrs":{"oya":"0"}}"#;
        let ev: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.get("oya"), Some("0"));
        let bare: RawEvent = serde_json::from_str(r#"{"tag":"GO"}"#).unwrap();
        assert!(bare.attrs.is_empty());
    }
}
