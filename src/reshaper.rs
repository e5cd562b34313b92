//! Walks one game's flat event stream and assembles the per-hand tree.

use crate::errors::{ReshapeError, ReshapeResult};
use crate::event::{classify, parse_list, parse_seat, EventKind, Game, RawEvent};
use crate::hand::{score_deltas, DrawKind, Hand, HandBuilder, HandSetup, Outcome, Winner, SEATS};
use crate::rule::ReshapeRule;
use crate::tiles::try_tile_id;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Final score and uma of one seat, from the `owari` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// In hundreds of points.
    pub score: i32,
    pub uma: f64,
}

/// Top-level record of a reshaped game, in stream order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEntry {
    Hand(Hand),
    /// A dora indicator revealed after a kan.
    Dora { tile: u8 },
    /// A seat disconnected.
    Bye { seat: u8 },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReshapedGame {
    pub log_id: String,
    /// Attributes of the `UN` seen before the first hand (names, dan, rate, sex).
    pub metadata: BTreeMap<String, String>,
    pub entries: Vec<GameEntry>,
    pub final_standing: Option<[Standing; SEATS]>,
}

impl ReshapedGame {
    pub fn hands(&self) -> impl Iterator<Item = &Hand> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            GameEntry::Hand(hand) => Some(hand),
            _ => None,
        })
    }
}

/// A game reshaped to the end, possibly with recovered per-event errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Reshaped {
    pub game: ReshapedGame,
    pub warnings: Vec<ReshapeError>,
}

/// A game whose stream broke the hand lifecycle. `partial` holds everything
/// assembled before the violation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReshapeFailure {
    pub partial: ReshapedGame,
    pub warnings: Vec<ReshapeError>,
    pub violation: ReshapeError,
}

impl fmt::Display for ReshapeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} hands kept, {} warnings)",
            self.violation,
            self.partial.hands().count(),
            self.warnings.len()
        )
    }
}

impl std::error::Error for ReshapeFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.violation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    BeforeFirstHand,
    InHand,
    Done,
}

/// Cursor-driven state machine over one game.
///
/// Normally each [`step`](Reshaper::step) consumes one event; a riichi
/// declaration consumes its discard and possibly the acceptance or call
/// that follows it.
pub struct Reshaper<'g> {
    events: &'g [RawEvent],
    log_id: &'g str,
    rule: ReshapeRule,
    cursor: usize,
    phase: Phase,
    builder: HandBuilder,
    out: ReshapedGame,
    warnings: Vec<ReshapeError>,
}

impl<'g> Reshaper<'g> {
    pub fn new(game: &'g Game, rule: ReshapeRule) -> Self {
        let phase = if game.events.is_empty() {
            Phase::Done
        } else {
            Phase::BeforeFirstHand
        };
        Self {
            events: &game.events,
            log_id: &game.log_id,
            rule,
            cursor: 0,
            phase,
            builder: HandBuilder::new(game.log_id.as_str(), rule.merge_double_ron),
            out: ReshapedGame {
                log_id: game.log_id.clone(),
                ..ReshapedGame::default()
            },
            warnings: Vec::new(),
        }
    }

    /// Index of the next unconsumed event.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn warnings(&self) -> &[ReshapeError] {
        &self.warnings
    }

    /// Runs to the end of the stream.
    pub fn run(mut self) -> Result<Reshaped, ReshapeFailure> {
        loop {
            match self.step() {
                Ok(true) => {}
                Ok(false) => return Ok(self.finish()),
                Err(violation) => {
                    log::warn!("{}", violation);
                    if let Some(hand) = self.builder.take_closed() {
                        self.out.entries.push(GameEntry::Hand(hand));
                    }
                    return Err(ReshapeFailure {
                        partial: self.out,
                        warnings: self.warnings,
                        violation,
                    });
                }
            }
        }
    }

    /// Processes one event (or one riichi sequence). Returns `Ok(false)` once
    /// the stream is exhausted; `Err` only for invariant violations.
    pub fn step(&mut self) -> ReshapeResult<bool> {
        let events = self.events;
        let Some(event) = events.get(self.cursor) else {
            self.phase = Phase::Done;
            return Ok(false);
        };
        self.cursor += 1;

        let kind = classify(&event.tag);
        if kind != EventKind::Win {
            self.flush_closed();
        }
        let result = self.dispatch(event, kind);
        self.absorb(result)?;

        if self.cursor >= self.events.len() {
            self.phase = Phase::Done;
        }
        Ok(self.phase != Phase::Done)
    }

    fn dispatch(&mut self, event: &RawEvent, kind: EventKind) -> ReshapeResult<()> {
        match kind {
            EventKind::HandStart => {
                let setup = HandSetup::from_event(event, self.log_id).map_err(|err| {
                    ReshapeError::InvariantViolation {
                        log_id: self.log_id.to_string(),
                        message: format!("unreadable hand start: {}", err),
                    }
                })?;
                self.builder.start_hand(setup)?;
                self.phase = Phase::InHand;
                Ok(())
            }
            EventKind::Ignorable => Ok(()),
            EventKind::Disconnect => {
                let seat = parse_seat(event, "who", self.log_id)?;
                self.out.entries.push(GameEntry::Bye { seat });
                Ok(())
            }
            EventKind::SeatIdentity => self.seat_identity(event),
            EventKind::DoraReveal => {
                let raw: u8 = event.parse("hai", self.log_id)?;
                let tile = try_tile_id(raw, self.log_id, &event.tag)?;
                self.out.entries.push(GameEntry::Dora { tile });
                Ok(())
            }
            EventKind::Win => {
                let seats = parse_seat(event, "who", self.log_id).and_then(|who| {
                    let from_who = parse_seat(event, "fromWho", self.log_id)?;
                    Ok(Winner { who, from_who })
                });
                let deltas = self.deltas_or_zero(event);
                self.final_standing(event);
                match seats {
                    Ok(winner) => {
                        self.builder.close_on_win(winner, deltas)?;
                    }
                    Err(err) => {
                        self.report(err);
                        let outcome = if event.get("who") == event.get("fromWho") {
                            Outcome::Tsumo
                        } else {
                            Outcome::Ron
                        };
                        self.builder.close_on_unattributed_win(outcome, deltas)?;
                    }
                }
                Ok(())
            }
            EventKind::AbortiveDraw => {
                let kind = match DrawKind::from_type(event.get("type")) {
                    Some(kind) => kind,
                    None => {
                        self.report(event.malformed(
                            self.log_id,
                            format!("unknown draw type '{}'", event.get("type").unwrap_or("")),
                        ));
                        DrawKind::Exhaustive
                    }
                };
                let deltas = self.deltas_or_zero(event);
                self.final_standing(event);
                self.builder.close_on_draw(kind, deltas)?;
                Ok(())
            }
            EventKind::Discard { seat, raw_tile } => self.builder.record_discard(seat, raw_tile),
            EventKind::Draw { seat, raw_tile } => self.builder.record_draw(seat, raw_tile),
            EventKind::Call => self.call(event),
            EventKind::ReadyDeclare => self.riichi(event),
            EventKind::Unknown => Err(ReshapeError::UnknownEventTag {
                log_id: self.log_id.to_string(),
                tag: event.tag.clone(),
            }),
        }
    }

    fn seat_identity(&mut self, event: &RawEvent) -> ReshapeResult<()> {
        if self.phase == Phase::BeforeFirstHand {
            self.out
                .metadata
                .extend(event.attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
            return Ok(());
        }
        if self.rule.late_seat_identity_is_error {
            return Err(event.malformed(self.log_id, "seat identity after the first hand".to_string()));
        }
        log::debug!("{}: ignoring reconnect UN", self.log_id);
        Ok(())
    }

    fn call(&mut self, event: &RawEvent) -> ReshapeResult<()> {
        let who = parse_seat(event, "who", self.log_id)?;
        let bits: u32 = event.parse("m", self.log_id)?;
        self.builder.record_call(who, bits)
    }

    /// Riichi is logged as `REACH step=1`, the declaring discard, then
    /// `REACH step=2` once the deposit is accepted (or a call on the discard).
    fn riichi(&mut self, event: &RawEvent) -> ReshapeResult<()> {
        let step = event.get("step").unwrap_or("");
        let log_id = self.log_id;
        let malformed = || ReshapeError::MalformedRiichi {
            log_id: log_id.to_string(),
            step: step.to_string(),
        };
        if step != "1" && step != "2" {
            return Err(malformed());
        }
        let who = parse_seat(event, "who", self.log_id)?;
        if step == "2" {
            if self.builder.accept_ready(who) {
                return Ok(());
            }
            return Err(malformed());
        }

        self.builder.record_ready(who)?;

        let events = self.events;
        let declaring_discard = events.get(self.cursor).map(|next| classify(&next.tag));
        let Some(EventKind::Discard { seat, raw_tile }) = declaring_discard else {
            return Err(event.malformed(
                self.log_id,
                "riichi declaration not followed by a discard".to_string(),
            ));
        };
        self.cursor += 1;
        if seat != who {
            self.report(event.malformed(
                self.log_id,
                format!("seat {} declared but seat {} discarded", who, seat),
            ));
        }
        let result = self.builder.record_discard(seat, raw_tile);
        self.absorb(result)?;

        let Some(after) = events.get(self.cursor) else {
            return Ok(());
        };
        match classify(&after.tag) {
            EventKind::ReadyDeclare if after.get("step") == Some("2") => {
                self.cursor += 1;
                if let Ok(acceptor) = parse_seat(after, "who", self.log_id) {
                    self.builder.accept_ready(acceptor);
                }
                Ok(())
            }
            EventKind::Call => {
                self.cursor += 1;
                self.call(after)
            }
            _ => Ok(()),
        }
    }

    fn deltas_or_zero(&mut self, event: &RawEvent) -> [i32; SEATS] {
        score_deltas(event, self.log_id).unwrap_or_else(|err| {
            self.report(err);
            [0; SEATS]
        })
    }

    fn final_standing(&mut self, event: &RawEvent) {
        if !self.rule.record_final_standing || event.get("owari").is_none() {
            return;
        }
        let parsed = parse_list::<f64>(event, "owari", self.log_id).and_then(|values| {
            if values.len() != SEATS * 2 {
                return Err(event.malformed(
                    self.log_id,
                    format!("expected 8 'owari' entries, got {}", values.len()),
                ));
            }
            let mut standing = [Standing { score: 0, uma: 0.0 }; SEATS];
            for (seat, pair) in values.chunks_exact(2).enumerate() {
                standing[seat] = Standing {
                    score: pair[0].round() as i32,
                    uma: pair[1],
                };
            }
            Ok(standing)
        });
        match parsed {
            Ok(standing) => self.out.final_standing = Some(standing),
            Err(err) => self.report(err),
        }
    }

    fn flush_closed(&mut self) {
        if let Some(hand) = self.builder.take_closed() {
            self.out.entries.push(GameEntry::Hand(hand));
        }
    }

    /// Keeps fatal errors flowing up; records everything else.
    fn absorb(&mut self, result: ReshapeResult<()>) -> ReshapeResult<()> {
        match result {
            Err(err) if !err.is_fatal() => {
                self.report(err);
                Ok(())
            }
            other => other,
        }
    }

    fn report(&mut self, err: ReshapeError) {
        log::error!("{}", err);
        self.warnings.push(err);
    }

    fn finish(mut self) -> Reshaped {
        self.flush_closed();
        if self.builder.is_open() {
            let last_tag = self.events.last().map(|e| e.tag.clone()).unwrap_or_default();
            self.report(ReshapeError::MalformedEvent {
                log_id: self.log_id.to_string(),
                tag: last_tag,
                message: "stream ended before the hand closed; hand dropped".to_string(),
            });
        }
        self.phase = Phase::Done;
        Reshaped {
            game: self.out,
            warnings: self.warnings,
        }
    }
}

/// Reshapes one game with the default rule.
pub fn reshape(game: &Game) -> Result<Reshaped, ReshapeFailure> {
    reshape_with_rule(game, &ReshapeRule::default())
}

pub fn reshape_with_rule(game: &Game, rule: &ReshapeRule) -> Result<Reshaped, ReshapeFailure> {
    Reshaper::new(game, *rule).run()
}
