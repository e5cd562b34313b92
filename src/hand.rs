use crate::errors::{ReshapeError, ReshapeResult};
use crate::event::{parse_list, RawEvent};
use crate::meld::{decode_meld, CallType};
use crate::tiles::try_tile_id;
use serde::{Deserialize, Serialize};

pub const SEATS: usize = 4;

/// Round counters packed into the `seed` attribute of `INIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInfo {
    /// 0 = East 1, 4 = South 1, ...
    pub round: u8,
    pub honba: u8,
    pub riichi_sticks: u8,
    pub dice: [u8; 2],
    /// Raw index of the first dora indicator, as logged.
    pub dora_indicator: u8,
}

impl RoundInfo {
    fn from_seed(seed: &str) -> Option<Self> {
        let values: Vec<u8> = seed
            .split(',')
            .map(|v| v.trim().parse().ok())
            .collect::<Option<_>>()?;
        match values[..] {
            [round, honba, riichi_sticks, d0, d1, dora_indicator] => Some(Self {
                round,
                honba,
                riichi_sticks,
                dice: [d0, d1],
                dora_indicator,
            }),
            _ => None,
        }
    }
}

/// Everything known about a hand at the moment it is dealt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandSetup {
    pub dealer: u8,
    /// Raw tile indices of each seat's starting hand, as logged.
    pub starting_hands: [Vec<u8>; SEATS],
    /// Scores at the deal, in hundreds of points.
    pub starting_scores: [i32; SEATS],
    pub round: Option<RoundInfo>,
}

impl HandSetup {
    /// Reads `oya`, `hai0`..`hai3`, `ten` and (optionally) `seed` from `INIT`.
    pub fn from_event(event: &RawEvent, log_id: &str) -> ReshapeResult<Self> {
        let dealer: u8 = event.parse("oya", log_id)?;
        if dealer as usize >= SEATS {
            return Err(event.malformed(log_id, format!("dealer {} out of range", dealer)));
        }

        let mut starting_hands: [Vec<u8>; SEATS] = Default::default();
        for (seat, hand) in starting_hands.iter_mut().enumerate() {
            *hand = parse_list(event, &format!("hai{}", seat), log_id)?;
        }

        let ten: Vec<i32> = parse_list(event, "ten", log_id)?;
        let starting_scores: [i32; SEATS] = ten.as_slice().try_into().map_err(|_| {
            event.malformed(log_id, format!("expected {} scores, got {}", SEATS, ten.len()))
        })?;

        let round = event.get("seed").and_then(RoundInfo::from_seed);
        if round.is_none() && event.get("seed").is_some() {
            log::debug!("unreadable INIT seed in {}, round info dropped", log_id);
        }

        Ok(Self {
            dealer,
            starting_hands,
            starting_scores,
            round,
        })
    }
}

/// One chronological sub-event of a hand. Tiles are canonical ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandEvent {
    Draw {
        seat: u8,
        tile: u8,
    },
    Discard {
        seat: u8,
        tile: u8,
        is_tsumogiri: bool,
    },
    Call {
        seat: u8,
        call_type: CallType,
    },
    Ready {
        seat: u8,
    },
}

impl HandEvent {
    pub fn seat(&self) -> u8 {
        match *self {
            HandEvent::Draw { seat, .. }
            | HandEvent::Discard { seat, .. }
            | HandEvent::Call { seat, .. }
            | HandEvent::Ready { seat } => seat,
        }
    }
}

/// Cause of a hand that ended without a win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawKind {
    Exhaustive,
    NineTerminals,
    FourRiichi,
    TripleRon,
    FourKans,
    FourWinds,
    NagashiMangan,
}

impl DrawKind {
    /// Maps the `type` attribute of `RYUUKYOKU`; absence means exhaustive.
    pub fn from_type(kind: Option<&str>) -> Option<Self> {
        Some(match kind {
            None => DrawKind::Exhaustive,
            Some("yao9") => DrawKind::NineTerminals,
            Some("reach4") => DrawKind::FourRiichi,
            Some("ron3") => DrawKind::TripleRon,
            Some("kan4") => DrawKind::FourKans,
            Some("kaze4") => DrawKind::FourWinds,
            Some("nm") => DrawKind::NagashiMangan,
            Some(_) => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Tsumo,
    Ron,
    Draw(DrawKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub who: u8,
    pub from_who: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandResult {
    pub outcome: Outcome,
    /// Per-seat score change in hundreds, honba and riichi sticks excluded.
    pub score_deltas: [i32; SEATS],
    /// Empty for draws and for wins whose seats were unreadable; two
    /// entries for a double ron.
    pub winners: Vec<Winner>,
}

/// A finished hand, produced by [`HandBuilder`] when the hand closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    pub setup: HandSetup,
    pub events: Vec<HandEvent>,
    pub result: HandResult,
}

#[derive(Debug)]
struct OpenHand {
    setup: HandSetup,
    events: Vec<HandEvent>,
}

impl OpenHand {
    fn close(self, result: HandResult) -> Hand {
        Hand {
            setup: self.setup,
            events: self.events,
            result,
        }
    }
}

/// Extracts the per-seat deltas from an `sc` attribute.
///
/// `sc` holds (score before, delta) pairs in seat order; only the deltas
/// are kept.
pub fn score_deltas(event: &RawEvent, log_id: &str) -> ReshapeResult<[i32; SEATS]> {
    let sc: Vec<i32> = parse_list(event, "sc", log_id)?;
    if sc.len() != SEATS * 2 {
        return Err(event.malformed(log_id, format!("expected 8 'sc' entries, got {}", sc.len())));
    }
    Ok([sc[1], sc[3], sc[5], sc[7]])
}

/// Mutable per-hand state for one reshape call.
///
/// Holds at most one open hand. A closed hand is kept back until the caller
/// takes it, so that a second ron on the same discard can still be folded in.
#[derive(Debug)]
pub struct HandBuilder {
    log_id: String,
    merge_double_ron: bool,
    last_drawn: [Option<u8>; SEATS],
    awaiting_acceptance: [bool; SEATS],
    open: Option<OpenHand>,
    closed: Option<Hand>,
}

impl HandBuilder {
    pub fn new(log_id: impl Into<String>, merge_double_ron: bool) -> Self {
        Self {
            log_id: log_id.into(),
            merge_double_ron,
            last_drawn: [None; SEATS],
            awaiting_acceptance: [false; SEATS],
            open: None,
            closed: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn start_hand(&mut self, setup: HandSetup) -> ReshapeResult<()> {
        if self.open.is_some() {
            return Err(self.violation("hand started while another is still open"));
        }
        debug_assert!(self.closed.is_none(), "previous hand was never taken");
        self.last_drawn = [None; SEATS];
        self.awaiting_acceptance = [false; SEATS];
        log::debug!("{}: hand opened, dealer {}", self.log_id, setup.dealer);
        self.open = Some(OpenHand {
            setup,
            events: Vec::new(),
        });
        Ok(())
    }

    pub fn record_draw(&mut self, seat: u8, raw_tile: u8) -> ReshapeResult<()> {
        self.ensure_open("draw")?;
        self.check_seat(seat, "draw")?;
        let tile = try_tile_id(raw_tile, &self.log_id, "draw")?;
        self.last_drawn[seat as usize] = Some(raw_tile);
        self.push(HandEvent::Draw { seat, tile })
    }

    pub fn record_discard(&mut self, seat: u8, raw_tile: u8) -> ReshapeResult<()> {
        self.ensure_open("discard")?;
        self.check_seat(seat, "discard")?;
        let tile = try_tile_id(raw_tile, &self.log_id, "discard")?;
        let is_tsumogiri = self.last_drawn[seat as usize] == Some(raw_tile);
        self.push(HandEvent::Discard {
            seat,
            tile,
            is_tsumogiri,
        })
    }

    pub fn record_call(&mut self, seat: u8, bits: u32) -> ReshapeResult<()> {
        self.ensure_open("call")?;
        self.check_seat(seat, "call")?;
        let call_type = decode_meld(bits).ok_or_else(|| ReshapeError::MalformedMeld {
            log_id: self.log_id.clone(),
            bits,
        })?;
        self.push(HandEvent::Call { seat, call_type })
    }

    pub fn record_ready(&mut self, seat: u8) -> ReshapeResult<()> {
        self.ensure_open("riichi")?;
        self.check_seat(seat, "riichi")?;
        self.awaiting_acceptance[seat as usize] = true;
        self.push(HandEvent::Ready { seat })
    }

    /// Marks a seat's declaration as accepted. False if none was pending.
    pub fn accept_ready(&mut self, seat: u8) -> bool {
        self.awaiting_acceptance
            .get_mut(seat as usize)
            .map_or(false, |pending| std::mem::replace(pending, false))
    }

    /// Closes the open hand as a win. With no open hand, a ron directly after
    /// a ron on the same discard is merged into that hand as a second winner.
    pub fn close_on_win(&mut self, winner: Winner, deltas: [i32; SEATS]) -> ReshapeResult<&Hand> {
        if self.open.is_some() {
            let outcome = if winner.who == winner.from_who {
                Outcome::Tsumo
            } else {
                Outcome::Ron
            };
            return self.close_open_win(outcome, vec![winner], deltas);
        }

        let (mergeable, message) = match &self.closed {
            Some(hand) if hand.result.outcome == Outcome::Ron => {
                let same_discard = hand
                    .result
                    .winners
                    .first()
                    .map_or(false, |first| first.from_who == winner.from_who);
                if winner.who == winner.from_who || !same_discard {
                    (false, "second win is not a ron on the same discard")
                } else {
                    (self.merge_double_ron, "double ron with merging disabled")
                }
            }
            _ => (false, "win with no open hand"),
        };
        match self.closed.as_mut() {
            Some(hand) if mergeable => {
                log::debug!("{}: merging double ron by seat {}", self.log_id, winner.who);
                hand.result.winners.push(winner);
                for (total, delta) in hand.result.score_deltas.iter_mut().zip(deltas) {
                    *total += delta;
                }
                Ok(hand)
            }
            _ => Err(ReshapeError::InvariantViolation {
                log_id: self.log_id.clone(),
                message: message.to_string(),
            }),
        }
    }

    /// Closes the open hand as a win whose seats could not be read. The hand
    /// keeps its outcome and deltas but lists no winners.
    pub fn close_on_unattributed_win(
        &mut self,
        outcome: Outcome,
        deltas: [i32; SEATS],
    ) -> ReshapeResult<&Hand> {
        self.ensure_open("win")?;
        self.close_open_win(outcome, Vec::new(), deltas)
    }

    fn close_open_win(
        &mut self,
        outcome: Outcome,
        winners: Vec<Winner>,
        deltas: [i32; SEATS],
    ) -> ReshapeResult<&Hand> {
        let open = self
            .open
            .take()
            .ok_or_else(|| self.violation("win with no open hand"))?;
        log::debug!("{}: hand closed by {:?}", self.log_id, outcome);
        let hand = open.close(HandResult {
            outcome,
            score_deltas: deltas,
            winners,
        });
        Ok(self.closed.insert(hand))
    }

    pub fn close_on_draw(&mut self, kind: DrawKind, deltas: [i32; SEATS]) -> ReshapeResult<&Hand> {
        let open = self
            .open
            .take()
            .ok_or_else(|| self.violation("draw with no open hand"))?;
        log::debug!("{}: hand closed by {:?} draw", self.log_id, kind);
        let hand = open.close(HandResult {
            outcome: Outcome::Draw(kind),
            score_deltas: deltas,
            winners: Vec::new(),
        });
        Ok(self.closed.insert(hand))
    }

    /// Hands over the most recently closed hand, if not yet taken.
    pub fn take_closed(&mut self) -> Option<Hand> {
        self.closed.take()
    }

    fn push(&mut self, event: HandEvent) -> ReshapeResult<()> {
        match self.open.as_mut() {
            Some(hand) => {
                hand.events.push(event);
                Ok(())
            }
            None => Err(self.violation("sub-event with no open hand")),
        }
    }

    fn ensure_open(&self, what: &str) -> ReshapeResult<()> {
        if self.open.is_some() {
            Ok(())
        } else {
            Err(self.violation(&format!("{} with no open hand", what)))
        }
    }

    fn check_seat(&self, seat: u8, what: &str) -> ReshapeResult<()> {
        if (seat as usize) < SEATS {
            return Ok(());
        }
        Err(ReshapeError::MalformedEvent {
            log_id: self.log_id.clone(),
            tag: what.to_string(),
            message: format!("seat {} out of range", seat),
        })
    }

    fn violation(&self, message: &str) -> ReshapeError {
        ReshapeError::InvariantViolation {
            log_id: self.log_id.clone(),
            message: message.to_string(),
        }
    }
}
