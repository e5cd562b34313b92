// src/lib.rs
//! Reshapes flat Tenhou mjlog event streams into one record per hand.
//!
//! Feed a [`Game`] (its id plus raw `(tag, attributes)` events) to
//! [`reshape`] and get back a [`ReshapedGame`]: seat metadata, then hands,
//! dora reveals and disconnects in stream order. Each hand carries its deal,
//! decoded draws/discards/calls/riichi declarations, and its outcome.

mod errors;
mod event;
mod hand;
mod meld;
mod reshaper;
mod rule;
mod tiles;

#[cfg(feature = "python")]
mod python;

pub use errors::{ReshapeError, ReshapeResult};
pub use event::{classify, EventKind, Game, RawEvent};
pub use hand::{
    score_deltas, DrawKind, Hand, HandBuilder, HandEvent, HandResult, HandSetup, Outcome,
    RoundInfo, Winner, SEATS,
};
pub use meld::{decode_meld, CallType};
pub use reshaper::{
    reshape, reshape_with_rule, GameEntry, Phase, ReshapeFailure, Reshaped, ReshapedGame,
    Reshaper, Standing,
};
pub use rule::ReshapeRule;
pub use tiles::{is_red_five, tile_id, try_tile_id, RAW_TILE_COUNT};
