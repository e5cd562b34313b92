// src/tiles.rs
use crate::errors::{ReshapeError, ReshapeResult};

/// Number of physical tiles in a four-player set; raw indices run 1..=136.
pub const RAW_TILE_COUNT: u8 = 136;

// Raw indices below this belong to the three numeral suits (man, pin, sou).
const FIRST_HONOR_RAW: u8 = 109;

/// True when `raw` is the designated red copy of a five.
pub fn is_red_five(raw: u8) -> bool {
    let base = 1 + raw.saturating_sub(1) / 4;
    raw < FIRST_HONOR_RAW && raw % 4 == 1 && base % 9 == 5
}

/// Converts a raw tile index (1..=136) into the canonical tile id.
///
/// Order is man, pin, sou, winds, dragons. Each suit is banded ten ids
/// apart (man 1..=9, pin 11..=19, sou 21..=29) and honors take 30..=36.
/// Red fives land on `raw / 36 * 9`, which for pin and sou collides with
/// another tile's id.
///
/// `raw` must be in 1..=136; use [`try_tile_id`] for unchecked input.
pub fn tile_id(raw: u8) -> u8 {
    debug_assert!((1..=RAW_TILE_COUNT).contains(&raw), "raw tile {raw} out of range");
    if is_red_five(raw) {
        return raw / 36 * 9;
    }
    let id = 1 + (raw - 1) / 4 + (raw - 1) / 36;
    if id > 30 {
        // honours
        id - 1
    } else {
        id
    }
}

/// Range-checked [`tile_id`]; `context` names the event for the error.
pub fn try_tile_id(raw: u8, log_id: &str, context: &str) -> ReshapeResult<u8> {
    if (1..=RAW_TILE_COUNT).contains(&raw) {
        Ok(tile_id(raw))
    } else {
        Err(ReshapeError::MalformedEvent {
            log_id: log_id.to_string(),
            tag: context.to_string(),
            message: format!("tile index {} outside 1..={}", raw, RAW_TILE_COUNT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suit_boundaries() {
        assert_eq!(tile_id(1), 1);
        assert_eq!(tile_id(4), 1);
        assert_eq!(tile_id(36), 9);
        assert_eq!(tile_id(37), 11);
        assert_eq!(tile_id(72), 19);
        assert_eq!(tile_id(73), 21);
        assert_eq!(tile_id(108), 29);
    }

    #[test]
    fn honours_close_the_gap() {
        assert_eq!(tile_id(109), 30);
        assert_eq!(tile_id(112), 30);
        assert_eq!(tile_id(136), 36);
    }

    #[test]
    fn red_fives_take_the_special_branch() {
        assert!(is_red_five(17));
        assert!(is_red_five(53));
        assert!(is_red_five(89));
        assert_eq!(tile_id(17), 0);
        assert_eq!(tile_id(53), 9);
        assert_eq!(tile_id(89), 18);

        // the other copies of each five are ordinary
        assert!(!is_red_five(18));
        assert_eq!(tile_id(18), 5);
        assert_eq!(tile_id(54), 15);
        assert_eq!(tile_id(90), 25);
    }

    #[test]
    fn honour_fives_are_not_red() {
        // 125 has base 32, which is 5 mod 9, but it is a dragon
        assert!(!is_red_five(125));
        assert_eq!(tile_id(125), 34);
    }

    #[test]
    fn out_of_range_is_reported() {
        assert!(try_tile_id(0, "g", "T0").is_err());
        assert!(try_tile_id(137, "g", "D137").is_err());
        assert_eq!(try_tile_id(5, "g", "T5"), Ok(2));
    }
}
