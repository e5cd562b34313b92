// src/meld.rs
use serde::{Deserialize, Serialize};

/// Kind of call packed into the `m` attribute of an `<N>` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    /// Chi.
    Sequence,
    /// Pon.
    Triplet,
    /// Kan from the bit pattern with no chi/pon/kakan flag set.
    ConcealedQuad,
    /// A pon upgraded to a kan (kakan).
    PromotedQuad,
}

impl CallType {
    pub fn as_str(self) -> &'static str {
        match self {
            CallType::Sequence => "chi",
            CallType::Triplet => "pon",
            CallType::ConcealedQuad => "kan",
            CallType::PromotedQuad => "kakan",
        }
    }
}

const CHI_FLAG: u32 = 0b100;
const PON_MASK: u32 = 0b1100;
const PON_FLAG: u32 = 0b1000;
const KAKAN_MASK: u32 = 0b1_1100;
const KAKAN_FLAG: u32 = 0b1_0000;
const KAN_MASK: u32 = 0b1111_1100;

/// Decodes the meld bit-field. `None` means the pattern is not one we know
/// (for example a sanma kita), and the caller should report it.
pub fn decode_meld(bits: u32) -> Option<CallType> {
    if bits & CHI_FLAG == CHI_FLAG {
        Some(CallType::Sequence)
    } else if bits & PON_MASK == PON_FLAG {
        Some(CallType::Triplet)
    } else if bits & KAKAN_MASK == KAKAN_FLAG {
        Some(CallType::PromotedQuad)
    } else if bits & KAN_MASK == 0 {
        Some(CallType::ConcealedQuad)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_pattern_decodes() {
        assert_eq!(decode_meld(27031), Some(CallType::Sequence));
        assert_eq!(decode_meld(47723), Some(CallType::Triplet));
        assert_eq!(decode_meld(18547), Some(CallType::PromotedQuad));
        assert_eq!(decode_meld(18432), Some(CallType::ConcealedQuad));
    }

    #[test]
    fn kita_is_not_recognised() {
        // bit 5 alone: sanma north extraction
        assert_eq!(decode_meld(0b10_0000), None);
    }

    #[test]
    fn patterns_are_disjoint() {
        for bits in 0u32..=0xffff {
            let hits = [
                bits & CHI_FLAG == CHI_FLAG,
                bits & PON_MASK == PON_FLAG,
                bits & KAKAN_MASK == KAKAN_FLAG,
                bits & KAN_MASK == 0,
            ]
            .iter()
            .filter(|&&hit| hit)
            .count();
            assert!(hits <= 1, "bits {bits:#b} matched {hits} patterns");
            assert_eq!(hits == 1, decode_meld(bits).is_some());
        }
    }
}
