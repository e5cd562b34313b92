use std::fmt;

/// Everything that can go wrong while reshaping one game.
///
/// All variants except `InvariantViolation` are recovered locally: the
/// offending event is skipped and the error is collected as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReshapeError {
    /// Meld bit-field matched none of the known call patterns.
    MalformedMeld { log_id: String, bits: u32 },
    /// A riichi declaration whose step was not "1" where a first step was expected.
    MalformedRiichi { log_id: String, step: String },
    /// Tag did not classify as any known event.
    UnknownEventTag { log_id: String, tag: String },
    /// Known event with a missing or unparsable attribute.
    MalformedEvent {
        log_id: String,
        tag: String,
        message: String,
    },
    /// The stream broke the hand lifecycle; reshaping of this game stops.
    InvariantViolation { log_id: String, message: String },
}

impl ReshapeError {
    pub fn log_id(&self) -> &str {
        match self {
            ReshapeError::MalformedMeld { log_id, .. }
            | ReshapeError::MalformedRiichi { log_id, .. }
            | ReshapeError::UnknownEventTag { log_id, .. }
            | ReshapeError::MalformedEvent { log_id, .. }
            | ReshapeError::InvariantViolation { log_id, .. } => log_id,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ReshapeError::InvariantViolation { .. })
    }
}

impl fmt::Display for ReshapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReshapeError::MalformedMeld { log_id, bits } => {
                write!(f, "unknown meld type {} in {}", bits, log_id)
            }
            ReshapeError::MalformedRiichi { log_id, step } => {
                write!(
                    f,
                    "first riichi step was not step one (step='{}') in {}",
                    step, log_id
                )
            }
            ReshapeError::UnknownEventTag { log_id, tag } => {
                write!(f, "unknown tag: {} in {}", tag, log_id)
            }
            ReshapeError::MalformedEvent {
                log_id,
                tag,
                message,
            } => {
                write!(f, "malformed <{}> in {}: {}", tag, log_id, message)
            }
            ReshapeError::InvariantViolation { log_id, message } => {
                write!(f, "invariant violated in {}: {}", log_id, message)
            }
        }
    }
}

impl std::error::Error for ReshapeError {}

pub type ReshapeResult<T> = Result<T, ReshapeError>;

#[cfg(feature = "python")]
impl From<ReshapeError> for pyo3::PyErr {
    fn from(err: ReshapeError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_game_and_value() {
        let err = ReshapeError::MalformedMeld {
            log_id: "2019010100gm-00a9-0000-abcd".to_string(),
            bits: 42,
        };
        assert_eq!(
            err.to_string(),
            "unknown meld type 42 in 2019010100gm-00a9-0000-abcd"
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn only_invariant_violation_is_fatal() {
        let err = ReshapeError::InvariantViolation {
            log_id: "g".to_string(),
            message: "win with no open hand".to_string(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.log_id(), "g");
    }
}
