#[cfg(feature = "python")]
use pyo3::{pyclass, pymethods};
use serde::{Deserialize, Serialize};

/// Switches for the behaviors where a log can be read more than one way.
#[cfg_attr(
    feature = "python",
    pyclass(module = "tenhou_reshaper", get_all, set_all)
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReshapeRule {
    /// Report a `UN` seen after the first hand (a reconnect) instead of
    /// silently ignoring it.
    pub late_seat_identity_is_error: bool,
    /// Fold a second `AGARI` on the same discard into the hand it ends.
    /// When off, a double ron is an invariant violation.
    pub merge_double_ron: bool,
    /// Decode the `owari` final standing from the game's last hand end.
    pub record_final_standing: bool,
}

impl Default for ReshapeRule {
    fn default() -> Self {
        Self::lenient()
    }
}

impl ReshapeRule {
    pub fn lenient() -> Self {
        Self {
            late_seat_identity_is_error: false,
            merge_double_ron: true,
            record_final_standing: true,
        }
    }

    pub fn strict() -> Self {
        Self {
            late_seat_identity_is_error: true,
            merge_double_ron: false,
            record_final_standing: true,
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl ReshapeRule {
    #[new]
    #[pyo3(signature = (late_seat_identity_is_error=false, merge_double_ron=true, record_final_standing=true))]
    fn py_new(
        late_seat_identity_is_error: bool,
        merge_double_ron: bool,
        record_final_standing: bool,
    ) -> Self {
        Self {
            late_seat_identity_is_error,
            merge_double_ron,
            record_final_standing,
        }
    }
}
