//! Lake model parameters.

use serde::{Deserialize, Serialize};

use crate::error::{LakeError, LakeResult};

/// Physical parameters of the lake recurrence.
///
/// `q` is the recycling exponent, `b` the outflow rate. Both must be
/// strictly positive: `x^q` is undefined for negative bases with
/// non-integer q, and a non-positive outflow makes the recurrence
/// divergent for any loading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LakeParams {
    /// Recycling exponent q (> 0).
    pub q: f64,
    /// Outflow rate b (> 0).
    pub b: f64,
    /// Initial concentration x0 (>= 0), shared by every sample path.
    #[serde(default)]
    pub initial_state: f64,
}

impl Default for LakeParams {
    fn default() -> Self {
        Self {
            q: 2.5,
            b: 0.4,
            initial_state: 0.0,
        }
    }
}

impl LakeParams {
    /// Validate parameter preconditions.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if q <= 0, b <= 0, or the initial state
    /// is negative or non-finite.
    pub fn validate(&self) -> LakeResult<()> {
        if !(self.q.is_finite() && self.q > 0.0) {
            return Err(LakeError::invalid_parameter("q", self.q, "> 0 and finite"));
        }
        if !(self.b.is_finite() && self.b > 0.0) {
            return Err(LakeError::invalid_parameter("b", self.b, "> 0 and finite"));
        }
        if !(self.initial_state.is_finite() && self.initial_state >= 0.0) {
            return Err(LakeError::invalid_parameter(
                "initial_state",
                self.initial_state,
                ">= 0 and finite",
            ));
        }
        Ok(())
    }
}
