//! Error types for limnosim.
//!
//! Every fallible operation returns `Result<T, LakeError>` instead of
//! panicking. All failures here are programming or configuration errors,
//! never transient conditions, so nothing in the crate retries.

use thiserror::Error;

/// Result type alias for limnosim operations.
pub type LakeResult<T> = Result<T, LakeError>;

/// Unified error type for all limnosim operations.
///
/// # Design
///
/// Errors are:
/// 1. Immediately detectable (type-safe)
/// 2. Self-documenting (descriptive variants)
/// 3. Fatal for the current call — no partial results are returned
#[derive(Debug, Error)]
pub enum LakeError {
    // ===== Input Contract Violations =====
    /// Sequence length does not match the experiment horizon.
    #[error("Shape mismatch: {what} has length {found}, expected {expected}")]
    ShapeMismatch {
        /// Which input was mis-sized (e.g. "policy", "forcing column").
        what: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        found: usize,
    },

    /// Parameter violates its precondition.
    #[error("Invalid parameter: {name} = {value} (must be {constraint})")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Offending value.
        value: f64,
        /// Human-readable constraint, e.g. "> 0".
        constraint: String,
    },

    /// Horizon or sample count of zero: statistics would be vacuous (0/0).
    #[error("Degenerate ensemble: horizon = {horizon}, samples = {samples} (both must be >= 1)")]
    DegenerateEnsemble {
        /// Time horizon T.
        horizon: usize,
        /// Sample path count N.
        samples: usize,
    },

    /// A trajectory produced a NaN or infinite state value.
    #[error("Non-finite state at step {step}, sample path {sample}")]
    NonFiniteState {
        /// Time step index.
        step: usize,
        /// Sample path index.
        sample: usize,
    },

    // ===== Threshold Solver Errors =====
    /// Root bracket carries no sign change; the experiment cannot proceed.
    #[error(
        "Root bracket [{lower}, {upper}] has no sign change: f(lower) = {f_lower:.6e}, f(upper) = {f_upper:.6e}"
    )]
    BracketSignError {
        /// Lower bracket bound.
        lower: f64,
        /// Upper bracket bound.
        upper: f64,
        /// Residual at the lower bound.
        f_lower: f64,
        /// Residual at the upper bound.
        f_upper: f64,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration value.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Schema validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LakeError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid-parameter error.
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, value: f64, constraint: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value,
            constraint: constraint.into(),
        }
    }

    /// Create a shape-mismatch error.
    #[must_use]
    pub fn shape(what: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected,
            found,
        }
    }

    /// Check if this error is a violation of the evaluator's input contract
    /// (as opposed to an experiment-setup or configuration problem).
    #[must_use]
    pub const fn is_input_violation(&self) -> bool {
        matches!(
            self,
            Self::ShapeMismatch { .. }
                | Self::InvalidParameter { .. }
                | Self::DegenerateEnsemble { .. }
        )
    }
}
