//! Recurrence propagator for a single sample path.
//!
//! Pure forward substitution, O(T) per path, no shared mutable state
//! between paths.

use crate::error::{LakeError, LakeResult};
use crate::lake::params::LakeParams;

/// Advance one sample path's state over the full horizon.
///
/// Computes `x[t+1] = x[t] + a[t] + y[t] + x[t]^q / (1 + x[t]^q) - b * x[t]`
/// for t = 0..T with `x[0] = initial_state`, and returns the whole
/// trajectory of length T+1 — callers need intermediate states for
/// threshold checks, not just the terminal value.
///
/// The recycling term `x^q / (1 + x^q)` is only defined for x >= 0 when q
/// is non-integer. Nonnegative policy and forcing plus a positive outflow
/// rate keep the state nonnegative by construction; the propagator
/// validates its inputs but does not clamp intermediate states.
///
/// # Errors
///
/// - `DegenerateEnsemble` if the horizon is zero.
/// - `ShapeMismatch` if policy and forcing lengths differ.
/// - `InvalidParameter` for invalid model parameters or negative /
///   non-finite policy or forcing entries.
pub fn propagate(params: &LakeParams, policy: &[f64], forcing: &[f64]) -> LakeResult<Vec<f64>> {
    params.validate()?;

    let horizon = policy.len();
    if horizon == 0 {
        return Err(LakeError::DegenerateEnsemble {
            horizon: 0,
            samples: 1,
        });
    }
    if forcing.len() != horizon {
        return Err(LakeError::shape("forcing", horizon, forcing.len()));
    }

    check_nonnegative("policy", policy)?;
    check_nonnegative("forcing", forcing)?;

    let mut trajectory = Vec::with_capacity(horizon + 1);
    let mut x = params.initial_state;
    trajectory.push(x);

    for t in 0..horizon {
        let xq = x.powf(params.q);
        x = x + policy[t] + forcing[t] + xq / (1.0 + xq) - params.b * x;
        trajectory.push(x);
    }

    Ok(trajectory)
}

/// Reject negative or non-finite entries before they enter the recurrence.
fn check_nonnegative(what: &str, values: &[f64]) -> LakeResult<()> {
    for &v in values {
        if !(v.is_finite() && v >= 0.0) {
            return Err(LakeError::invalid_parameter(
                format!("{what} entry"),
                v,
                ">= 0 and finite",
            ));
        }
    }
    Ok(())
}
