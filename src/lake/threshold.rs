//! Critical threshold: the positive root of the lake's stability residual.
//!
//! The residual `f(x) = x^q/(1+x^q) - b*x` changes sign where recycling
//! overtakes outflow; its positive root is the tipping concentration.
//! The root value is independent of policy and forcing, so it is solved
//! once per experiment configuration and handed to the evaluator as a
//! constant.

use crate::error::{LakeError, LakeResult};
use crate::lake::params::LakeParams;

/// Stability residual `f(x) = x^q / (1 + x^q) - b * x` for x >= 0.
#[must_use]
pub fn stability_residual(x: f64, q: f64, b: f64) -> f64 {
    let xq = x.powf(q);
    xq / (1.0 + xq) - b * x
}

/// Seam for the external root-finding collaborator.
///
/// Given continuous `f` with a sign change over `[lower, upper]`, return
/// x* with `f(x*) ~ 0` within solver tolerance, strictly inside the
/// bracket.
pub trait RootFinder {
    /// Solve `f(x) = 0` within the bracket.
    ///
    /// # Errors
    ///
    /// Returns `BracketSignError` if the bracket carries no sign change,
    /// `Config` for an empty or non-finite bracket.
    fn solve<F: Fn(f64) -> f64>(&self, f: F, lower: f64, upper: f64) -> LakeResult<f64>;
}

/// Bisection root finder.
///
/// Robust default: halves the bracket until the residual is within
/// tolerance or the interval collapses to machine precision.
#[derive(Debug, Clone, Copy)]
pub struct Bisection {
    /// Tolerance on |f(x*)|.
    pub tolerance: f64,
    /// Iteration cap; bisection gains one bit per iteration, so this is
    /// generous for f64.
    pub max_iterations: usize,
}

impl Default for Bisection {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 200,
        }
    }
}

impl RootFinder for Bisection {
    fn solve<F: Fn(f64) -> f64>(&self, f: F, lower: f64, upper: f64) -> LakeResult<f64> {
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(LakeError::config(format!(
                "Invalid root bracket: [{lower}, {upper}]"
            )));
        }

        let f_lower = f(lower);
        let f_upper = f(upper);
        if f_lower == 0.0 {
            return Ok(lower);
        }
        if f_upper == 0.0 {
            return Ok(upper);
        }
        if f_lower.signum() == f_upper.signum() {
            return Err(LakeError::BracketSignError {
                lower,
                upper,
                f_lower,
                f_upper,
            });
        }

        let (mut lo, mut hi) = (lower, upper);
        let mut f_lo = f_lower;
        let mut mid = 0.5 * (lo + hi);

        for _ in 0..self.max_iterations {
            mid = 0.5 * (lo + hi);
            let f_mid = f(mid);

            if f_mid.abs() <= self.tolerance || (hi - lo) <= f64::EPSILON * mid.abs() {
                return Ok(mid);
            }

            if f_mid.signum() == f_lo.signum() {
                lo = mid;
                f_lo = f_mid;
            } else {
                hi = mid;
            }
        }

        // Interval exhausted without hitting tolerance; midpoint is still
        // the best bracketed estimate.
        Ok(mid)
    }
}

/// Solve the critical threshold for the given lake parameters.
///
/// # Errors
///
/// Returns `InvalidParameter` for invalid lake parameters and whatever
/// the solver reports for a bad bracket.
pub fn critical_threshold<R: RootFinder>(
    params: &LakeParams,
    bracket: (f64, f64),
    solver: &R,
) -> LakeResult<f64> {
    params.validate()?;
    solver.solve(
        |x| stability_residual(x, params.q, params.b),
        bracket.0,
        bracket.1,
    )
}
