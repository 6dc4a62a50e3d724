//! Shallow-lake phosphorus model.
//!
//! The lake state x follows a one-dimensional recurrence with controllable
//! loading a (the policy), stochastic log-normal forcing y, sigmoid
//! recycling `x^q / (1 + x^q)` and linear outflow `b * x`:
//!
//! ```text
//! x[t+1] = x[t] + a[t] + y[t] + x[t]^q / (1 + x[t]^q) - b * x[t]
//! ```
//!
//! Past the positive root of `x^q/(1+x^q) - b*x` the recycling term
//! dominates outflow and the lake flips into a eutrophic state, so the
//! reliability constraint is phrased as an exceedance probability over
//! that critical threshold at the terminal horizon.

pub mod ensemble;
pub mod evaluator;
pub mod forcing;
pub mod params;
pub mod recurrence;
pub mod threshold;

pub use ensemble::{EnsembleRunner, StateMatrix};
pub use evaluator::{Evaluation, ExceedanceEstimate, PolicyEvaluator};
pub use forcing::ForcingEnsemble;
pub use params::LakeParams;
pub use threshold::{critical_threshold, stability_residual, Bisection, RootFinder};
