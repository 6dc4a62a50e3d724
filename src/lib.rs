//! # limnosim
//!
//! Stochastic simulation of shallow-lake phosphorus dynamics with
//! Monte Carlo exceedance-probability estimation.
//!
//! The crate exposes a single numerically interesting component: given a
//! loading policy and an ensemble of independently sampled stochastic
//! forcing trajectories, propagate the lake recurrence forward per sample
//! path and reduce the ensemble into the (objective, inequality, equality)
//! triple consumed by an external black-box optimizer.
//!
//! ## Example
//!
//! ```rust
//! use limnosim::prelude::*;
//!
//! let config = ExperimentConfig::builder()
//!     .seed(42)
//!     .horizon(100)
//!     .samples(1000)
//!     .build();
//!
//! let evaluator = PolicyEvaluator::from_config(&config, &Bisection::default()).unwrap();
//! let policy = vec![0.02; 100];
//! let result = evaluator.evaluate(&policy).unwrap();
//! assert!((result.objective - 0.02).abs() < 1e-12);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Numerical code choices are intentional
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,  // Many functions can't be const in stable Rust
    clippy::needless_range_loop,   // Sometimes range loops are clearer
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod lake;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{ExperimentConfig, ExperimentConfigBuilder};
    pub use crate::engine::rng::SimRng;
    pub use crate::error::{LakeError, LakeResult};
    pub use crate::lake::ensemble::{EnsembleRunner, StateMatrix};
    pub use crate::lake::evaluator::{Evaluation, ExceedanceEstimate, PolicyEvaluator};
    pub use crate::lake::forcing::ForcingEnsemble;
    pub use crate::lake::params::LakeParams;
    pub use crate::lake::threshold::{critical_threshold, Bisection, RootFinder};
}

/// Re-export for public API
pub use error::{LakeError, LakeResult};
