//! Constraint and objective evaluator.
//!
//! Reduces an ensemble of state trajectories into the triple consumed by
//! an external black-box optimizer: objective (mean policy loading),
//! inequality violation (terminal exceedance probability minus the
//! allowed probability), and an equality placeholder.
//!
//! The evaluator is a pure function of (policy, forcing ensemble,
//! threshold, parameters): same inputs, same result, no side effects.

use serde::{Deserialize, Serialize};

use crate::config::ExperimentConfig;
use crate::error::{LakeError, LakeResult};
use crate::lake::ensemble::{EnsembleRunner, StateMatrix};
use crate::lake::forcing::ForcingEnsemble;
use crate::lake::params::LakeParams;
use crate::lake::threshold::{critical_threshold, RootFinder};

/// Result of one evaluator call, in the shape optimizer APIs expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Mean of the policy values; the quantity to maximize. The optimizer
    /// owns the sign convention (negate if it minimizes).
    pub objective: f64,
    /// Inequality constraint violations; <= 0 means feasible.
    /// Single element here: `P_exceed - max_exceedance`.
    pub inequality: Vec<f64>,
    /// Equality constraint violations. This problem has none; one 0.0
    /// placeholder for optimizer APIs that require the slot.
    pub equality: Vec<f64>,
}

/// Empirical terminal-exceedance estimate with sampling uncertainty.
///
/// Binomial standard error and 95% confidence interval over the terminal
/// row of the ensemble state matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceedanceEstimate {
    /// Point estimate: exceeding paths / N.
    pub probability: f64,
    /// Binomial standard error sqrt(p(1-p)/N).
    pub std_error: f64,
    /// Number of sample paths.
    pub samples: usize,
    /// 95% confidence interval (probability ± 1.96 * `std_error`),
    /// clamped to [0, 1].
    pub confidence_interval: (f64, f64),
}

impl ExceedanceEstimate {
    /// Estimate the exceedance probability over a terminal row.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateEnsemble` for an empty row: 0/0 is not a
    /// probability.
    pub fn from_terminal_row(terminal: &[f64], threshold: f64) -> LakeResult<Self> {
        let n = terminal.len();
        if n == 0 {
            return Err(LakeError::DegenerateEnsemble {
                horizon: 0,
                samples: 0,
            });
        }

        let exceeding = terminal.iter().filter(|&&x| x > threshold).count();
        let probability = exceeding as f64 / n as f64;
        let std_error = (probability * (1.0 - probability) / n as f64).sqrt();
        let ci_half = 1.96 * std_error;

        Ok(Self {
            probability,
            std_error,
            samples: n,
            confidence_interval: (
                (probability - ci_half).max(0.0),
                (probability + ci_half).min(1.0),
            ),
        })
    }
}

/// Evaluates candidate policies against a fixed experiment setup.
///
/// Forcing ensemble and critical threshold are supplied once at
/// construction and reused read-only across every call; only the policy
/// changes between calls.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    params: LakeParams,
    forcing: ForcingEnsemble,
    threshold: f64,
    max_exceedance: f64,
    workers: usize,
}

impl PolicyEvaluator {
    /// Create an evaluator from already-prepared experiment constants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for invalid lake parameters, a
    /// non-finite or non-positive threshold, or an allowed probability
    /// outside [0, 1].
    pub fn new(
        params: LakeParams,
        forcing: ForcingEnsemble,
        threshold: f64,
        max_exceedance: f64,
    ) -> LakeResult<Self> {
        params.validate()?;
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(LakeError::invalid_parameter(
                "threshold",
                threshold,
                "> 0 and finite",
            ));
        }
        if !(0.0..=1.0).contains(&max_exceedance) {
            return Err(LakeError::invalid_parameter(
                "max_exceedance",
                max_exceedance,
                "in [0, 1]",
            ));
        }

        Ok(Self {
            params,
            forcing,
            threshold,
            max_exceedance,
            workers: 1,
        })
    }

    /// Full experiment setup from configuration: draw the forcing
    /// ensemble from the configured seed and solve the critical
    /// threshold with the supplied root finder.
    ///
    /// # Errors
    ///
    /// Surfaces configuration, sampling, and root-finder errors; a
    /// bracket without sign change is fatal here, at setup.
    pub fn from_config<R: RootFinder>(config: &ExperimentConfig, solver: &R) -> LakeResult<Self> {
        let params = config.lake_params();
        let forcing = ForcingEnsemble::generate(
            config.lake.horizon,
            config.forcing.samples,
            config.forcing.log_mean,
            config.forcing.log_std,
            config.reproducibility.seed,
        )?;
        let threshold = critical_threshold(
            &params,
            (config.threshold.bracket_lower, config.threshold.bracket_upper),
            solver,
        )?;
        Self::new(params, forcing, threshold, config.reliability.max_exceedance)
    }

    /// Run sample paths over this many worker threads per call.
    ///
    /// Purely a throughput knob: results are bit-identical for any count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// The critical threshold this evaluator checks against.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The allowed terminal exceedance probability.
    #[must_use]
    pub const fn max_exceedance(&self) -> f64 {
        self.max_exceedance
    }

    /// The fixed forcing ensemble.
    #[must_use]
    pub const fn forcing(&self) -> &ForcingEnsemble {
        &self.forcing
    }

    /// Evaluate one candidate policy.
    ///
    /// Runs the recurrence over every sample path, then reduces the
    /// terminal row: objective = mean(policy), inequality =
    /// `[P_exceed - max_exceedance]`, equality = `[0.0]`. The state
    /// matrix is discarded after reduction.
    ///
    /// # Errors
    ///
    /// Fails fast on shape mismatch, negative or non-finite policy
    /// entries, or a degenerate ensemble; no partial result is returned.
    pub fn evaluate(&self, policy: &[f64]) -> LakeResult<Evaluation> {
        let matrix = self.run_ensemble(policy)?;
        let estimate = self.exceedance(&matrix)?;

        let objective = policy.iter().sum::<f64>() / policy.len() as f64;

        Ok(Evaluation {
            objective,
            inequality: vec![estimate.probability - self.max_exceedance],
            equality: vec![0.0],
        })
    }

    /// Evaluate and also report the exceedance estimate with its
    /// sampling uncertainty.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::evaluate`].
    pub fn evaluate_with_estimate(
        &self,
        policy: &[f64],
    ) -> LakeResult<(Evaluation, ExceedanceEstimate)> {
        let matrix = self.run_ensemble(policy)?;
        let estimate = self.exceedance(&matrix)?;

        let objective = policy.iter().sum::<f64>() / policy.len() as f64;
        let evaluation = Evaluation {
            objective,
            inequality: vec![estimate.probability - self.max_exceedance],
            equality: vec![0.0],
        };

        Ok((evaluation, estimate))
    }

    fn run_ensemble(&self, policy: &[f64]) -> LakeResult<StateMatrix> {
        let matrix = if self.workers > 1 {
            EnsembleRunner::run_parallel(&self.params, policy, &self.forcing, self.workers)?
        } else {
            EnsembleRunner::run(&self.params, policy, &self.forcing)?
        };
        matrix.check_finite()?;
        Ok(matrix)
    }

    fn exceedance(&self, matrix: &StateMatrix) -> LakeResult<ExceedanceEstimate> {
        ExceedanceEstimate::from_terminal_row(&matrix.terminal_row(), self.threshold)
    }
}
