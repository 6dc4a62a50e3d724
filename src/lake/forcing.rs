//! Forcing ensemble: independently sampled log-normal inflow trajectories.
//!
//! Generated once per experiment from an explicit seed and reused
//! read-only across evaluator calls. There is no hidden global RNG: the
//! seed goes in, a fresh generator comes out, and the same seed yields a
//! bit-identical ensemble.

use serde::{Deserialize, Serialize};

use crate::engine::rng::SimRng;
use crate::error::{LakeError, LakeResult};

/// T x N matrix of nonnegative stochastic forcing draws.
///
/// One draw per (time step, sample path) pair, independent across both
/// axes. Each sample path draws from its own partitioned RNG stream, so
/// a path's sequence depends only on the seed and its index. Stored
/// sample-major: all T draws for path 0, then path 1, and so on, keeping
/// `column(n)` contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcingEnsemble {
    horizon: usize,
    samples: usize,
    values: Vec<f64>,
}

impl ForcingEnsemble {
    /// Draw a fresh T x N ensemble from LogNormal(`log_mean`, `log_std`).
    ///
    /// # Errors
    ///
    /// - `DegenerateEnsemble` if `horizon` or `samples` is zero.
    /// - `InvalidParameter` for non-finite `log_mean` or negative /
    ///   non-finite `log_std`.
    pub fn generate(
        horizon: usize,
        samples: usize,
        log_mean: f64,
        log_std: f64,
        seed: u64,
    ) -> LakeResult<Self> {
        if horizon == 0 || samples == 0 {
            return Err(LakeError::DegenerateEnsemble { horizon, samples });
        }
        if !log_mean.is_finite() {
            return Err(LakeError::invalid_parameter("log_mean", log_mean, "finite"));
        }
        if !(log_std.is_finite() && log_std >= 0.0) {
            return Err(LakeError::invalid_parameter(
                "log_std",
                log_std,
                ">= 0 and finite",
            ));
        }

        let mut master = SimRng::new(seed);
        let mut values = Vec::with_capacity(horizon * samples);
        for mut stream in master.partition(samples) {
            for _ in 0..horizon {
                values.push(stream.gen_lognormal(log_mean, log_std));
            }
        }

        Ok(Self {
            horizon,
            samples,
            values,
        })
    }

    /// Build an ensemble from explicit per-path columns (mainly for tests).
    ///
    /// # Errors
    ///
    /// Fails on an empty column set, empty columns, or ragged column
    /// lengths, and on negative or non-finite entries.
    pub fn from_columns(columns: &[Vec<f64>]) -> LakeResult<Self> {
        let samples = columns.len();
        let horizon = columns.first().map_or(0, Vec::len);
        if horizon == 0 || samples == 0 {
            return Err(LakeError::DegenerateEnsemble { horizon, samples });
        }

        let mut values = Vec::with_capacity(horizon * samples);
        for column in columns {
            if column.len() != horizon {
                return Err(LakeError::shape("forcing column", horizon, column.len()));
            }
            for &v in column {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(LakeError::invalid_parameter(
                        "forcing entry",
                        v,
                        ">= 0 and finite",
                    ));
                }
            }
            values.extend_from_slice(column);
        }

        Ok(Self {
            horizon,
            samples,
            values,
        })
    }

    /// Time horizon T.
    #[must_use]
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    /// Sample path count N.
    #[must_use]
    pub const fn samples(&self) -> usize {
        self.samples
    }

    /// Forcing value at time step `t` for sample path `n`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= horizon` or `n >= samples` (index contract, as with
    /// slice indexing).
    #[must_use]
    pub fn get(&self, t: usize, n: usize) -> f64 {
        assert!(t < self.horizon && n < self.samples, "forcing index out of bounds");
        self.values[n * self.horizon + t]
    }

    /// The full forcing sequence for sample path `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n >= samples`.
    #[must_use]
    pub fn column(&self, n: usize) -> &[f64] {
        assert!(n < self.samples, "sample path index out of bounds");
        &self.values[n * self.horizon..(n + 1) * self.horizon]
    }
}
