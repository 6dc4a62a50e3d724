//! Experiment configuration with YAML schema and validation.
//!
//! Mistake-proofing through:
//! - Type-safe configuration structs
//! - Compile-time validation via serde
//! - Runtime semantic validation
//!
//! Forcing ensemble and critical threshold are derived from one
//! `ExperimentConfig` at setup and treated as read-only for every
//! subsequent evaluator call.

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{LakeError, LakeResult};
use crate::lake::params::LakeParams;
use crate::lake::threshold::Bisection;

/// Top-level experiment configuration.
///
/// Loaded from YAML files with full schema validation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Experiment metadata.
    #[serde(default)]
    pub experiment: ExperimentMeta,

    /// Reproducibility settings.
    #[serde(default)]
    pub reproducibility: ReproducibilityConfig,

    /// Lake model parameters and horizon.
    #[validate(nested)]
    #[serde(default)]
    pub lake: LakeModelConfig,

    /// Stochastic forcing distribution.
    #[validate(nested)]
    #[serde(default)]
    pub forcing: ForcingConfig,

    /// Reliability constraint settings.
    #[validate(nested)]
    #[serde(default)]
    pub reliability: ReliabilityConfig,

    /// Critical threshold solver settings.
    #[serde(default)]
    pub threshold: ThresholdConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl ExperimentConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> LakeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> LakeResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;

        // Schema constraints
        config.validate()?;

        // Additional semantic validation
        config.validate_semantic()?;

        Ok(config)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> ExperimentConfigBuilder {
        ExperimentConfigBuilder::default()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> LakeResult<()> {
        self.lake_params().validate()?;

        if self.lake.horizon == 0 || self.forcing.samples == 0 {
            return Err(LakeError::DegenerateEnsemble {
                horizon: self.lake.horizon,
                samples: self.forcing.samples,
            });
        }

        if !self.forcing.log_mean.is_finite() {
            return Err(LakeError::config("forcing.log_mean must be finite"));
        }
        if !(self.forcing.log_std.is_finite() && self.forcing.log_std >= 0.0) {
            return Err(LakeError::invalid_parameter(
                "forcing.log_std",
                self.forcing.log_std,
                ">= 0 and finite",
            ));
        }

        if !(0.0..=1.0).contains(&self.reliability.max_exceedance) {
            return Err(LakeError::invalid_parameter(
                "reliability.max_exceedance",
                self.reliability.max_exceedance,
                "in [0, 1]",
            ));
        }

        if self.threshold.bracket_lower >= self.threshold.bracket_upper {
            return Err(LakeError::config(format!(
                "Threshold bracket is empty: [{}, {}]",
                self.threshold.bracket_lower, self.threshold.bracket_upper
            )));
        }
        if self.threshold.tolerance <= 0.0 {
            return Err(LakeError::invalid_parameter(
                "threshold.tolerance",
                self.threshold.tolerance,
                "> 0",
            ));
        }

        Ok(())
    }

    /// Lake model parameters as used by the propagator.
    #[must_use]
    pub fn lake_params(&self) -> LakeParams {
        LakeParams {
            q: self.lake.q,
            b: self.lake.b,
            initial_state: self.lake.initial_state,
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            experiment: ExperimentMeta::default(),
            reproducibility: ReproducibilityConfig::default(),
            lake: LakeModelConfig::default(),
            forcing: ForcingConfig::default(),
            reliability: ReliabilityConfig::default(),
            threshold: ThresholdConfig::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct ExperimentConfigBuilder {
    seed: Option<u64>,
    horizon: Option<usize>,
    samples: Option<usize>,
    lake: Option<LakeParams>,
    max_exceedance: Option<f64>,
}

impl ExperimentConfigBuilder {
    /// Set the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the time horizon T.
    #[must_use]
    pub const fn horizon(mut self, horizon: usize) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// Set the Monte Carlo sample count N.
    #[must_use]
    pub const fn samples(mut self, samples: usize) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Set the lake model parameters.
    #[must_use]
    pub const fn lake(mut self, params: LakeParams) -> Self {
        self.lake = Some(params);
        self
    }

    /// Set the allowed exceedance probability.
    #[must_use]
    pub const fn max_exceedance(mut self, p: f64) -> Self {
        self.max_exceedance = Some(p);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ExperimentConfig {
        let mut config = ExperimentConfig::default();

        if let Some(seed) = self.seed {
            config.reproducibility.seed = seed;
        }
        if let Some(horizon) = self.horizon {
            config.lake.horizon = horizon;
        }
        if let Some(samples) = self.samples {
            config.forcing.samples = samples;
        }
        if let Some(params) = self.lake {
            config.lake.q = params.q;
            config.lake.b = params.b;
            config.lake.initial_state = params.initial_state;
        }
        if let Some(p) = self.max_exceedance {
            config.reliability.max_exceedance = p;
        }

        config
    }
}

/// Experiment metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentMeta {
    /// Experiment name.
    #[serde(default)]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
}

/// Reproducibility settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproducibilityConfig {
    /// Master seed for all RNG. Same seed, same forcing ensemble, bit for bit.
    pub seed: u64,
}

impl Default for ReproducibilityConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

/// Lake model configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LakeModelConfig {
    /// Phosphorus recycling exponent q (> 0).
    pub q: f64,
    /// Outflow rate b (> 0).
    pub b: f64,
    /// Initial concentration x0 (>= 0).
    #[serde(default)]
    pub initial_state: f64,
    /// Time horizon T (number of steps).
    #[validate(range(min = 1))]
    #[serde(default = "default_horizon")]
    pub horizon: usize,
}

const fn default_horizon() -> usize {
    100
}

impl Default for LakeModelConfig {
    fn default() -> Self {
        Self {
            q: 2.5,
            b: 0.4,
            initial_state: 0.0,
            horizon: default_horizon(),
        }
    }
}

/// Stochastic forcing configuration (log-normal non-point-source inflow).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForcingConfig {
    /// Mean of the underlying normal (log scale).
    pub log_mean: f64,
    /// Standard deviation of the underlying normal (log scale).
    pub log_std: f64,
    /// Number of independent sample paths N.
    #[validate(range(min = 1))]
    #[serde(default = "default_samples")]
    pub samples: usize,
}

const fn default_samples() -> usize {
    1000
}

impl Default for ForcingConfig {
    fn default() -> Self {
        Self {
            // ln(0.03): reference inflow scale
            log_mean: -3.506_557_897_319_982,
            log_std: 0.1,
            samples: default_samples(),
        }
    }
}

/// Reliability constraint configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReliabilityConfig {
    /// Allowed terminal exceedance probability.
    ///
    /// The evaluator reports `P_exceed - max_exceedance`; the optimizer treats
    /// values <= 0 as feasible. Default follows the reference constant (0.8).
    pub max_exceedance: f64,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self { max_exceedance: 0.8 }
    }
}

/// Critical threshold solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Lower bound of the root search bracket.
    pub bracket_lower: f64,
    /// Upper bound of the root search bracket.
    pub bracket_upper: f64,
    /// Solver tolerance on |f(x*)|.
    pub tolerance: f64,
}

impl ThresholdConfig {
    /// Bisection solver honoring this configuration's tolerance.
    #[must_use]
    pub fn bisection(&self) -> Bisection {
        Bisection {
            tolerance: self.tolerance,
            ..Bisection::default()
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            bracket_lower: 0.1,
            bracket_upper: 1.5,
            tolerance: 1e-10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ExperimentConfig::default();

        assert_eq!(config.schema_version, "1.0");
        assert_eq!(config.reproducibility.seed, 42);
        assert!((config.lake.q - 2.5).abs() < f64::EPSILON);
        assert!((config.lake.b - 0.4).abs() < f64::EPSILON);
        assert_eq!(config.lake.horizon, 100);
        assert_eq!(config.forcing.samples, 1000);
        assert!((config.forcing.log_mean - 0.03_f64.ln()).abs() < 1e-12);
        assert!((config.reliability.max_exceedance - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_builder() {
        let config = ExperimentConfig::builder()
            .seed(12345)
            .horizon(50)
            .samples(200)
            .max_exceedance(0.2)
            .build();

        assert_eq!(config.reproducibility.seed, 12345);
        assert_eq!(config.lake.horizon, 50);
        assert_eq!(config.forcing.samples, 200);
        assert!((config.reliability.max_exceedance - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_builder_lake_params() {
        let params = LakeParams {
            q: 3.0,
            b: 0.5,
            initial_state: 0.1,
        };
        let config = ExperimentConfig::builder().lake(params).build();

        let roundtrip = config.lake_params();
        assert!((roundtrip.q - 3.0).abs() < f64::EPSILON);
        assert!((roundtrip.b - 0.5).abs() < f64::EPSILON);
        assert!((roundtrip.initial_state - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_yaml_parse() {
        let yaml = r"
reproducibility:
  seed: 42
lake:
  q: 2.5
  b: 0.4
  horizon: 100
forcing:
  log_mean: -3.5
  log_std: 0.1
  samples: 1000
";
        let config = ExperimentConfig::from_yaml(yaml);
        assert!(config.is_ok());

        let config = config.ok();
        assert_eq!(config.as_ref().map(|c| c.reproducibility.seed), Some(42));
        assert_eq!(config.as_ref().map(|c| c.forcing.samples), Some(1000));
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let yaml = r"
reproducibility:
  seed: 42
plotting:
  enabled: true
";
        let config = ExperimentConfig::from_yaml(yaml);
        assert!(config.is_err());
    }

    #[test]
    fn test_config_validation_fails_nonpositive_q() {
        let yaml = r"
lake:
  q: -2.5
  b: 0.4
";
        let config = ExperimentConfig::from_yaml(yaml);
        assert!(config.is_err());
    }

    #[test]
    fn test_config_validation_fails_zero_samples() {
        let yaml = r"
lake:
  q: 2.5
  b: 0.4
forcing:
  log_mean: -3.5
  log_std: 0.1
  samples: 0
";
        let config = ExperimentConfig::from_yaml(yaml);
        assert!(config.is_err());
    }

    #[test]
    fn test_config_validation_fails_bad_reliability() {
        let config = ExperimentConfig::builder().max_exceedance(1.5).build();
        assert!(config.validate_semantic().is_err());
    }

    #[test]
    fn test_config_validation_fails_empty_bracket() {
        let mut config = ExperimentConfig::default();
        config.threshold.bracket_lower = 1.5;
        config.threshold.bracket_upper = 0.1;
        assert!(config.validate_semantic().is_err());
    }

    #[test]
    fn test_config_validation_fails_negative_log_std() {
        let mut config = ExperimentConfig::default();
        config.forcing.log_std = -0.1;
        assert!(config.validate_semantic().is_err());
    }

    #[test]
    fn test_config_semantic_ok_for_defaults() {
        let config = ExperimentConfig::default();
        assert!(config.validate_semantic().is_ok());
    }

    #[test]
    fn test_threshold_config_drives_solver_tolerance() {
        let mut config = ExperimentConfig::default();
        config.threshold.tolerance = 1e-6;
        let solver = config.threshold.bisection();
        assert!((solver.tolerance - 1e-6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_experiment_meta_default() {
        let meta = ExperimentMeta::default();
        assert!(meta.name.is_empty());
    }
}
