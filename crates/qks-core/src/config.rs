//! Featurizer configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with `QKS_` prefix)
//!
//! Environment variables take precedence over the file, which takes
//! precedence over the defaults.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QksError, QksResult};

/// Settings for one featurization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturizerConfig {
    /// Number of episodes E.
    #[serde(default = "default_num_episodes")]
    pub num_episodes: usize,

    /// Seed for the episode parameters (entropy when unset).
    #[serde(default)]
    pub seed: Option<u64>,

    /// Shots per execution.
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Maximum number of in-flight execution calls.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-call execution timeout in milliseconds.
    #[serde(default)]
    pub execution_timeout_ms: Option<u64>,
}

fn default_num_episodes() -> usize {
    500
}

fn default_shots() -> u32 {
    1
}

fn default_max_concurrency() -> usize {
    1
}

impl Default for FeaturizerConfig {
    fn default() -> Self {
        Self {
            num_episodes: default_num_episodes(),
            seed: None,
            shots: default_shots(),
            max_concurrency: default_max_concurrency(),
            execution_timeout_ms: None,
        }
    }
}

impl FeaturizerConfig {
    /// Default configuration with `num_episodes` episodes.
    pub fn with_episodes(num_episodes: usize) -> Self {
        Self {
            num_episodes,
            ..Default::default()
        }
    }

    /// Set the seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the shots per execution.
    pub fn shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    /// Set the concurrency limit.
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Set the per-call timeout, rounded up to whole milliseconds.
    pub fn execution_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.execution_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    /// Per-call timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.execution_timeout_ms.map(Duration::from_millis)
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> QksResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file, then apply environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> QksResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml_ng::from_str(&yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> QksResult<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `QKS_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> QksResult<()> {
        if let Some(v) = env_var("QKS_EPISODES")? {
            self.num_episodes = v;
        }
        if let Some(v) = env_var("QKS_SEED")? {
            self.seed = Some(v);
        }
        if let Some(v) = env_var("QKS_SHOTS")? {
            self.shots = v;
        }
        if let Some(v) = env_var("QKS_MAX_CONCURRENCY")? {
            self.max_concurrency = v;
        }
        if let Some(v) = env_var("QKS_EXECUTION_TIMEOUT_MS")? {
            self.execution_timeout_ms = Some(v);
        }
        Ok(())
    }

    /// Reject zero counts and zero timeouts.
    pub fn validate(&self) -> QksResult<()> {
        if self.num_episodes == 0 {
            return Err(QksError::invalid("num_episodes must be positive"));
        }
        if self.shots == 0 {
            return Err(QksError::invalid("shots must be positive"));
        }
        if self.max_concurrency == 0 {
            return Err(QksError::invalid("max_concurrency must be positive"));
        }
        if self.execution_timeout_ms == Some(0) {
            return Err(QksError::invalid("execution_timeout_ms must be positive"));
        }
        Ok(())
    }
}

fn env_var<T: FromStr>(name: &str) -> QksResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| QksError::invalid(format!("{name}={raw} is not a valid value"))),
        Err(_) => Ok(None),
    }
}

/// Bounded retry of transient execution failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Factor applied to the delay after each retry.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay before the first retry.
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Reject policies that can never attempt a call.
    pub fn validate(&self) -> QksResult<()> {
        if self.max_attempts == 0 {
            return Err(QksError::invalid("max_attempts must be at least 1"));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(QksError::invalid("backoff_multiplier must be >= 1.0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FeaturizerConfig::default();
        assert_eq!(config.num_episodes, 500);
        assert_eq!(config.shots, 1);
        assert_eq!(config.max_concurrency, 1);
        assert!(config.seed.is_none());
        assert!(config.timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = FeaturizerConfig::from_yaml_str(
            "num_episodes: 40\nseed: 9\nexecution_timeout_ms: 250\n",
        )
        .unwrap();
        assert_eq!(config.num_episodes, 40);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.shots, 1);
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_yaml_validation() {
        assert!(matches!(
            FeaturizerConfig::from_yaml_str("num_episodes: 0\n"),
            Err(QksError::InvalidArgument(_))
        ));
        assert!(matches!(
            FeaturizerConfig::from_yaml_str("num_episodes: [1, 2]\n"),
            Err(QksError::Config(_))
        ));
    }

    #[test]
    fn test_builder() {
        let config = FeaturizerConfig::with_episodes(8)
            .seed(3)
            .shots(4)
            .max_concurrency(2)
            .execution_timeout(Duration::from_secs(2));
        assert_eq!(config.num_episodes, 8);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.shots, 4);
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.execution_timeout_ms, Some(2000));
    }

    #[test]
    fn test_sub_millisecond_timeout_rounds_up() {
        let config = FeaturizerConfig::default().execution_timeout(Duration::from_micros(500));
        assert_eq!(config.timeout(), Some(Duration::from_millis(1)));
        assert!(config.validate().is_ok());

        let config = FeaturizerConfig::default().execution_timeout(Duration::from_micros(1500));
        assert_eq!(config.execution_timeout_ms, Some(2));

        let config = FeaturizerConfig::default().execution_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(FeaturizerConfig::default().shots(0).validate().is_err());
        assert!(
            FeaturizerConfig::default()
                .max_concurrency(0)
                .validate()
                .is_err()
        );
        let mut config = FeaturizerConfig::default();
        config.execution_timeout_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff(), Duration::from_millis(100));
        assert!(policy.validate().is_ok());
        assert_eq!(RetryPolicy::none().max_attempts, 1);

        let bad = RetryPolicy {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
