use std::fmt;
use std::str::FromStr;

use parmix_stats::DistConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME: &str = "ParamMixture";

/// How `ParamMixture::sample` produces draws
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SampleStrategy {
    /// Draw every component at every position, then keep the one the
    /// categorical picked
    #[default]
    Dense,
    /// Draw only the picked component at each position
    Selected,
}

impl fmt::Display for SampleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SampleStrategy::Dense => write!(f, "dense"),
            SampleStrategy::Selected => write!(f, "selected"),
        }
    }
}

impl FromStr for SampleStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dense" => Ok(SampleStrategy::Dense),
            "selected" => Ok(SampleStrategy::Selected),
            _ => Err(format!("invalid sample strategy: `{s}`")),
        }
    }
}

/// Configuration for building a `ParamMixture`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MixtureConfig {
    /// Check parameter names, values, and shape compatibility
    #[serde(default)]
    pub validate_args: bool,
    /// Report NaN statistics rather than refusing to compute them
    #[serde(default = "default_allow_nan_stats")]
    pub allow_nan_stats: bool,
    /// Shape of the realization drawn at construction
    #[serde(default)]
    pub sample_shape: Vec<usize>,
    /// Prefix for log messages
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub sample_strategy: SampleStrategy,
}

fn default_allow_nan_stats() -> bool {
    true
}

fn default_name() -> String {
    String::from(DEFAULT_NAME)
}

impl MixtureConfig {
    pub fn new() -> Self {
        MixtureConfig {
            validate_args: false,
            allow_nan_stats: default_allow_nan_stats(),
            sample_shape: Vec::new(),
            name: default_name(),
            sample_strategy: SampleStrategy::default(),
        }
    }

    #[must_use]
    pub fn with_validate_args(mut self, validate_args: bool) -> Self {
        self.validate_args = validate_args;
        self
    }

    #[must_use]
    pub fn with_allow_nan_stats(mut self, allow_nan_stats: bool) -> Self {
        self.allow_nan_stats = allow_nan_stats;
        self
    }

    #[must_use]
    pub fn with_sample_shape(mut self, sample_shape: Vec<usize>) -> Self {
        self.sample_shape = sample_shape;
        self
    }

    #[must_use]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_sample_strategy(mut self, strategy: SampleStrategy) -> Self {
        self.sample_strategy = strategy;
        self
    }

    /// The subset of the configuration the component families see
    pub fn dist_config(&self) -> DistConfig {
        DistConfig {
            sample_shape: self.sample_shape.clone(),
            validate_args: self.validate_args,
            allow_nan_stats: self.allow_nan_stats,
        }
    }
}

impl Default for MixtureConfig {
    fn default() -> Self {
        MixtureConfig::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn defaults() {
        let config = MixtureConfig::default();
        assert!(!config.validate_args);
        assert!(config.allow_nan_stats);
        assert!(config.sample_shape.is_empty());
        assert_eq!(config.name, "ParamMixture");
        assert_eq!(config.sample_strategy, SampleStrategy::Dense);
    }

    #[test]
    fn deserialize_fills_defaults() {
        let yaml = indoc!(
            "
            validate_args: true
            sample_shape: [3]
            sample_strategy: selected
            "
        );
        let config: MixtureConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config,
            MixtureConfig::new()
                .with_validate_args(true)
                .with_sample_shape(vec![3])
                .with_sample_strategy(SampleStrategy::Selected)
        );
    }

    #[test]
    fn deserialize_rejects_unknown_fields() {
        let res: Result<MixtureConfig, _> =
            serde_yaml::from_str("validate: true");
        assert!(res.is_err());
    }

    #[test]
    fn strategy_defaults_to_dense() {
        assert_eq!(SampleStrategy::default(), SampleStrategy::Dense);
        let config: MixtureConfig = serde_yaml::from_str("name: m").unwrap();
        assert_eq!(config.sample_strategy, SampleStrategy::Dense);
    }

    #[test]
    fn strategy_from_str() {
        assert_eq!(
            "dense".parse::<SampleStrategy>(),
            Ok(SampleStrategy::Dense)
        );
        assert_eq!(
            "selected".parse::<SampleStrategy>(),
            Ok(SampleStrategy::Selected)
        );
        assert!("sparse".parse::<SampleStrategy>().is_err());
    }

    #[test]
    fn dist_config_carries_shared_settings() {
        let dc = MixtureConfig::new()
            .with_validate_args(true)
            .with_allow_nan_stats(false)
            .with_sample_shape(vec![2, 2])
            .dist_config();
        assert!(dc.validate_args);
        assert!(!dc.allow_nan_stats);
        assert_eq!(dc.sample_shape, vec![2, 2]);
    }
}
