//! `parasol.toml` configuration
//!
//! ```toml
//! [routing]
//! estimation_model = "trunk"   # "mst", "trunk" or "none"
//! extraction = true
//! parallel = true
//! max_workers = 0              # 0: one worker per CPU
//! require_strategies = false
//!
//! [extraction]
//! resistance_per_unit = 0.002535
//! capacitance_per_unit = 0.00016
//! max_segment_length = 100000
//!
//! [characterization]
//! max_gain = 32
//! max_slew_iterations = 100
//! slew_tolerance = 1e-6
//! ```
//!
//! Every table and key is optional.

use crate::error::Result;
use parasol_routing::{EstimationModelKind, EstimatorConfig, ExtractionConfig};
use parasol_timing::CharacterizerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `[routing]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub estimation_model: EstimationModelKind,
    /// Install the default RC extractor
    pub extraction: bool,
    pub parallel: bool,
    pub max_workers: usize,
    pub require_strategies: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let engine = EstimatorConfig::default();
        Self {
            estimation_model: EstimationModelKind::default(),
            extraction: true,
            parallel: engine.parallel,
            max_workers: engine.max_workers,
            require_strategies: engine.require_strategies,
        }
    }
}

impl RoutingConfig {
    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig {
            parallel: self.parallel,
            max_workers: self.max_workers,
            require_strategies: self.require_strategies,
        }
    }
}

/// Complete configuration document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParasolConfig {
    pub routing: RoutingConfig,
    pub extraction: ExtractionConfig,
    pub characterization: CharacterizerConfig,
}

impl ParasolConfig {
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}

/// Parse a configuration from a file path
pub fn from_path(path: impl AsRef<Path>) -> Result<ParasolConfig> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    from_str(&contents)
}

/// Parse a configuration from a string
pub fn from_str(s: &str) -> Result<ParasolConfig> {
    Ok(toml::from_str(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = from_str("").unwrap();
        assert_eq!(config, ParasolConfig::default());
        assert_eq!(config.routing.estimation_model, EstimationModelKind::Trunk);
        assert_eq!(config.characterization.max_gain, 32);
    }

    #[test]
    fn test_partial_tables() {
        let config = from_str(
            r#"
            [routing]
            estimation_model = "mst"
            max_workers = 2

            [extraction]
            max_segment_length = 0
        "#,
        )
        .unwrap();

        assert_eq!(config.routing.estimation_model, EstimationModelKind::Mst);
        assert_eq!(config.routing.estimator_config().max_workers, 2);
        assert!(config.routing.parallel);
        assert_eq!(config.extraction.max_segment_length, 0);
        assert_eq!(
            config.extraction.resistance_per_unit,
            ExtractionConfig::default().resistance_per_unit
        );
    }

    #[test]
    fn test_invalid_model_name() {
        let err = from_str("[routing]\nestimation_model = \"flute\"\n").unwrap_err();
        assert!(matches!(err, crate::ParasolError::Parse(_)));
    }

    #[test]
    fn test_round_trip() {
        let mut config = ParasolConfig::default();
        config.routing.estimation_model = EstimationModelKind::None;
        config.characterization.max_slew_iterations = 7;

        let text = config.to_toml_string().unwrap();
        assert_eq!(from_str(&text).unwrap(), config);
    }
}
