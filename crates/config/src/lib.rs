//! Configuration for the Tickmill derivation pipeline
//!
//! The pipeline exposes exactly three tunable surfaces: the bar period
//! set, the contract-stitcher weighting/switch rule, and the Greeks
//! cache/solver settings. Each is a plain serde struct with defaults
//! matching the engine defaults, loaded from YAML and validated before
//! any engine is constructed.

use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod validator;

pub use defaults::*;
pub use parser::{load_pipeline_config, parse_pipeline_config};
pub use validator::{validate_pipeline_config, ValidationError};

/// Top-level configuration for the derivation pipeline
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub bars: BarsConfig,
    #[serde(default)]
    pub stitcher: StitcherConfig,
    #[serde(default)]
    pub greeks: GreeksConfig,
}

/// Bar synthesizer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BarsConfig {
    /// Period identifiers to aggregate concurrently (e.g., "1m", "1d")
    #[serde(default = "default_periods")]
    pub periods: Vec<String>,
}

impl Default for BarsConfig {
    fn default() -> Self {
        Self {
            periods: default_periods(),
        }
    }
}

/// Contract stitcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StitcherConfig {
    /// Weight of daily volume in the main-contract score
    #[serde(default = "default_volume_weight")]
    pub volume_weight: f64,
    /// Weight of open interest in the main-contract score
    #[serde(default = "default_oi_weight")]
    pub oi_weight: f64,
    /// Score ratio an alternative must exceed to become a switch candidate
    #[serde(default = "default_switch_threshold")]
    pub switch_threshold: f64,
    /// Consecutive days the ratio must hold before a switch is confirmed
    #[serde(default = "default_switch_days")]
    pub switch_days: u32,
}

impl Default for StitcherConfig {
    fn default() -> Self {
        Self {
            volume_weight: default_volume_weight(),
            oi_weight: default_oi_weight(),
            switch_threshold: default_switch_threshold(),
            switch_days: default_switch_days(),
        }
    }
}

/// Greeks engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GreeksConfig {
    /// Whether price/Greeks memoization is enabled
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// Newton-Raphson iteration cap for the implied-volatility solver
    #[serde(default = "default_iv_max_iterations")]
    pub iv_max_iterations: u32,
    /// Absolute price tolerance for implied-volatility convergence
    #[serde(default = "default_iv_tolerance")]
    pub iv_tolerance: f64,
}

impl Default for GreeksConfig {
    fn default() -> Self {
        Self {
            cache_enabled: default_cache_enabled(),
            iv_max_iterations: default_iv_max_iterations(),
            iv_tolerance: default_iv_tolerance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.bars.periods.len(), 6);
        assert!((config.stitcher.volume_weight - 0.6).abs() < 1e-12);
        assert!((config.stitcher.oi_weight - 0.4).abs() < 1e-12);
        assert!((config.stitcher.switch_threshold - 1.2).abs() < 1e-12);
        assert_eq!(config.stitcher.switch_days, 3);
        assert!(config.greeks.cache_enabled);
        assert_eq!(config.greeks.iv_max_iterations, 100);
    }
}
