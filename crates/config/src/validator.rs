use crate::PipelineConfig;
use thiserror::Error;

/// Period identifiers the bar synthesizer understands
pub const KNOWN_PERIODS: &[&str] = &["1m", "5m", "15m", "30m", "1h", "1d"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No bar periods configured")]
    NoPeriods,

    #[error("Unknown bar period: {0}. Must be one of: 1m, 5m, 15m, 30m, 1h, 1d")]
    UnknownPeriod(String),

    #[error("Duplicate bar period: {0}")]
    DuplicatePeriod(String),

    #[error("Score weights must be non-negative, got volume={volume}, oi={oi}")]
    NegativeWeight { volume: f64, oi: f64 },

    #[error("Score weights must sum to 1.0, got {0}")]
    WeightsNotNormalized(f64),

    #[error("switch_threshold must be greater than 1.0, got {0}")]
    InvalidSwitchThreshold(f64),

    #[error("switch_days must be at least 1")]
    InvalidSwitchDays,

    #[error("iv_max_iterations must be at least 1")]
    InvalidIvIterations,

    #[error("iv_tolerance must be a positive number, got {0}")]
    InvalidIvTolerance(f64),
}

/// Validate a pipeline configuration before any engine is built from it
pub fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ValidationError> {
    if config.bars.periods.is_empty() {
        return Err(ValidationError::NoPeriods);
    }
    let mut seen = Vec::with_capacity(config.bars.periods.len());
    for period in &config.bars.periods {
        if !KNOWN_PERIODS.contains(&period.as_str()) {
            return Err(ValidationError::UnknownPeriod(period.clone()));
        }
        if seen.contains(&period) {
            return Err(ValidationError::DuplicatePeriod(period.clone()));
        }
        seen.push(period);
    }

    let s = &config.stitcher;
    if s.volume_weight < 0.0 || s.oi_weight < 0.0 {
        return Err(ValidationError::NegativeWeight {
            volume: s.volume_weight,
            oi: s.oi_weight,
        });
    }
    let weight_sum = s.volume_weight + s.oi_weight;
    if (weight_sum - 1.0).abs() > 1e-9 {
        return Err(ValidationError::WeightsNotNormalized(weight_sum));
    }
    if !s.switch_threshold.is_finite() || s.switch_threshold <= 1.0 {
        return Err(ValidationError::InvalidSwitchThreshold(s.switch_threshold));
    }
    if s.switch_days == 0 {
        return Err(ValidationError::InvalidSwitchDays);
    }

    let g = &config.greeks;
    if g.iv_max_iterations == 0 {
        return Err(ValidationError::InvalidIvIterations);
    }
    if !g.iv_tolerance.is_finite() || g.iv_tolerance <= 0.0 {
        return Err(ValidationError::InvalidIvTolerance(g.iv_tolerance));
    }

    Ok(())
}
