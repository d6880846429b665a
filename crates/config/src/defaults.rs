//! Default values for pipeline configuration fields

pub fn default_periods() -> Vec<String> {
    vec!["1m", "5m", "15m", "30m", "1h", "1d"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn default_volume_weight() -> f64 {
    0.6
}

pub fn default_oi_weight() -> f64 {
    0.4
}

pub fn default_switch_threshold() -> f64 {
    1.2
}

pub fn default_switch_days() -> u32 {
    3
}

pub fn default_cache_enabled() -> bool {
    true
}

pub fn default_iv_max_iterations() -> u32 {
    100
}

pub fn default_iv_tolerance() -> f64 {
    1e-6
}
