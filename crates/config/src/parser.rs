use crate::{validator, PipelineConfig};
use anyhow::Context;
use common::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Load and validate a pipeline configuration from a YAML file
pub fn load_pipeline_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let path = path.as_ref();
    info!("Loading pipeline configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());

    parse_pipeline_config(&content)
}

/// Parse and validate a pipeline configuration from a YAML string
pub fn parse_pipeline_config(content: &str) -> Result<PipelineConfig> {
    let config: PipelineConfig = serde_yaml::from_str(content)
        .map_err(|e| Error::config(format!("Failed to parse YAML configuration: {}", e)))?;

    validator::validate_pipeline_config(&config)
        .map_err(|e| Error::config(e.to_string()))?;

    info!("Pipeline configuration loaded successfully");
    Ok(config)
}
