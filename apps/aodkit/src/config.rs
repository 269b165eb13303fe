//! # Workflow Configuration Files
//!
//! Loads and writes the TOML form of [`WorkflowConfig`]. The configuration
//! is read once at startup; a missing `--config` means all defaults.

use aodkit_core::{AodError, WorkflowConfig};
use std::path::Path;

/// Maximum size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Parse a configuration document and validate it.
pub fn parse_config(text: &str) -> Result<WorkflowConfig, AodError> {
    let config: WorkflowConfig = toml::from_str(text)
        .map_err(|e| AodError::InvalidConfig(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration from `path`, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<WorkflowConfig, AodError> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(WorkflowConfig::default());
    };

    let metadata = std::fs::metadata(path).map_err(|e| {
        AodError::IoError(format!("Cannot read config '{}': {e}", path.display()))
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(AodError::InvalidConfig(format!(
            "Config file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }

    let text = std::fs::read_to_string(path).map_err(|e| {
        AodError::IoError(format!("Cannot read config '{}': {e}", path.display()))
    })?;
    let config = parse_config(&text)?;
    tracing::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// The default configuration as a TOML document.
pub fn default_config_toml() -> Result<String, AodError> {
    toml::to_string(&WorkflowConfig::default())
        .map_err(|e| AodError::SerializationError(e.to_string()))
}
