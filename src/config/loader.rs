//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::OrchestratorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `auth.api_token`.
pub const API_TOKEN_ENV: &str = "ORCHESTRATOR_API_TOKEN";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<OrchestratorConfig, ConfigError> {
    let mut config: OrchestratorConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<OrchestratorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration from `path` if it exists, otherwise fall back to defaults.
pub fn load_or_default(path: &Path) -> Result<OrchestratorConfig, ConfigError> {
    if path.exists() {
        return load_config(path);
    }

    tracing::info!(path = %path.display(), "Config file not found, using defaults");
    let mut config = OrchestratorConfig::default();
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut OrchestratorConfig) {
    if let Ok(token) = std::env::var(API_TOKEN_ENV) {
        config.auth.api_token = token;
    }
}
