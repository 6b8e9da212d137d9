//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ServiceConfig, ServiceRole};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration for `role` from an optional TOML file
/// and the process environment.
pub fn load_config(role: ServiceRole, path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    load_config_with(role, path, |key| std::env::var(key).ok())
}

/// Like [`load_config`] with an explicit variable lookup.
pub fn load_config_with<F>(role: ServiceRole, path: Option<&Path>, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str::<ServiceConfig>(&content)?
        }
        None => ServiceConfig::default(),
    };

    config.apply_role_defaults(role);
    config.apply_env_overrides(lookup);

    validate_config(&config, role).map_err(ConfigError::Validation)?;

    Ok(config)
}
