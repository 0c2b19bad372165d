//! Configuration file loading and validation
//!
//! - [`load_config`] - Strict loader, errors if file missing (no side effects)
//! - [`load_config_from_str`] - Parse and validate TOML content
//! - [`load_config_from_env`] - Honour `DAPSHOT_CONFIG`, defaults otherwise
//!
//! # Usage
//!
//! ```rust,ignore
//! use dapshot_config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("dapshot.toml"))?;
//! println!("Stop timeout: {:?}", config.session.stop_timeout());
//! ```

use crate::constants::ENV_DAPSHOT_CONFIG;
use crate::Config;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Errors that can occur during config loading
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file (strict - no side effects)
///
/// # Returns
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(ConfigError::NotFound)` - Config file does not exist
/// * `Err(ConfigError)` - Failed to read, parse or validate configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    debug!(path = %path.display(), "Loading config file");
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from the file named by `DAPSHOT_CONFIG`.
///
/// Returns defaults when the variable is unset or empty. A set variable
/// pointing at a missing file is an error, not a silent fallback.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    match std::env::var(ENV_DAPSHOT_CONFIG) {
        Ok(path) if !path.trim().is_empty() => load_config(Path::new(path.trim())),
        _ => {
            debug!("{} not set, using default config", ENV_DAPSHOT_CONFIG);
            Ok(Config::default())
        }
    }
}

/// Parse and validate configuration from a TOML string
pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let all_errors = config.session.validate();

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(all_errors.join("; ")))
    }
}
