//! Configuration types and loading for dapshot
//!
//! This crate provides:
//! - [`SessionConfig`] - every timeout and limit the protocol engine uses
//! - Config file loading (TOML format)
//! - Environment variable override of the config path
//!
//! # Usage
//!
//! ```rust,ignore
//! use dapshot_config::{Config, load_config};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("dapshot.toml"))?;
//! println!("Request timeout: {}ms", config.session.request_timeout_ms);
//! ```

// Default constants for all configuration values
pub mod constants;

mod loader;
mod session;

pub use constants::*;
pub use loader::{load_config, load_config_from_env, load_config_from_str, ConfigError};
pub use session::SessionConfig;

use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Debug session timing and limits
    #[serde(default)]
    pub session: SessionConfig,
}
