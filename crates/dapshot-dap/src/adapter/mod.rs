//! Adapter configuration and process management
//!
//! - Static adapter descriptions and their validation
//! - Built-in table for the supported languages
//! - Launch/attach envelope construction
//! - Process spawning, TCP connection with retry, and teardown

mod builtin;
mod config;
mod connection;
mod launch;
mod process;

#[cfg(test)]
mod tests;

// Re-export public API
pub use builtin::{builtin_config, builtin_configs, DEBUGPY_PORT, DELVE_PORT, JS_DEBUG_PORT};
pub use config::{validate, AdapterConfig, ConfigError, RequestKind, TransportKind};
pub use connection::{AdapterConnection, ProcessLauncher};
pub use launch::{build_launch_arguments, find_cargo_binary, find_dotnet_dll, find_sibling_executable};
pub use process::AdapterProcess;
