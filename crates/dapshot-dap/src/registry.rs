//! Adapter Registry
//!
//! Maps a [`Language`] to the adapter that debugs it and the launcher that
//! starts that adapter. Read-mostly; safe to share across concurrent
//! invocations.

use crate::adapter::{builtin_configs, AdapterConfig, AdapterConnection, ProcessLauncher, TransportKind};
use crate::{Error, Result};
use async_trait::async_trait;
use dapshot_config::SessionConfig;
use dapshot_core::Language;
use dashmap::DashMap;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Starts an adapter and hands back its byte channel.
///
/// The default implementation spawns real processes; tests register
/// in-memory fakes through [`AdapterRegistry::register_with_launcher`].
#[async_trait]
pub trait AdapterLauncher: Send + Sync {
    /// Cheap pre-flight check run before any process is spawned
    fn validate_environment(&self, config: &AdapterConfig) -> Result<()> {
        validate_environment(config)
    }

    /// Start the adapter and connect to it
    async fn launch(&self, config: &AdapterConfig, settings: &SessionConfig)
        -> Result<AdapterConnection>;
}

/// Shared reference to a launcher
pub type AdapterLauncherRef = Arc<dyn AdapterLauncher>;

/// One registered adapter
#[derive(Clone)]
pub struct AdapterEntry {
    pub config: AdapterConfig,
    pub launcher: AdapterLauncherRef,
}

impl std::fmt::Debug for AdapterEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterEntry")
            .field("config", &self.config)
            .field("launcher", &"<launcher>")
            .finish()
    }
}

/// Summary of a registered adapter, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterInfo {
    pub language: Language,
    pub command: String,
    pub transport: TransportKind,
    pub port: Option<u16>,
    pub extensions: Vec<String>,
    pub request: &'static str,
    pub available: bool,
}

/// Language to adapter lookup table
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    entries: DashMap<Language, AdapterEntry>,
}

impl AdapterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in adapter
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        for config in builtin_configs() {
            registry.register(config);
        }
        registry
    }

    /// Register (or replace) a config that launches a real process
    pub fn register(&self, config: AdapterConfig) {
        self.register_with_launcher(config, Arc::new(ProcessLauncher));
    }

    /// Register (or replace) a config with a custom launcher
    pub fn register_with_launcher(&self, config: AdapterConfig, launcher: AdapterLauncherRef) {
        let language = config.language;
        debug!(%language, command = %config.command, "Registering adapter");
        self.entries
            .insert(language, AdapterEntry { config, launcher });
    }

    /// Remove a language's adapter, returning it
    pub fn unregister(&self, language: Language) -> Option<AdapterEntry> {
        self.entries.remove(&language).map(|(_, entry)| entry)
    }

    /// Adapter for a language
    pub fn lookup(&self, language: Language) -> Option<AdapterEntry> {
        self.entries.get(&language).map(|entry| entry.value().clone())
    }

    /// Languages with a registered adapter, sorted
    pub fn supported_languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.entries.iter().map(|e| *e.key()).collect();
        languages.sort();
        languages
    }

    /// Languages whose adapter passes its environment check, sorted
    pub fn available_languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self
            .entries
            .iter()
            .filter(|e| e.launcher.validate_environment(&e.config).is_ok())
            .map(|e| *e.key())
            .collect();
        languages.sort();
        languages
    }

    /// Language whose adapter claims the extension of `path`.
    ///
    /// When several adapters claim it, the lowest language wins.
    pub fn language_for_file(&self, path: &Path) -> Option<Language> {
        self.entries
            .iter()
            .filter(|e| e.config.supports_file(path))
            .map(|e| *e.key())
            .min()
    }

    /// Diagnostic summary for one language
    pub fn adapter_info(&self, language: Language) -> Option<AdapterInfo> {
        self.lookup(language).map(|entry| {
            let available = entry.launcher.validate_environment(&entry.config).is_ok();
            let config = entry.config;
            AdapterInfo {
                language,
                command: config.command_line(),
                transport: config.transport,
                port: config.port,
                request: config.request.command(),
                extensions: config.extensions,
                available,
            }
        })
    }
}

/// Best-effort probe that the adapter binary exists and is executable.
///
/// Turns a likely hang on a missing adapter into an immediate error.
pub fn validate_environment(config: &AdapterConfig) -> Result<()> {
    which::which(&config.command)
        .map(|path| debug!(command = %config.command, path = %path.display(), "Adapter binary found"))
        .map_err(|e| {
            Error::AdapterNotFound(format!(
                "'{}' is not installed or not on PATH ({})",
                config.command, e
            ))
        })
}
