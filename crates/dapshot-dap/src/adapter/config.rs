//! Adapter Configuration
//!
//! Static description of how to reach one language's debug adapter. The
//! struct is plain data; [`validate`] checks it separately.

use dapshot_config::DEFAULT_ADAPTER_HOST;
use dapshot_core::Language;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Byte channel used to talk to the adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Adapter's stdin/stdout carry DAP
    #[default]
    Stdio,
    /// Adapter listens on a TCP port; we connect as client
    Tcp,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Stdio => write!(f, "stdio"),
            TransportKind::Tcp => write!(f, "tcp"),
        }
    }
}

/// Which request starts the debuggee
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Adapter starts the program (`launch`)
    #[default]
    Launch,
    /// Adapter connects to something already running (`attach`)
    Attach,
}

impl RequestKind {
    /// DAP command name
    pub fn command(&self) -> &'static str {
        match self {
            RequestKind::Launch => crate::constants::requests::LAUNCH,
            RequestKind::Attach => crate::constants::requests::ATTACH,
        }
    }
}

/// Configuration for reaching a debug adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Language this adapter debugs
    pub language: Language,

    /// Command to execute (e.g., "netcoredbg", "dlv")
    pub command: String,

    /// Arguments for the command; `{port}` is substituted
    #[serde(default)]
    pub args: Vec<String>,

    /// Transport used after spawning
    #[serde(default)]
    pub transport: TransportKind,

    /// Host to connect to (tcp only)
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the adapter listens on (required for tcp)
    #[serde(default)]
    pub port: Option<u16>,

    /// `type` field of the launch envelope and `adapterID` of initialize
    pub adapter_type: String,

    /// File extensions this adapter handles, with leading dot
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Launch or attach
    #[serde(default)]
    pub request: RequestKind,

    /// Working directory for the adapter process
    #[serde(default)]
    pub cwd: Option<String>,

    /// Extra environment variables for the adapter process
    #[serde(default)]
    pub env: Vec<(String, String)>,

    /// Static fields merged last into the launch/attach arguments
    #[serde(default)]
    pub launch_arguments: serde_json::Map<String, serde_json::Value>,

    /// Adapter answers launch/attach only after configurationDone
    #[serde(default)]
    pub deferred_launch_response: bool,
}

fn default_host() -> String {
    DEFAULT_ADAPTER_HOST.to_string()
}

impl AdapterConfig {
    /// Create a stdio launch config
    pub fn new(
        language: Language,
        command: impl Into<String>,
        adapter_type: impl Into<String>,
    ) -> Self {
        Self {
            language,
            command: command.into(),
            args: Vec::new(),
            transport: TransportKind::Stdio,
            host: default_host(),
            port: None,
            adapter_type: adapter_type.into(),
            extensions: Vec::new(),
            request: RequestKind::Launch,
            cwd: None,
            env: Vec::new(),
            launch_arguments: serde_json::Map::new(),
            deferred_launch_response: false,
        }
    }

    /// Add an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Switch to TCP transport on the given port
    pub fn tcp(mut self, port: u16) -> Self {
        self.transport = TransportKind::Tcp;
        self.port = Some(port);
        self
    }

    /// Set port (will substitute {port} in args)
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the TCP host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set working directory
    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Add environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Use `attach` instead of `launch`
    pub fn attach(mut self) -> Self {
        self.request = RequestKind::Attach;
        self
    }

    /// Add a handled file extension
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extensions.push(ext.into());
        self
    }

    /// Add a static launch/attach argument
    pub fn launch_argument(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.launch_arguments.insert(key.into(), value);
        self
    }

    /// Mark the adapter as answering launch only after configurationDone
    pub fn deferred_launch_response(mut self) -> Self {
        self.deferred_launch_response = true;
        self
    }

    /// Substitute {port} in args with actual port
    pub fn substitute_port(&self) -> Vec<String> {
        if let Some(port) = self.port {
            self.args
                .iter()
                .map(|arg| arg.replace("{port}", &port.to_string()))
                .collect()
        } else {
            self.args.clone()
        }
    }

    /// Whether `path` carries one of this adapter's extensions, ignoring case
    pub fn supports_file(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Command line as a single display string
    pub fn command_line(&self) -> String {
        let mut line = self.command.clone();
        for arg in self.substitute_port() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

/// Invalid adapter configuration, or a launch target that cannot be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("adapter command is empty")]
    EmptyCommand,

    #[error("tcp transport requires a non-zero port")]
    MissingPort,

    #[error("extension {0:?} must start with '.'")]
    InvalidExtension(String),

    #[error("adapter type is empty")]
    EmptyAdapterType,

    #[error("cannot resolve launch target: {0}")]
    LaunchTarget(String),
}

/// Check an adapter configuration's invariants
pub fn validate(config: &AdapterConfig) -> Result<(), ConfigError> {
    if config.command.trim().is_empty() {
        return Err(ConfigError::EmptyCommand);
    }
    if config.adapter_type.trim().is_empty() {
        return Err(ConfigError::EmptyAdapterType);
    }
    if config.transport == TransportKind::Tcp && matches!(config.port, None | Some(0)) {
        return Err(ConfigError::MissingPort);
    }
    if let Some(ext) = config.extensions.iter().find(|e| !e.starts_with('.')) {
        return Err(ConfigError::InvalidExtension(ext.clone()));
    }
    Ok(())
}
