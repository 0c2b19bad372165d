//! Error types for DAP operations

use crate::adapter::ConfigError;
use crate::session::SessionState;
use dapshot_core::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Framing violations and unexpected message shapes
    ///
    /// Use for: bad Content-Length headers, responses that do not match
    /// what was requested, missing required response bodies.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON parsing and deserialization failures
    ///
    /// Automatically converted from `serde_json::Error` via `From` impl.
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    /// Adapter binary missing or not executable, or no adapter for the language
    #[error("Adapter not found: {0}")]
    AdapterNotFound(String),

    /// Adapter process exited early or never accepted a connection
    #[error("Adapter failed to start: {0}")]
    AdapterStartup(String),

    /// Stream I/O and channel failures after the adapter started
    #[error("Adapter communication error: {0}")]
    Communication(String),

    /// A request went unanswered in time
    #[error("Request '{command}' timed out after {timeout_ms}ms")]
    RequestTimeout { command: String, timeout_ms: u64 },

    /// The adapter answered with `success: false`
    #[error("Request '{command}' failed: {message}")]
    RequestFailed { command: String, message: String },

    /// No `stopped` event for the target line
    #[error("Breakpoint not hit: {0}")]
    BreakpointNotHit(String),

    /// Session operation called in the wrong state
    #[error("Cannot {operation} in state {state}")]
    Precondition {
        operation: &'static str,
        state: SessionState,
    },

    /// Invalid adapter configuration or unresolvable launch target
    #[error("Invalid adapter configuration: {0}")]
    Config(#[from] ConfigError),

    /// Target source file does not exist
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The whole invocation ran past its deadline
    #[error("Debug invocation exceeded its {0}ms deadline")]
    DeadlineExceeded(u64),

    /// Language resolution failures
    #[error(transparent)]
    Core(#[from] dapshot_core::Error),
}

impl Error {
    /// Public classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Protocol(_) | Error::InvalidMessage(_) => ErrorKind::Protocol,
            Error::AdapterNotFound(_) => ErrorKind::AdapterNotFound,
            Error::AdapterStartup(_) => ErrorKind::AdapterStartup,
            Error::Communication(_) => ErrorKind::Transport,
            Error::RequestTimeout { .. } | Error::DeadlineExceeded(_) => ErrorKind::RequestTimeout,
            Error::RequestFailed { .. } => ErrorKind::RequestFailed,
            Error::BreakpointNotHit(_) => ErrorKind::BreakpointNotHit,
            Error::Precondition { .. } => ErrorKind::Precondition,
            Error::Config(_) => ErrorKind::Config,
            Error::SourceNotFound(_) => ErrorKind::SourceNotFound,
            Error::Core(_) => ErrorKind::LanguageUnknown,
        }
    }
}

// Implement From for common error types
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidMessage(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Communication(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::Protocol(format!("Invalid UTF-8: {}", err))
    }
}
