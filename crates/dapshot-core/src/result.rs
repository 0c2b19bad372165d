//! The single artifact a debug invocation produces

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable failure classification.
///
/// Serialized names are stable and are what callers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Adapter binary missing or not executable; precedes any protocol traffic
    #[serde(rename = "AdapterNotFoundError")]
    AdapterNotFound,
    /// Adapter process or socket unreachable within the startup deadline
    #[serde(rename = "AdapterStartupError")]
    AdapterStartup,
    /// Malformed frame, invalid JSON or unexpected message shape
    #[serde(rename = "ProtocolError")]
    Protocol,
    /// A request went unanswered in time, or the invocation deadline expired
    #[serde(rename = "RequestTimeoutError")]
    RequestTimeout,
    /// No `stopped` event arrived for the target line
    #[serde(rename = "BreakpointNotHitError")]
    BreakpointNotHit,
    /// The target file's language could not be determined
    #[serde(rename = "LanguageUnknownError")]
    LanguageUnknown,
    /// A session operation was called in the wrong state
    #[serde(rename = "PreconditionError")]
    Precondition,
    /// The adapter answered a request with `success: false`
    #[serde(rename = "RequestFailedError")]
    RequestFailed,
    /// The connection to the adapter was lost
    #[serde(rename = "TransportError")]
    Transport,
    /// The target file does not exist
    #[serde(rename = "SourceNotFoundError")]
    SourceNotFound,
    /// Invalid adapter configuration or unresolvable launch target
    #[serde(rename = "ConfigError")]
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdapterNotFound => "AdapterNotFoundError",
            Self::AdapterStartup => "AdapterStartupError",
            Self::Protocol => "ProtocolError",
            Self::RequestTimeout => "RequestTimeoutError",
            Self::BreakpointNotHit => "BreakpointNotHitError",
            Self::LanguageUnknown => "LanguageUnknownError",
            Self::Precondition => "PreconditionError",
            Self::RequestFailed => "RequestFailedError",
            Self::Transport => "TransportError",
            Self::SourceNotFound => "SourceNotFoundError",
            Self::Config => "ConfigError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error carried inside a failed [`DebugResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DebugError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for DebugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Outcome of one debug invocation.
///
/// Fields are private; a result is assembled once by the orchestrator and
/// only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugResult {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<String>,
    #[serde(default)]
    output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<DebugError>,
    language: String,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl DebugResult {
    /// Successful evaluation with its value
    pub fn success(language: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            success: true,
            result: Some(value.into()),
            output: String::new(),
            error: None,
            language: language.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Failed invocation
    pub fn failure(language: impl Into<String>, error: DebugError) -> Self {
        Self {
            success: false,
            result: None,
            output: String::new(),
            error: Some(error),
            language: language.into(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Evaluated value, present only on success
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Captured program output (and a summary unless the invocation was quiet)
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn error(&self) -> Option<&DebugError> {
        self.error.as_ref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Language id, or empty when detection failed before a language was known
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }
}
