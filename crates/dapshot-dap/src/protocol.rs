//! DAP (Debug Adapter Protocol) message types
//!
//! Based on <https://microsoft.github.io/debug-adapter-protocol/specification>
//!
//! The protocol uses JSON messages preceded by a Content-Length header:
//! ```text
//! Content-Length: 119\r\n
//! \r\n
//! {"seq":1,"type":"request","command":"initialize","arguments":{"adapterID":"python"}}
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ============================================================
// BASE PROTOCOL MESSAGE
// ============================================================

/// Base protocol message - all DAP messages extend this
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProtocolMessage {
    /// Request message (client to adapter, or a reverse request from the adapter)
    Request(Request),
    /// Response message answering a request
    Response(Response),
    /// Event notification from adapter to client
    Event(Event),
}

impl ProtocolMessage {
    /// Get the sequence number of this message
    pub fn seq(&self) -> i64 {
        match self {
            ProtocolMessage::Request(r) => r.seq,
            ProtocolMessage::Response(r) => r.seq,
            ProtocolMessage::Event(e) => e.seq,
        }
    }
}

// ============================================================
// REQUEST
// ============================================================

/// Request message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Sequence number (1-based, monotonically increasing per sender)
    pub seq: i64,
    /// Command to execute
    pub command: String,
    /// Command-specific arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

impl Request {
    pub fn new(seq: i64, command: impl Into<String>) -> Self {
        Self {
            seq,
            command: command.into(),
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, arguments: serde_json::Value) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

// ============================================================
// RESPONSE
// ============================================================

/// Response message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Sequence number
    pub seq: i64,
    /// Sequence number of the corresponding request
    pub request_seq: i64,
    /// Command this response is for
    pub command: String,
    /// Success indicator
    pub success: bool,
    /// Error message if not successful
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl Response {
    pub fn success(seq: i64, request_seq: i64, command: impl Into<String>) -> Self {
        Self {
            seq,
            request_seq,
            command: command.into(),
            success: true,
            message: None,
            body: None,
        }
    }

    pub fn error(
        seq: i64,
        request_seq: i64,
        command: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            seq,
            request_seq,
            command: command.into(),
            success: false,
            message: Some(message.into()),
            body: None,
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Deserialize the body into a typed response body.
    ///
    /// A missing body is treated as `null`, so bodies with required fields fail.
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone().unwrap_or(serde_json::Value::Null))
    }
}

// ============================================================
// EVENT
// ============================================================

/// Event notification sent from adapter to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Sequence number
    pub seq: i64,
    /// Event type
    pub event: String,
    /// Event-specific data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl Event {
    pub fn new(seq: i64, event: impl Into<String>) -> Self {
        Self {
            seq,
            event: event.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Deserialize the body into a typed event body (missing body is `null`)
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone().unwrap_or(serde_json::Value::Null))
    }
}

// ============================================================
// INITIALIZE REQUEST/RESPONSE
// ============================================================

/// Arguments for initialize request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequestArguments {
    /// Unique ID of the client
    #[serde(rename = "clientID", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Human-readable client name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    /// ID of the debug adapter ("debugpy", "coreclr", "go")
    #[serde(rename = "adapterID")]
    pub adapter_id: String,
    /// Locale (ISO 639)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Lines start at 1 (default) or 0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines_start_at1: Option<bool>,
    /// Columns start at 1 (default) or 0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns_start_at1: Option<bool>,
    /// Path format ("path" or "uri")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_format: Option<String>,
    /// Client shows variable types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_variable_type: Option<bool>,
    /// Client can handle the runInTerminal reverse request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_run_in_terminal_request: Option<bool>,
}

/// Capabilities returned in initialize response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Adapter supports the configurationDone request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_configuration_done_request: Option<bool>,
    /// Adapter supports conditional breakpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_conditional_breakpoints: Option<bool>,
    /// Adapter supports logpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_log_points: Option<bool>,
    /// Adapter supports evaluate for hovers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_evaluate_for_hovers: Option<bool>,
    /// Adapter supports the terminate request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_terminate_request: Option<bool>,
    /// Adapter honours `terminateDebuggee` on disconnect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_terminate_debuggee: Option<bool>,
}

// ============================================================
// SETBREAKPOINTS REQUEST
// ============================================================

/// Arguments for setBreakpoints request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsArguments {
    /// Source file location
    pub source: Source,
    /// Breakpoint specifications, in request order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Vec<SourceBreakpoint>>,
    /// Source has been modified since the adapter last saw it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_modified: Option<bool>,
}

/// Source file reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// File path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Source name (for display)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Source reference ID (for sources without path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<i64>,
}

impl Source {
    /// Source for a file path, named after its final component
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = std::path::Path::new(&path)
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        Self {
            path: Some(path),
            name,
            source_reference: None,
        }
    }
}

/// Source breakpoint specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBreakpoint {
    /// Line number (1-based)
    pub line: u32,
    /// Column number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl SourceBreakpoint {
    /// Create a plain breakpoint at a line
    pub fn at_line(line: u32) -> Self {
        Self { line, column: None }
    }
}

/// Response body for setBreakpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsResponseBody {
    /// One entry per requested breakpoint, same order
    pub breakpoints: Vec<Breakpoint>,
}

/// Breakpoint information returned by adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    /// Breakpoint ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Whether breakpoint was successfully verified
    #[serde(default)]
    pub verified: bool,
    /// Optional message about breakpoint status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Actual source location (may differ from requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    /// Actual line (relocated to the nearest executable statement)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Actual column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

// ============================================================
// OUTPUT EVENT
// ============================================================

/// Output event body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputEventBody {
    /// Category of output ("stdout", "stderr", "console", "telemetry", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Output text
    pub output: String,
}

// ============================================================
// STOPPED / EXITED EVENTS
// ============================================================

/// Stopped event body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoppedEventBody {
    /// Reason for stopping ("breakpoint", "step", "exception", "entry")
    #[serde(default)]
    pub reason: String,
    /// Optional description of the reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Thread that stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<i64>,
    /// Additional detail (e.g. exception message)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// If true, all threads are stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_threads_stopped: Option<bool>,
    /// Breakpoint IDs that caused the stop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_breakpoint_ids: Option<Vec<i64>>,
}

/// Exited event body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitedEventBody {
    /// Debuggee exit code
    pub exit_code: i64,
}

// ============================================================
// CONTINUE, DISCONNECT
// ============================================================

/// Continue request arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueArguments {
    /// Thread to continue
    pub thread_id: i64,
    /// Continue only this thread
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_thread: Option<bool>,
}

/// Disconnect request arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectArguments {
    /// Restart the session after disconnecting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart: Option<bool>,
    /// Kill the debuggee (launch) or leave it running (attach)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminate_debuggee: Option<bool>,
}

// ============================================================
// STACK TRACE
// ============================================================

/// Arguments for stackTrace request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceArguments {
    /// Thread to get stack trace for
    pub thread_id: i64,
    /// Start frame index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_frame: Option<i64>,
    /// Maximum number of frames to return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<i64>,
}

/// Stack trace response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceResponseBody {
    /// Stack frames, innermost first
    pub stack_frames: Vec<DapStackFrame>,
    /// Total number of frames (if not all were returned)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_frames: Option<i64>,
}

/// A stack frame from DAP.
///
/// `id` is only valid until the thread resumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DapStackFrame {
    /// Adapter-scoped frame ID
    pub id: i64,
    /// Name of the frame (typically function name)
    pub name: String,
    /// Source location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    /// Line number in source
    #[serde(default)]
    pub line: i64,
    /// Column number in source
    #[serde(default)]
    pub column: i64,
    /// Presentation hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_hint: Option<String>,
}

// ============================================================
// EVALUATE
// ============================================================

/// Arguments for evaluate request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateArguments {
    /// Expression to evaluate
    pub expression: String,
    /// Frame providing the scope; global scope when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<i64>,
    /// Context: "repl", "watch", "hover", "clipboard"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Evaluate response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponseBody {
    /// Rendered result value
    pub result: String,
    /// Type of the result, when the adapter reports one
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    /// Non-zero if the result has children
    #[serde(default)]
    pub variables_reference: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_message_request_serialization() {
        let req = Request::new(1, "initialize")
            .with_arguments(serde_json::json!({"adapterID": "debugpy"}));

        let msg = ProtocolMessage::Request(req);

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"request"#));
        assert!(json.contains(r#""command":"initialize"#));
        assert!(json.contains(r#""adapterID":"debugpy"#));

        let parsed: ProtocolMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_protocol_message_response_serialization() {
        let resp = Response::success(2, 1, "initialize")
            .with_body(serde_json::json!({"supportsConfigurationDoneRequest": true}));

        let msg = ProtocolMessage::Response(resp);

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"response"#));
        assert!(json.contains(r#""request_seq":1"#));
        assert!(json.contains(r#""success":true"#));

        let parsed: ProtocolMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_protocol_message_event_serialization() {
        let event = Event::new(3, "output")
            .with_body(serde_json::json!({"output": "Hello, world!", "category": "stdout"}));

        let msg = ProtocolMessage::Event(event);

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"event"#));
        assert!(json.contains(r#""event":"output"#));

        let parsed: ProtocolMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
        assert_eq!(msg.seq(), 3);
    }

    #[test]
    fn test_initialize_request_arguments_wire_names() {
        let args = InitializeRequestArguments {
            client_id: Some("dapshot".to_string()),
            client_name: Some("dapshot".to_string()),
            adapter_id: "coreclr".to_string(),
            locale: None,
            lines_start_at1: Some(true),
            columns_start_at1: Some(true),
            path_format: Some("path".to_string()),
            supports_variable_type: Some(true),
            supports_run_in_terminal_request: Some(false),
        };

        let json = serde_json::to_string(&args).unwrap();
        // Both ID fields use the upper-case wire names
        assert!(json.contains(r#""adapterID":"coreclr"#));
        assert!(json.contains(r#""clientID":"dapshot"#));
        assert!(json.contains(r#""linesStartAt1":true"#));
        assert!(!json.contains("locale"));

        let parsed: InitializeRequestArguments = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, args);
    }

    #[test]
    fn test_source_from_path_sets_name() {
        let source = Source::from_path("/work/src/app.cs");
        assert_eq!(source.path.as_deref(), Some("/work/src/app.cs"));
        assert_eq!(source.name.as_deref(), Some("app.cs"));
    }

    #[test]
    fn test_breakpoint_tolerates_sparse_fields() {
        let bp: Breakpoint = serde_json::from_str(r#"{"verified": false}"#).unwrap();
        assert!(!bp.verified);
        assert!(bp.line.is_none());

        let bp: Breakpoint =
            serde_json::from_str(r#"{"id": 3, "verified": true, "line": 12, "column": 5}"#)
                .unwrap();
        assert_eq!(bp.line, Some(12));
        assert_eq!(bp.column, Some(5));
    }

    #[test]
    fn test_stopped_event_without_reason_or_thread() {
        let body: StoppedEventBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.reason, "");
        assert!(body.thread_id.is_none());
    }

    #[test]
    fn test_evaluate_round_trip() {
        let args = EvaluateArguments {
            expression: "1+1".to_string(),
            frame_id: Some(1000),
            context: Some("repl".to_string()),
        };
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json["frameId"], 1000);

        let body: EvaluateResponseBody =
            serde_json::from_str(r#"{"result": "2", "type": "int", "variablesReference": 0}"#)
                .unwrap();
        assert_eq!(body.result, "2");
        assert_eq!(body.result_type.as_deref(), Some("int"));
    }

    #[test]
    fn test_response_parse_body_missing_body() {
        let resp = Response::success(1, 1, "evaluate");
        assert!(resp.parse_body::<EvaluateResponseBody>().is_err());
        assert!(resp.parse_body::<Option<EvaluateResponseBody>>().unwrap().is_none());
    }

    #[test]
    fn test_response_error() {
        let resp = Response::error(5, 4, "setBreakpoints", "File not found");

        assert!(!resp.success);
        assert_eq!(resp.message, Some("File not found".to_string()));
        assert_eq!(resp.request_seq, 4);
        assert_eq!(resp.command, "setBreakpoints");
    }

    #[test]
    fn test_disconnect_arguments() {
        let args = DisconnectArguments {
            restart: Some(false),
            terminate_debuggee: Some(true),
        };

        let json = serde_json::to_string(&args).unwrap();
        assert!(json.contains(r#""terminateDebuggee":true"#));
    }
}
