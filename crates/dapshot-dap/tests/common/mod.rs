//! Common test infrastructure for DAP session and orchestrator tests
//!
//! This module provides:
//! - An in-process fake adapter speaking real DAP framing over `tokio::io::duplex`
//!   or an accepted TCP connection
//! - `FakeLauncher`, which plugs the fake into an `AdapterRegistry`
//! - A request log so tests can assert on exactly what was sent
//! - Helpers for short timeouts and temporary source files

#![allow(dead_code)]

use async_trait::async_trait;
use dapshot_config::SessionConfig;
use dapshot_dap::codec::{read_message, write_message};
use dapshot_dap::{
    AdapterConfig, AdapterConnection, AdapterLauncher, DapSession, Event, Language,
    ProtocolMessage, Request, Response, Result,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;

/// Frame id the fake reports for the innermost frame
pub const FAKE_FRAME_ID: i64 = 1000;
/// Line the fake reports for the innermost frame
pub const FAKE_FRAME_LINE: i64 = 10;

/// How the fake adapter behaves after configurationDone and on evaluate
#[derive(Debug, Clone)]
pub struct FakeAdapterBehavior {
    /// Emit `stopped` after configurationDone
    pub emit_stopped: bool,
    /// Reason on the `stopped` event
    pub stop_reason: String,
    /// Stop with reason "entry" first; the real stop follows `continue`
    pub stop_on_entry: bool,
    /// Leave `threadId` out of the `stopped` event
    pub omit_thread_id: bool,
    /// Emit `exited` + `terminated` instead of stopping
    pub exit_instead_of_stop: bool,
    /// Answer launch/attach only after configurationDone
    pub defer_launch_response: bool,
    /// Output event emitted when the program starts
    pub program_output: Option<String>,
    /// Value returned by `evaluate`
    pub evaluate_result: String,
    /// Type returned by `evaluate`
    pub evaluate_type: Option<String>,
    /// Verified flag on every breakpoint
    pub verify_breakpoints: bool,
    /// Return no frames from `stackTrace`
    pub empty_stack: bool,
    /// Fail `launch` / `attach` with this message
    pub launch_error: Option<String>,
}

impl Default for FakeAdapterBehavior {
    fn default() -> Self {
        Self {
            emit_stopped: true,
            stop_reason: "breakpoint".to_string(),
            stop_on_entry: false,
            omit_thread_id: false,
            exit_instead_of_stop: false,
            defer_launch_response: false,
            program_output: Some("hello from debuggee\n".to_string()),
            evaluate_result: "2".to_string(),
            evaluate_type: Some("int".to_string()),
            verify_breakpoints: true,
            empty_stack: false,
            launch_error: None,
        }
    }
}

impl FakeAdapterBehavior {
    /// Fake that accepts everything but never stops
    pub fn never_stops() -> Self {
        Self {
            emit_stopped: false,
            ..Self::default()
        }
    }
}

/// Every request the fake received, in arrival order
#[derive(Debug, Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<Request>>>);

impl RequestLog {
    fn push(&self, request: Request) {
        self.0.lock().unwrap().push(request);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.0.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.command).collect()
    }

    /// First request with this command
    pub fn find(&self, command: &str) -> Option<Request> {
        self.requests().into_iter().find(|r| r.command == command)
    }
}

/// Start a fake adapter task and return the client side of its channel
pub fn spawn_fake_adapter(behavior: FakeAdapterBehavior, log: RequestLog) -> AdapterConnection {
    let (client, server) = tokio::io::duplex(64 * 1024);
    tokio::spawn(serve(server, behavior, log));
    let (reader, writer) = tokio::io::split(client);
    AdapterConnection::new(reader, writer)
}

/// Serve one fake adapter session on the first connection `listener` accepts
pub async fn serve_fake_adapter_tcp(
    listener: TcpListener,
    behavior: FakeAdapterBehavior,
    log: RequestLog,
) {
    if let Ok((stream, _)) = listener.accept().await {
        serve(stream, behavior, log).await;
    }
}

/// A local port with nothing listening on it
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

struct FakeWriter {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    seq: i64,
}

impl FakeWriter {
    fn next_seq(&mut self) -> i64 {
        self.seq += 1;
        self.seq
    }

    async fn respond(&mut self, request: &Request, body: Option<serde_json::Value>) {
        let mut response = Response::success(self.next_seq(), request.seq, request.command.clone());
        response.body = body;
        let _ = write_message(&mut self.writer, &ProtocolMessage::Response(response)).await;
    }

    async fn fail(&mut self, request: &Request, message: &str) {
        let response =
            Response::error(self.next_seq(), request.seq, request.command.clone(), message);
        let _ = write_message(&mut self.writer, &ProtocolMessage::Response(response)).await;
    }

    async fn event(&mut self, name: &str, body: serde_json::Value) {
        let event = Event::new(self.next_seq(), name).with_body(body);
        let _ = write_message(&mut self.writer, &ProtocolMessage::Event(event)).await;
    }

    async fn stopped(&mut self, reason: &str, omit_thread_id: bool) {
        let body = if omit_thread_id {
            json!({"reason": reason, "allThreadsStopped": true})
        } else {
            json!({"reason": reason, "threadId": 1, "allThreadsStopped": true})
        };
        self.event("stopped", body).await;
    }
}

async fn serve<S>(stream: S, behavior: FakeAdapterBehavior, log: RequestLog)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read, write) = tokio::io::split(stream);
    let mut reader = BufReader::new(read);
    let mut out = FakeWriter {
        writer: Box::new(write),
        seq: 0,
    };
    let mut deferred_launch: Option<Request> = None;

    while let Ok(Some(message)) = read_message(&mut reader).await {
        let ProtocolMessage::Request(request) = message else {
            continue;
        };
        log.push(request.clone());

        match request.command.as_str() {
            "initialize" => {
                out.respond(
                    &request,
                    Some(json!({
                        "supportsConfigurationDoneRequest": true,
                        "supportsEvaluateForHovers": true,
                    })),
                )
                .await;
                out.event("initialized", json!({})).await;
            }
            "setBreakpoints" => {
                let lines: Vec<u64> = request
                    .arguments
                    .as_ref()
                    .and_then(|a| a["breakpoints"].as_array().cloned())
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|bp| bp["line"].as_u64())
                    .collect();
                let breakpoints: Vec<serde_json::Value> = lines
                    .iter()
                    .enumerate()
                    .map(|(i, line)| {
                        json!({"id": i + 1, "verified": behavior.verify_breakpoints, "line": line})
                    })
                    .collect();
                out.respond(&request, Some(json!({ "breakpoints": breakpoints })))
                    .await;
            }
            "launch" | "attach" => {
                if let Some(message) = &behavior.launch_error {
                    out.fail(&request, message).await;
                    continue;
                }
                if behavior.defer_launch_response {
                    deferred_launch = Some(request.clone());
                } else {
                    out.respond(&request, None).await;
                }
                if let Some(text) = &behavior.program_output {
                    out.event("output", json!({"category": "stdout", "output": text}))
                        .await;
                }
                out.event(
                    "output",
                    json!({"category": "telemetry", "output": "ptvsd"}),
                )
                .await;
            }
            "configurationDone" => {
                out.respond(&request, None).await;
                if let Some(launch) = deferred_launch.take() {
                    out.respond(&launch, None).await;
                }
                if behavior.exit_instead_of_stop {
                    out.event("exited", json!({"exitCode": 3})).await;
                    out.event("terminated", json!({})).await;
                } else if behavior.stop_on_entry {
                    out.stopped("entry", behavior.omit_thread_id).await;
                } else if behavior.emit_stopped {
                    out.stopped(&behavior.stop_reason, behavior.omit_thread_id)
                        .await;
                }
            }
            "continue" => {
                out.respond(&request, Some(json!({"allThreadsContinued": true})))
                    .await;
                if behavior.emit_stopped {
                    out.stopped(&behavior.stop_reason, behavior.omit_thread_id)
                        .await;
                }
            }
            "stackTrace" => {
                let frames = if behavior.empty_stack {
                    json!([])
                } else {
                    json!([
                        {"id": FAKE_FRAME_ID, "name": "main", "line": FAKE_FRAME_LINE, "column": 1,
                         "source": {"path": "/work/app.py", "name": "app.py"}},
                        {"id": FAKE_FRAME_ID + 1, "name": "<module>", "line": 20, "column": 1},
                    ])
                };
                out.respond(&request, Some(json!({"stackFrames": frames})))
                    .await;
            }
            "evaluate" => {
                let mut body = json!({
                    "result": behavior.evaluate_result,
                    "variablesReference": 0,
                });
                if let Some(ty) = &behavior.evaluate_type {
                    body["type"] = json!(ty);
                }
                out.respond(&request, Some(body)).await;
            }
            "disconnect" => {
                out.respond(&request, None).await;
                out.event("output", json!({"category": "stdout", "output": "bye\n"}))
                    .await;
                break;
            }
            other => {
                out.fail(&request, &format!("unsupported request {}", other))
                    .await;
            }
        }
    }
}

/// Launcher that connects sessions to fresh fake adapters
pub struct FakeLauncher {
    pub behavior: FakeAdapterBehavior,
    pub log: RequestLog,
}

impl FakeLauncher {
    pub fn new(behavior: FakeAdapterBehavior) -> Self {
        Self {
            behavior,
            log: RequestLog::default(),
        }
    }
}

#[async_trait]
impl AdapterLauncher for FakeLauncher {
    fn validate_environment(&self, _config: &AdapterConfig) -> Result<()> {
        Ok(())
    }

    async fn launch(
        &self,
        _config: &AdapterConfig,
        _settings: &SessionConfig,
    ) -> Result<AdapterConnection> {
        Ok(spawn_fake_adapter(self.behavior.clone(), self.log.clone()))
    }
}

/// Config for the fake adapter (launch mode, python file extension)
pub fn fake_config() -> AdapterConfig {
    AdapterConfig::new(Language::Python, "fake-dap", "fake").extension(".py")
}

/// Short timeouts so failures show up quickly
pub fn fast_settings() -> SessionConfig {
    SessionConfig {
        request_timeout_ms: 2_000,
        stop_timeout_ms: 2_000,
        disconnect_timeout_ms: 500,
        shutdown_grace_ms: 500,
        invocation_timeout_ms: 10_000,
        ..SessionConfig::default()
    }
}

/// Session wired to a fresh fake adapter
pub fn fake_session(
    behavior: FakeAdapterBehavior,
    config: AdapterConfig,
) -> (DapSession, RequestLog) {
    let log = RequestLog::default();
    let connection = spawn_fake_adapter(behavior, log.clone());
    (DapSession::new(connection, config, fast_settings()), log)
}

/// Write a source file into `dir`
pub fn write_source(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
