//! DAP Session - the protocol state machine for one debug invocation
//!
//! ```text
//! Unstarted -initialize-> Initialized -setBreakpoints-> BreakpointsSet
//!   -launch-> Launched -configurationDone-> Running -stopped-> Stopped
//!   -evaluate-> Evaluated -terminate-> Terminated
//! ```
//!
//! Any failed step moves to `Failed`. Calling an operation in the wrong
//! state is a [`Error::Precondition`] and leaves the state untouched.
//! `terminate()` is valid from every state and idempotent.

use crate::adapter::{AdapterConfig, AdapterConnection, AdapterProcess};
use crate::broker::{DapBroker, EventReceiver, PendingResponse};
use crate::constants::{defaults, events, output_categories, requests, stop_reasons};
use crate::{
    Breakpoint, Capabilities, ContinueArguments, DapStackFrame, DisconnectArguments, Error,
    EvaluateArguments, EvaluateResponseBody, Event, ExitedEventBody, InitializeRequestArguments,
    LogErr, OutputEventBody, Response, Result, SetBreakpointsArguments,
    SetBreakpointsResponseBody, Source, SourceBreakpoint, StackTraceArguments,
    StackTraceResponseBody, StoppedEventBody,
};
use dapshot_config::{SessionConfig, DAP_CLIENT_ID, DAP_CLIENT_NAME, DAP_LOCALE};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Lifecycle state of a [`DapSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Unstarted,
    Initialized,
    BreakpointsSet,
    Launched,
    Running,
    Stopped,
    Evaluated,
    Terminated,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unstarted => "Unstarted",
            SessionState::Initialized => "Initialized",
            SessionState::BreakpointsSet => "BreakpointsSet",
            SessionState::Launched => "Launched",
            SessionState::Running => "Running",
            SessionState::Stopped => "Stopped",
            SessionState::Evaluated => "Evaluated",
            SessionState::Terminated => "Terminated",
            SessionState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Where and why the debuggee stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopInfo {
    pub thread_id: i64,
    pub reason: String,
    pub description: Option<String>,
    pub hit_breakpoint_ids: Vec<i64>,
}

/// One adapter connection driven through the debug lifecycle.
///
/// Sessions are single-use: create one per invocation and always call
/// [`DapSession::terminate`].
pub struct DapSession {
    config: AdapterConfig,
    settings: SessionConfig,
    broker: Option<DapBroker>,
    events: EventReceiver,
    process: Option<AdapterProcess>,
    pid: Option<u32>,
    state: SessionState,
    capabilities: Option<Capabilities>,
    pending_launch: Option<PendingResponse>,
    output: String,
    output_truncated: bool,
    released: bool,
}

impl fmt::Debug for DapSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DapSession")
            .field("language", &self.config.language)
            .field("state", &self.state)
            .field("pid", &self.pid)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl DapSession {
    /// Start a session over an established adapter connection
    pub fn new(connection: AdapterConnection, config: AdapterConfig, settings: SessionConfig) -> Self {
        let AdapterConnection {
            reader,
            writer,
            process,
        } = connection;
        let (broker, events) = DapBroker::new(reader, writer);
        let pid = process.as_ref().and_then(|p| p.pid());

        Self {
            config,
            settings,
            broker: Some(broker),
            events,
            process,
            pid,
            state: SessionState::Unstarted,
            capabilities: None,
            pending_launch: None,
            output: String::new(),
            output_truncated: false,
            released: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Adapter capabilities reported by `initialize`
    pub fn capabilities(&self) -> Option<&Capabilities> {
        self.capabilities.as_ref()
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// OS process ID of the adapter, if one was spawned
    pub fn process_id(&self) -> Option<u32> {
        self.pid
    }

    /// Program output captured so far
    pub fn output(&self) -> &str {
        &self.output
    }

    /// True if output was dropped after reaching `max_output_bytes`
    pub fn output_truncated(&self) -> bool {
        self.output_truncated
    }

    // ------------------------------------------------------------------
    // Lifecycle operations
    // ------------------------------------------------------------------

    /// Exchange capabilities with the adapter
    pub async fn initialize(&mut self) -> Result<Capabilities> {
        self.require("initialize", &[SessionState::Unstarted])?;
        let result = self.do_initialize().await;
        self.settle(result, SessionState::Initialized)
    }

    async fn do_initialize(&mut self) -> Result<Capabilities> {
        let args = InitializeRequestArguments {
            client_id: Some(DAP_CLIENT_ID.to_string()),
            client_name: Some(DAP_CLIENT_NAME.to_string()),
            adapter_id: self.config.adapter_type.clone(),
            locale: Some(DAP_LOCALE.to_string()),
            lines_start_at1: Some(true),
            columns_start_at1: Some(true),
            path_format: Some("path".to_string()),
            supports_variable_type: Some(true),
            supports_run_in_terminal_request: Some(false),
        };

        let response = self
            .request(requests::INITIALIZE, Some(serde_json::to_value(args)?))
            .await?;
        let capabilities = response
            .parse_body::<Option<Capabilities>>()?
            .unwrap_or_default();
        debug!(?capabilities, "Adapter capabilities");
        self.capabilities = Some(capabilities.clone());
        Ok(capabilities)
    }

    /// Set breakpoints for one source file.
    ///
    /// The returned list has one entry per requested line, in request order.
    /// Unverified breakpoints are returned, not treated as errors.
    pub async fn set_breakpoints(&mut self, file: &Path, lines: &[u32]) -> Result<Vec<Breakpoint>> {
        self.require(
            "setBreakpoints",
            &[SessionState::Initialized, SessionState::BreakpointsSet],
        )?;
        let result = self.do_set_breakpoints(file, lines).await;
        self.settle(result, SessionState::BreakpointsSet)
    }

    async fn do_set_breakpoints(&mut self, file: &Path, lines: &[u32]) -> Result<Vec<Breakpoint>> {
        let args = SetBreakpointsArguments {
            source: Source::from_path(file.to_string_lossy()),
            breakpoints: Some(lines.iter().copied().map(SourceBreakpoint::at_line).collect()),
            source_modified: Some(false),
        };

        let response = self
            .request(requests::SET_BREAKPOINTS, Some(serde_json::to_value(args)?))
            .await?;
        let body: SetBreakpointsResponseBody = response.parse_body()?;

        if body.breakpoints.len() != lines.len() {
            return Err(Error::Protocol(format!(
                "setBreakpoints returned {} breakpoints for {} requested lines",
                body.breakpoints.len(),
                lines.len()
            )));
        }

        for (line, bp) in lines.iter().zip(&body.breakpoints) {
            debug!(
                requested = line,
                actual = ?bp.line,
                verified = bp.verified,
                message = ?bp.message,
                "Breakpoint set"
            );
        }
        Ok(body.breakpoints)
    }

    /// Send `launch` or `attach` (per the adapter config) with the given arguments
    pub async fn launch(&mut self, arguments: serde_json::Map<String, serde_json::Value>) -> Result<()> {
        self.require(
            "launch",
            &[SessionState::Initialized, SessionState::BreakpointsSet],
        )?;
        let result = self.do_launch(arguments).await;
        self.settle(result, SessionState::Launched)
    }

    async fn do_launch(&mut self, arguments: serde_json::Map<String, serde_json::Value>) -> Result<()> {
        let command = self.config.request.command();
        let arguments = Some(serde_json::Value::Object(arguments));

        if self.config.deferred_launch_response {
            // Answered only after configurationDone; awaited there
            let pending = self.broker()?.start_request(command, arguments)?;
            self.pending_launch = Some(pending);
            debug!(command, "Request sent, response deferred until configurationDone");
        } else {
            self.request(command, arguments).await?;
        }
        info!(language = %self.config.language, command, "Debuggee starting");
        Ok(())
    }

    /// Signal that configuration is complete; the debuggee starts running
    pub async fn configuration_done(&mut self) -> Result<()> {
        self.require("configurationDone", &[SessionState::Launched])?;
        let result = self.do_configuration_done().await;
        self.settle(result, SessionState::Running)
    }

    async fn do_configuration_done(&mut self) -> Result<()> {
        let supported = self
            .capabilities
            .as_ref()
            .and_then(|c| c.supports_configuration_done_request)
            .unwrap_or(true);

        if supported {
            self.request(requests::CONFIGURATION_DONE, None).await?;
        } else {
            debug!("Adapter does not support configurationDone, skipping");
        }

        if let Some(pending) = self.pending_launch.take() {
            let response = pending.wait(self.settings.request_timeout()).await?;
            check_success(response)?;
        }
        Ok(())
    }

    /// Wait for the debuggee to stop, up to `timeout`.
    ///
    /// Output events are captured along the way. A stop on entry is
    /// continued. An exception stop, program exit, or an expired timeout is
    /// reported as [`Error::BreakpointNotHit`].
    pub async fn wait_for_stop(&mut self, timeout: Duration) -> Result<StopInfo> {
        self.require("waitForStop", &[SessionState::Running])?;
        let result = self.do_wait_for_stop(timeout).await;
        self.settle(result, SessionState::Stopped)
    }

    async fn do_wait_for_stop(&mut self, timeout: Duration) -> Result<StopInfo> {
        let deadline = Instant::now() + timeout;

        loop {
            let event = match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => return Err(self.connection_lost()),
                Err(_) => {
                    return Err(Error::BreakpointNotHit(format!(
                        "No stopped event within {}ms",
                        timeout.as_millis()
                    )))
                }
            };

            match event.event.as_str() {
                events::OUTPUT => self.capture_output(&event),
                events::STOPPED => {
                    let body: StoppedEventBody = event
                        .parse_body::<Option<StoppedEventBody>>()
                        .debug_ok("Malformed stopped event body")
                        .flatten()
                        .unwrap_or_default();
                    let thread_id = body.thread_id.unwrap_or(defaults::THREAD_ID);

                    match body.reason.as_str() {
                        stop_reasons::ENTRY => {
                            debug!(thread_id, "Stopped on entry, continuing");
                            self.continue_thread(thread_id).await?;
                        }
                        stop_reasons::EXCEPTION => {
                            let detail = body
                                .text
                                .or(body.description)
                                .unwrap_or_else(|| "unknown exception".to_string());
                            return Err(Error::BreakpointNotHit(format!(
                                "Stopped on exception before reaching the breakpoint: {}",
                                detail
                            )));
                        }
                        _ => {
                            info!(thread_id, reason = %body.reason, "Debuggee stopped");
                            return Ok(StopInfo {
                                thread_id,
                                reason: body.reason,
                                description: body.description,
                                hit_breakpoint_ids: body.hit_breakpoint_ids.unwrap_or_default(),
                            });
                        }
                    }
                }
                events::EXITED => {
                    let code = event
                        .parse_body::<ExitedEventBody>()
                        .debug_ok("Malformed exited event body")
                        .map(|b| b.exit_code);
                    return Err(Error::BreakpointNotHit(match code {
                        Some(code) => format!(
                            "Program exited with code {} before reaching the breakpoint",
                            code
                        ),
                        None => "Program exited before reaching the breakpoint".to_string(),
                    }));
                }
                events::TERMINATED => {
                    return Err(Error::BreakpointNotHit(
                        "Debug session terminated before reaching the breakpoint".to_string(),
                    ));
                }
                other => trace!(event = other, "Ignoring event while waiting for stop"),
            }
        }
    }

    async fn continue_thread(&mut self, thread_id: i64) -> Result<()> {
        let args = ContinueArguments {
            thread_id,
            single_thread: None,
        };
        self.request(requests::CONTINUE, Some(serde_json::to_value(args)?))
            .await?;
        Ok(())
    }

    /// Stack frames of a stopped thread, innermost first
    pub async fn stack_trace(&mut self, thread_id: i64) -> Result<Vec<DapStackFrame>> {
        self.require(
            "stackTrace",
            &[SessionState::Stopped, SessionState::Evaluated],
        )?;
        let result = self.do_stack_trace(thread_id).await;
        let state = self.state;
        self.settle(result, state)
    }

    async fn do_stack_trace(&mut self, thread_id: i64) -> Result<Vec<DapStackFrame>> {
        let args = StackTraceArguments {
            thread_id,
            start_frame: Some(0),
            levels: Some(i64::from(self.settings.stack_trace_levels)),
        };
        let response = self
            .request(requests::STACK_TRACE, Some(serde_json::to_value(args)?))
            .await?;
        let body: StackTraceResponseBody = response.parse_body()?;
        debug!(thread_id, frames = body.stack_frames.len(), "Stack trace");
        Ok(body.stack_frames)
    }

    /// Evaluate an expression in a frame's context (global scope without a frame)
    pub async fn evaluate(
        &mut self,
        expression: &str,
        frame_id: Option<i64>,
    ) -> Result<EvaluateResponseBody> {
        self.require("evaluate", &[SessionState::Stopped, SessionState::Evaluated])?;
        let result = self.do_evaluate(expression, frame_id).await;
        self.settle(result, SessionState::Evaluated)
    }

    async fn do_evaluate(
        &mut self,
        expression: &str,
        frame_id: Option<i64>,
    ) -> Result<EvaluateResponseBody> {
        let args = EvaluateArguments {
            expression: expression.to_string(),
            frame_id,
            context: Some(self.settings.evaluate_context.clone()),
        };
        let response = self
            .request(requests::EVALUATE, Some(serde_json::to_value(args)?))
            .await?;
        let body: EvaluateResponseBody = response.parse_body()?;
        debug!(expression, result = %body.result, "Evaluated");
        Ok(body)
    }

    /// Disconnect, release the transport and stop the adapter.
    ///
    /// Valid in every state, safe to call more than once, never fails.
    pub async fn terminate(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.pending_launch = None;

        if let Some(broker) = self.broker.take() {
            if !broker.is_closed() {
                let args = DisconnectArguments {
                    restart: None,
                    terminate_debuggee: Some(true),
                };
                let result = broker
                    .send_request(
                        requests::DISCONNECT,
                        serde_json::to_value(args).debug_ok("Encoding disconnect"),
                        self.settings.disconnect_timeout(),
                    )
                    .await;
                match result {
                    Ok(response) if response.success => debug!("Disconnected from adapter"),
                    Ok(response) => debug!(message = ?response.message, "Disconnect refused"),
                    Err(e) => debug!("Disconnect failed: {}", e),
                }
            }
            // Dropping the broker closes the adapter's stdin / socket
        }

        if let Some(mut process) = self.process.take() {
            process.shutdown(self.settings.shutdown_grace()).await;
        }

        if self.state != SessionState::Failed {
            self.state = SessionState::Terminated;
        }
        info!(language = %self.config.language, state = %self.state, "Session terminated");
    }

    /// Collect output events that are already queued (e.g. after the stop)
    pub fn drain_output(&mut self) -> &str {
        while let Ok(event) = self.events.try_recv() {
            if event.event == events::OUTPUT {
                self.capture_output(&event);
            }
        }
        &self.output
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn require(&self, operation: &'static str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::Precondition {
                operation,
                state: self.state,
            })
        }
    }

    fn settle<T>(&mut self, result: Result<T>, next: SessionState) -> Result<T> {
        match &result {
            Ok(_) => {
                trace!(from = %self.state, to = %next, "Session state change");
                self.state = next;
            }
            Err(e) => {
                warn!(state = %self.state, "Session step failed: {}", e);
                self.state = SessionState::Failed;
            }
        }
        result
    }

    fn broker(&self) -> Result<&DapBroker> {
        self.broker
            .as_ref()
            .ok_or_else(|| Error::Communication("Session already terminated".to_string()))
    }

    async fn request(&self, command: &str, arguments: Option<serde_json::Value>) -> Result<Response> {
        let response = self
            .broker()?
            .send_request(command, arguments, self.settings.request_timeout())
            .await?;
        check_success(response)
    }

    fn connection_lost(&self) -> Error {
        self.broker
            .as_ref()
            .and_then(|b| b.close_reason().cloned())
            .unwrap_or_else(|| Error::Communication("Adapter connection closed".to_string()))
    }

    fn capture_output(&mut self, event: &Event) {
        let Some(body) = event
            .parse_body::<OutputEventBody>()
            .debug_ok("Ignoring malformed output event")
        else {
            return;
        };

        match body.category.as_deref() {
            Some(output_categories::TELEMETRY) | Some(output_categories::CONSOLE) => {
                trace!(category = ?body.category, "Skipping non-program output");
            }
            _ => self.append_output(&body.output),
        }
    }

    fn append_output(&mut self, text: &str) {
        let room = self.settings.max_output_bytes.saturating_sub(self.output.len());
        if text.len() <= room {
            self.output.push_str(text);
            return;
        }

        let mut end = room;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        self.output.push_str(&text[..end]);
        if !self.output_truncated {
            debug!(limit = self.settings.max_output_bytes, "Program output truncated");
        }
        self.output_truncated = true;
    }
}

impl Drop for DapSession {
    fn drop(&mut self) {
        if !self.released {
            // Broker and process drops abort the tasks and kill the adapter
            warn!(language = %self.config.language, "Session dropped without terminate");
        }
    }
}

fn check_success(response: Response) -> Result<Response> {
    if response.success {
        Ok(response)
    } else {
        Err(Error::RequestFailed {
            message: response
                .message
                .clone()
                .unwrap_or_else(|| "unknown error".to_string()),
            command: response.command,
        })
    }
}
