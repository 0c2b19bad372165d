//! Debug Orchestrator - the one-shot `debug()` entry point
//!
//! Resolves the adapter for a file, drives a fresh [`DapSession`] through
//! the whole lifecycle, always tears it down, and folds the outcome into a
//! [`DebugResult`]. Environment and target-program failures never escape as
//! errors; they become `success: false` results.

use crate::adapter::{build_launch_arguments, validate, AdapterConfig};
use crate::registry::{AdapterEntry, AdapterRegistry};
use crate::session::{DapSession, StopInfo};
use crate::{Breakpoint, DapStackFrame, Error, EvaluateResponseBody, Result};
use dapshot_config::SessionConfig;
use dapshot_core::{DebugError, DebugResult, Language, LanguageDetector};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Inputs of one debug invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugRequest {
    pub file: PathBuf,
    pub line: u32,
    pub expression: String,
    pub args: Vec<String>,
    /// Explicit language override (accepts aliases like "c#" or "golang")
    pub language: Option<String>,
    /// Omit the human-readable summary from the result output
    pub quiet: bool,
}

impl DebugRequest {
    pub fn new(file: impl Into<PathBuf>, line: u32, expression: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            expression: expression.into(),
            args: Vec::new(),
            language: None,
            quiet: false,
        }
    }

    /// Arguments passed to the debuggee
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

/// Everything the lifecycle produced on success
struct Outcome {
    breakpoint: Option<Breakpoint>,
    stop: StopInfo,
    frame: DapStackFrame,
    value: EvaluateResponseBody,
}

/// Drives debug invocations against registered adapters
#[derive(Debug, Clone)]
pub struct DebugOrchestrator {
    registry: Arc<AdapterRegistry>,
    detector: LanguageDetector,
    settings: SessionConfig,
}

impl DebugOrchestrator {
    pub fn new(registry: Arc<AdapterRegistry>, settings: SessionConfig) -> Self {
        Self {
            registry,
            detector: LanguageDetector::new(),
            settings,
        }
    }

    /// Orchestrator over the built-in adapter table
    pub fn with_builtin_adapters(settings: SessionConfig) -> Self {
        Self::new(Arc::new(AdapterRegistry::with_builtin()), settings)
    }

    /// Replace the language detector
    pub fn with_detector(mut self, detector: LanguageDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn registry(&self) -> &Arc<AdapterRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &SessionConfig {
        &self.settings
    }

    /// `debug(file, line, expression, args?, language?)`
    pub async fn debug_file(
        &self,
        file: impl AsRef<Path>,
        line: u32,
        expression: &str,
        args: Option<Vec<String>>,
        language: Option<&str>,
    ) -> DebugResult {
        let mut request = DebugRequest::new(file.as_ref(), line, expression)
            .args(args.unwrap_or_default());
        request.language = language.map(str::to_string);
        self.debug(request).await
    }

    /// Run one invocation. Produces exactly one result and never panics
    /// on adapter or program failures.
    pub async fn debug(&self, request: DebugRequest) -> DebugResult {
        let span = info_span!(
            "debug",
            file = %request.file.display(),
            line = request.line,
            language = tracing::field::Empty,
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, mut request: DebugRequest) -> DebugResult {
        let started = Instant::now();

        let (language, entry) = match self.resolve(&request) {
            Ok(resolved) => resolved,
            Err((language, err)) => return failure(language, err),
        };
        tracing::Span::current().record("language", language.as_str());
        let config = entry.config;

        // Adapters resolve breakpoints against absolute paths
        if let Ok(absolute) = request.file.canonicalize() {
            request.file = absolute;
        }

        let launch_args = match build_launch_arguments(&config, &request.file, &request.args) {
            Ok(args) => args,
            Err(e) => return failure(Some(language), e.into()),
        };

        let deadline = tokio::time::Instant::now() + self.settings.invocation_timeout();
        let deadline_exceeded = || Error::DeadlineExceeded(self.settings.invocation_timeout_ms);

        let connection = match tokio::time::timeout_at(
            deadline,
            entry.launcher.launch(&config, &self.settings),
        )
        .await
        {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => return failure(Some(language), e),
            Err(_) => return failure(Some(language), deadline_exceeded()),
        };

        let mut session = DapSession::new(connection, config.clone(), self.settings.clone());
        let outcome = match tokio::time::timeout_at(
            deadline,
            self.drive(&mut session, &request, launch_args),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(deadline_exceeded()),
        };

        // Every path, including the deadline, ends here
        session.terminate().await;
        let output = session.drain_output().to_string();

        let duration_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(outcome) => {
                info!(duration_ms, result = %outcome.value.result, "Debug invocation succeeded");
                success(language, &config, &request, outcome, output, duration_ms)
            }
            Err(e) => {
                warn!(duration_ms, kind = %e.kind(), "Debug invocation failed: {}", e);
                failure(Some(language), e)
                    .with_output(output)
                    .with_metadata("adapter_command", config.command_line())
                    .with_metadata("duration_ms", duration_ms)
            }
        }
    }

    /// Registered adapter extensions first, then the detector's table and shebang
    fn detect_language(&self, file: &Path) -> dapshot_core::Result<Language> {
        if let Some(language) = self.registry.language_for_file(file) {
            debug!(file = %file.display(), %language, "Language matched a registered adapter");
            return Ok(language);
        }
        self.detector.detect(file)
    }

    /// File check, language, adapter lookup and pre-flight validation
    fn resolve(
        &self,
        request: &DebugRequest,
    ) -> std::result::Result<(Language, AdapterEntry), (Option<Language>, Error)> {
        if !request.file.is_file() {
            return Err((None, Error::SourceNotFound(request.file.clone())));
        }

        let language = match &request.language {
            Some(name) => name.parse::<Language>().map_err(|e| {
                (None, Error::Core(dapshot_core::Error::InvalidLanguage(e)))
            })?,
            None => self.detect_language(&request.file).map_err(|e| (None, Error::Core(e)))?,
        };

        let entry = self.registry.lookup(language).ok_or_else(|| {
            (
                Some(language),
                Error::AdapterNotFound(format!("no adapter registered for {}", language)),
            )
        })?;

        validate(&entry.config).map_err(|e| (Some(language), e.into()))?;
        entry
            .launcher
            .validate_environment(&entry.config)
            .map_err(|e| (Some(language), e))?;

        Ok((language, entry))
    }

    async fn drive(
        &self,
        session: &mut DapSession,
        request: &DebugRequest,
        launch_args: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Outcome> {
        session.initialize().await?;

        let breakpoints = session
            .set_breakpoints(&request.file, &[request.line])
            .await?;
        let breakpoint = breakpoints.into_iter().next();
        if let Some(bp) = breakpoint.as_ref().filter(|bp| !bp.verified) {
            info!(message = ?bp.message, "Breakpoint not verified yet; continuing");
        }

        session.launch(launch_args).await?;
        session.configuration_done().await?;

        let stop = session.wait_for_stop(self.settings.stop_timeout()).await?;
        let frames = session.stack_trace(stop.thread_id).await?;
        let frame = frames
            .into_iter()
            .next()
            .ok_or_else(|| Error::Protocol("stackTrace returned no frames".to_string()))?;

        let value = session
            .evaluate(&request.expression, Some(frame.id))
            .await?;

        Ok(Outcome {
            breakpoint,
            stop,
            frame,
            value,
        })
    }
}

fn failure(language: Option<Language>, err: Error) -> DebugResult {
    let language = language.map(|l| l.as_str()).unwrap_or("unknown");
    DebugResult::failure(language, DebugError::new(err.kind(), err.to_string()))
}

fn success(
    language: Language,
    config: &AdapterConfig,
    request: &DebugRequest,
    outcome: Outcome,
    mut output: String,
    duration_ms: u64,
) -> DebugResult {
    let Outcome {
        breakpoint,
        stop,
        frame,
        value,
    } = outcome;

    if !request.quiet {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&format!(
            "Expression: {}\nResult: {}\n",
            request.expression, value.result
        ));
        if let Some(ty) = &value.result_type {
            output.push_str(&format!("Type: {}\n", ty));
        }
    }

    let mut result = DebugResult::success(language.as_str(), value.result)
        .with_output(output)
        .with_metadata("thread_id", stop.thread_id)
        .with_metadata("frame_id", frame.id)
        .with_metadata("frame_name", frame.name)
        .with_metadata("frame_line", frame.line)
        .with_metadata("stop_reason", stop.reason)
        .with_metadata("adapter_command", config.command_line())
        .with_metadata("duration_ms", duration_ms);

    if let Some(ty) = value.result_type {
        result = result.with_metadata("type", ty);
    }
    if let Some(bp) = breakpoint {
        result = result
            .with_metadata("breakpoint_verified", bp.verified)
            .with_metadata("breakpoint_line", bp.line.unwrap_or(request.line));
    }
    result
}
