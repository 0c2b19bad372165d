//! Connection Management
//!
//! Spawns the adapter and produces the byte streams the broker runs on:
//! stdio pipes, or a TCP connection established with retry and backoff.

use super::config::{AdapterConfig, TransportKind};
use super::process::AdapterProcess;
use crate::registry::AdapterLauncher;
use crate::{Error, Result};
use async_trait::async_trait;
use dapshot_config::SessionConfig;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{info, trace, warn};

/// Read and write halves of a live adapter channel, plus the process behind it
pub struct AdapterConnection {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub writer: Box<dyn AsyncWrite + Send + Unpin>,
    /// `None` when nothing was spawned (in-process fakes, external servers)
    pub process: Option<AdapterProcess>,
}

impl AdapterConnection {
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            process: None,
        }
    }

    pub fn with_process(mut self, process: AdapterProcess) -> Self {
        self.process = Some(process);
        self
    }
}

impl std::fmt::Debug for AdapterConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterConnection")
            .field("process", &self.process)
            .finish_non_exhaustive()
    }
}

/// Launches real adapter processes per their [`AdapterConfig`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

#[async_trait]
impl AdapterLauncher for ProcessLauncher {
    async fn launch(
        &self,
        config: &AdapterConfig,
        settings: &SessionConfig,
    ) -> Result<AdapterConnection> {
        match config.transport {
            TransportKind::Stdio => launch_stdio(config),
            TransportKind::Tcp => launch_tcp(config, settings).await,
        }
    }
}

fn base_command(config: &AdapterConfig) -> Command {
    let mut cmd = Command::new(&config.command);
    cmd.args(config.substitute_port()).kill_on_drop(true);
    if let Some(cwd) = &config.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &config.env {
        cmd.env(key, value);
    }
    cmd
}

fn spawn(mut cmd: Command, config: &AdapterConfig) -> Result<Child> {
    info!(language = %config.language, "Launching adapter: {}", config.command_line());
    cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            Error::AdapterNotFound(format!("{}: {}", config.command, e))
        }
        _ => Error::AdapterStartup(format!("failed to spawn {}: {}", config.command, e)),
    })
}

/// Spawn the adapter with DAP on its stdin/stdout
fn launch_stdio(config: &AdapterConfig) -> Result<AdapterConnection> {
    let mut cmd = base_command(config);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = spawn(cmd, config)?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| Error::AdapterStartup("Failed to get adapter stdin".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::AdapterStartup("Failed to get adapter stdout".to_string()))?;

    Ok(AdapterConnection::new(stdout, stdin).with_process(AdapterProcess::new(child)))
}

/// Spawn the adapter in server mode and connect to it
async fn launch_tcp(config: &AdapterConfig, settings: &SessionConfig) -> Result<AdapterConnection> {
    let port = config
        .port
        .ok_or_else(|| Error::AdapterStartup("tcp adapter has no port".to_string()))?;

    let mut cmd = base_command(config);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // Start draining output before the first connect attempt
    let mut process = AdapterProcess::new(spawn(cmd, config)?);

    let stream = match connect_with_retry(&config.host, port, &mut process, settings).await {
        Ok(stream) => stream,
        Err(e) => {
            process.shutdown(Duration::ZERO).await;
            return Err(e);
        }
    };

    info!("Connected to adapter on {}:{}", config.host, port);
    let (reader, writer) = tokio::io::split(stream);
    Ok(AdapterConnection::new(reader, writer).with_process(process))
}

/// Connect to a TCP address with retry logic and exponential backoff
///
/// Uses exponential backoff with jitter:
/// - Starts with `retry_interval_ms`
/// - Doubles the interval on each retry, up to `max_retry_interval_ms`
/// - Adds random jitter (0..`retry_jitter_ms`)
///
/// Gives up when the startup deadline passes or the adapter process exits.
pub(crate) async fn connect_with_retry(
    host: &str,
    port: u16,
    process: &mut AdapterProcess,
    settings: &SessionConfig,
) -> Result<TcpStream> {
    use rand::Rng;

    let address = format!("{}:{}", host, port);
    let deadline = Instant::now() + settings.startup_timeout();
    let mut retry_interval_ms = settings.retry_interval_ms;
    let mut attempt = 0u32;

    loop {
        if let Some(status) = process.exit_status() {
            return Err(Error::AdapterStartup(format!(
                "adapter exited with {} before accepting connections on {}",
                status, address
            )));
        }

        match TcpStream::connect(&address).await {
            Ok(stream) => {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("Failed to set TCP_NODELAY: {}", e);
                }
                return Ok(stream);
            }
            Err(e) => {
                attempt += 1;

                if Instant::now() >= deadline {
                    return Err(Error::AdapterStartup(format!(
                        "no adapter listening on {} after {} attempts in {}ms: {}",
                        address, attempt, settings.startup_timeout_ms, e
                    )));
                }

                let jitter_ms = if settings.retry_jitter_ms > 0 {
                    rand::rng().random_range(0..settings.retry_jitter_ms)
                } else {
                    0
                };
                let wait = Duration::from_millis(retry_interval_ms.saturating_add(jitter_ms));

                trace!(
                    "Connection attempt {} failed, retrying in {:?} (backoff: {}ms + jitter: {}ms)",
                    attempt,
                    wait,
                    retry_interval_ms,
                    jitter_ms
                );

                tokio::time::sleep_until((Instant::now() + wait).min(deadline)).await;

                retry_interval_ms = retry_interval_ms
                    .saturating_mul(2)
                    .min(settings.max_retry_interval_ms);
            }
        }
    }
}
