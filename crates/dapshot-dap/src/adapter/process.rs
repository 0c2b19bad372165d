//! Adapter Process Lifecycle
//!
//! Owns the spawned adapter. The child is killed on drop, so an early
//! return or panic anywhere above still releases it.

use crate::constants::ADAPTER_STDERR_TARGET;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A spawned debug adapter process
pub struct AdapterProcess {
    child: Child,
    pid: Option<u32>,
    drain_tasks: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for AdapterProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterProcess")
            .field("pid", &self.pid)
            .field("drain_tasks", &self.drain_tasks.len())
            .finish()
    }
}

impl AdapterProcess {
    /// Wrap a spawned child. Its stderr (and stdout, if still attached) is
    /// drained continuously so the adapter never blocks on a full pipe.
    pub(crate) fn new(mut child: Child) -> Self {
        let pid = child.id();
        let mut drain_tasks = Vec::new();
        if let Some(stderr) = child.stderr.take() {
            drain_tasks.push(spawn_drain(stderr, "stderr"));
        }
        if let Some(stdout) = child.stdout.take() {
            drain_tasks.push(spawn_drain(stdout, "stdout"));
        }
        Self {
            child,
            pid,
            drain_tasks,
        }
    }

    /// OS process ID, if the process was running when spawned
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Check if adapter process is running
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Exit status, if the process has already exited
    pub fn exit_status(&mut self) -> Option<std::process::ExitStatus> {
        self.child.try_wait().ok().flatten()
    }

    /// Give the adapter `grace` to exit on its own, then kill it.
    ///
    /// Always reaps the child; never fails.
    pub async fn shutdown(&mut self, grace: Duration) {
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => debug!(pid = ?self.pid, %status, "Adapter exited"),
            Ok(Err(e)) => warn!(pid = ?self.pid, "Failed to wait for adapter: {}", e),
            Err(_) => {
                info!(pid = ?self.pid, grace_ms = grace.as_millis() as u64, "Adapter still running, killing");
                if let Err(e) = self.child.kill().await {
                    warn!(pid = ?self.pid, "Failed to kill adapter process: {}", e);
                }
            }
        }
        for task in self.drain_tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for AdapterProcess {
    fn drop(&mut self) {
        // Best-effort since we can't await in Drop
        let _ = self.child.start_kill();
        for task in &self.drain_tasks {
            task.abort();
        }
    }
}

fn spawn_drain<R>(stream: R, name: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        // Any encoding; closing the read end early kills the adapter with SIGPIPE
        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line);
                    debug!(target: ADAPTER_STDERR_TARGET, stream = name, "{}", text.trim_end());
                }
                Err(e) => {
                    debug!(target: ADAPTER_STDERR_TARGET, stream = name, "Drain stopped: {}", e);
                    break;
                }
            }
        }
    })
}
