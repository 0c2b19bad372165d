//! Debug session timing and limits
//!
//! Every timeout the protocol engine uses lives here so callers (and tests)
//! can tighten or relax them without touching code.

use crate::constants::{
    DEFAULT_DISCONNECT_TIMEOUT_MS, DEFAULT_EVALUATE_CONTEXT, DEFAULT_INVOCATION_TIMEOUT_MS,
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_MAX_RETRY_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_RETRY_INTERVAL_MS, DEFAULT_RETRY_JITTER_MS, DEFAULT_SHUTDOWN_GRACE_MS,
    DEFAULT_STACK_TRACE_LEVELS, DEFAULT_STARTUP_TIMEOUT_MS, DEFAULT_STOP_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Session Config
// ============================================================================

/// Debug session configuration (`[session]` table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Timeout for each DAP request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How long `wait_for_stop` waits for the breakpoint
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    /// Deadline for a TCP adapter to accept a connection
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
    /// Initial retry interval when connecting
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Cap for the exponential backoff
    #[serde(default = "default_max_retry_interval_ms")]
    pub max_retry_interval_ms: u64,
    /// Random jitter added to each retry (0..jitter)
    #[serde(default = "default_retry_jitter_ms")]
    pub retry_jitter_ms: u64,
    /// Bound on the `disconnect` request during teardown
    #[serde(default = "default_disconnect_timeout_ms")]
    pub disconnect_timeout_ms: u64,
    /// Grace period for the adapter to exit before it is killed
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    /// Global deadline for one invocation
    #[serde(default = "default_invocation_timeout_ms")]
    pub invocation_timeout_ms: u64,
    /// Frames requested from `stackTrace`
    #[serde(default = "default_stack_trace_levels")]
    pub stack_trace_levels: u32,
    /// `context` argument of `evaluate` ("repl", "watch", "hover")
    #[serde(default = "default_evaluate_context")]
    pub evaluate_context: String,
    /// Maximum captured program output kept in the result
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_stop_timeout_ms() -> u64 {
    DEFAULT_STOP_TIMEOUT_MS
}

fn default_startup_timeout_ms() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_MS
}

fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL_MS
}

fn default_max_retry_interval_ms() -> u64 {
    DEFAULT_MAX_RETRY_INTERVAL_MS
}

fn default_retry_jitter_ms() -> u64 {
    DEFAULT_RETRY_JITTER_MS
}

fn default_disconnect_timeout_ms() -> u64 {
    DEFAULT_DISCONNECT_TIMEOUT_MS
}

fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}

fn default_invocation_timeout_ms() -> u64 {
    DEFAULT_INVOCATION_TIMEOUT_MS
}

fn default_stack_trace_levels() -> u32 {
    DEFAULT_STACK_TRACE_LEVELS
}

fn default_evaluate_context() -> String {
    DEFAULT_EVALUATE_CONTEXT.to_string()
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            request_timeout_ms: default_request_timeout_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
            startup_timeout_ms: default_startup_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            max_retry_interval_ms: default_max_retry_interval_ms(),
            retry_jitter_ms: default_retry_jitter_ms(),
            disconnect_timeout_ms: default_disconnect_timeout_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            invocation_timeout_ms: default_invocation_timeout_ms(),
            stack_trace_levels: default_stack_trace_levels(),
            evaluate_context: default_evaluate_context(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

impl SessionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn disconnect_timeout(&self) -> Duration {
        Duration::from_millis(self.disconnect_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_millis(self.invocation_timeout_ms)
    }

    /// Set the per-request timeout
    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    /// Set the stop-wait timeout
    pub fn with_stop_timeout_ms(mut self, ms: u64) -> Self {
        self.stop_timeout_ms = ms;
        self
    }

    /// Set the TCP startup deadline
    pub fn with_startup_timeout_ms(mut self, ms: u64) -> Self {
        self.startup_timeout_ms = ms;
        self
    }

    /// Set the global invocation deadline
    pub fn with_invocation_timeout_ms(mut self, ms: u64) -> Self {
        self.invocation_timeout_ms = ms;
        self
    }

    /// Set the teardown timings (disconnect bound and exit grace period)
    pub fn with_shutdown_timeouts_ms(mut self, disconnect_ms: u64, grace_ms: u64) -> Self {
        self.disconnect_timeout_ms = disconnect_ms;
        self.shutdown_grace_ms = grace_ms;
        self
    }

    /// Check internal constraints, returning every violation found
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let non_zero = [
            ("session.request_timeout_ms", self.request_timeout_ms),
            ("session.stop_timeout_ms", self.stop_timeout_ms),
            ("session.startup_timeout_ms", self.startup_timeout_ms),
            ("session.retry_interval_ms", self.retry_interval_ms),
            ("session.disconnect_timeout_ms", self.disconnect_timeout_ms),
            ("session.invocation_timeout_ms", self.invocation_timeout_ms),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                errors.push(format!("{} must be greater than 0", name));
            }
        }

        if self.retry_interval_ms > self.max_retry_interval_ms {
            errors.push(format!(
                "session.retry_interval_ms ({}) must not exceed session.max_retry_interval_ms ({})",
                self.retry_interval_ms, self.max_retry_interval_ms
            ));
        }

        if self.stack_trace_levels == 0 {
            errors.push("session.stack_trace_levels must be greater than 0".to_string());
        }

        if self.evaluate_context.trim().is_empty() {
            errors.push("session.evaluate_context must not be empty".to_string());
        }

        errors
    }
}
