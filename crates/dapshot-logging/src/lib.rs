//! Process-wide `tracing` setup for dapshot
//!
//! The debug engine only emits events; whoever embeds it decides where they
//! go. Binaries call [`init`] once, tests and libraries use [`try_init`] or
//! [`init_test`], which never panic when a subscriber already exists.
//!
//! ```rust,ignore
//! use dapshot_logging::{init, LogConfig, LogOutput};
//!
//! // Result JSON on stdout, diagnostics on stderr
//! init(LogConfig::cli(verbose));
//!
//! // Only warnings, e.g. when embedded in another tool
//! let installed = dapshot_logging::try_init(LogConfig::quiet());
//! ```
//!
//! `RUST_LOG` replaces `default_level` unless `debug` is set, e.g.
//! `RUST_LOG=dapshot_dap::broker=trace` to see every frame.

use std::io::IsTerminal;
use tracing_subscriber::fmt::time::{LocalTime, UtcTime};
use tracing_subscriber::{fmt, EnvFilter};

/// Where formatted events are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogOutput {
    #[default]
    Stdout,
    /// Keeps stdout free for results
    Stderr,
}

impl LogOutput {
    fn is_terminal(self) -> bool {
        match self {
            LogOutput::Stdout => std::io::stdout().is_terminal(),
            LogOutput::Stderr => std::io::stderr().is_terminal(),
        }
    }
}

/// Timezone of the RFC 3339 timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    #[default]
    Local,
    Utc,
}

/// Subscriber settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Force `debug` level, ignoring `RUST_LOG`
    pub debug: bool,
    /// Filter directive used when `RUST_LOG` is unset
    pub default_level: String,
    pub output: LogOutput,
    /// Print the module path of each event
    pub show_target: bool,
    pub timestamp_format: TimestampFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            default_level: "info".to_string(),
            output: LogOutput::Stdout,
            show_target: false,
            timestamp_format: TimestampFormat::Local,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn default_level(mut self, directive: impl Into<String>) -> Self {
        self.default_level = directive.into();
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn utc(self) -> Self {
        self.timestamp_format(TimestampFormat::Utc)
    }

    /// Command-line use: logs on stderr, `verbose` switches to debug level
    pub fn cli(verbose: bool) -> Self {
        Self::new().debug(verbose).output(LogOutput::Stderr)
    }

    /// Warnings and errors only, on stderr
    pub fn quiet() -> Self {
        Self::new().default_level("warn").output(LogOutput::Stderr)
    }

    /// Debug level with module targets, on stderr
    pub fn test() -> Self {
        Self::new()
            .default_level("debug")
            .output(LogOutput::Stderr)
            .show_target(true)
    }

    fn filter(&self) -> EnvFilter {
        if self.debug {
            return EnvFilter::new("debug");
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_level))
    }
}

// The writer and timer change the builder's type, so each combination is
// spelled out and finished with `$finish` (`init` or `try_init`).
macro_rules! install {
    ($config:expr, $finish:ident) => {{
        let config = &$config;
        let builder = fmt()
            .with_env_filter(config.filter())
            .with_target(config.show_target)
            .with_ansi(config.output.is_terminal());
        match (config.output, config.timestamp_format) {
            (LogOutput::Stdout, TimestampFormat::Local) => {
                builder.with_timer(LocalTime::rfc_3339()).$finish()
            }
            (LogOutput::Stdout, TimestampFormat::Utc) => {
                builder.with_timer(UtcTime::rfc_3339()).$finish()
            }
            (LogOutput::Stderr, TimestampFormat::Local) => builder
                .with_writer(std::io::stderr)
                .with_timer(LocalTime::rfc_3339())
                .$finish(),
            (LogOutput::Stderr, TimestampFormat::Utc) => builder
                .with_writer(std::io::stderr)
                .with_timer(UtcTime::rfc_3339())
                .$finish(),
        }
    }};
}

/// Install the global subscriber.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init(config: LogConfig) {
    install!(config, init)
}

/// Install the global subscriber unless one exists; returns whether it did
pub fn try_init(config: LogConfig) -> bool {
    install!(config, try_init).is_ok()
}

/// [`LogConfig::test`] through [`try_init`]; call at the top of any test
pub fn init_test() {
    let _ = try_init(LogConfig::test());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = LogConfig::new()
            .debug(true)
            .default_level("warn")
            .output(LogOutput::Stderr)
            .show_target(true)
            .utc();

        assert!(config.debug);
        assert_eq!(config.default_level, "warn");
        assert_eq!(config.output, LogOutput::Stderr);
        assert!(config.show_target);
        assert_eq!(config.timestamp_format, TimestampFormat::Utc);
    }

    #[test]
    fn test_presets_keep_stdout_free() {
        assert_eq!(LogConfig::cli(false).output, LogOutput::Stderr);
        assert!(LogConfig::cli(true).debug);
        assert_eq!(LogConfig::quiet().default_level, "warn");
        assert_eq!(LogConfig::test().output, LogOutput::Stderr);
        assert_eq!(LogConfig::default().output, LogOutput::Stdout);
    }

    #[test]
    fn test_debug_flag_overrides_default_level() {
        let config = LogConfig::new().default_level("warn").debug(true);
        let filter = format!("{:?}", config.filter()).to_lowercase();
        assert!(filter.contains("debug"), "filter: {}", filter);
    }

    #[test]
    fn test_second_install_is_refused() {
        init_test();
        assert!(!try_init(LogConfig::test()));
    }
}
