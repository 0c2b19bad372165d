//! Protocol names and wire limits used by the client

/// Events the session reacts to
pub mod events {
    pub const OUTPUT: &str = "output";
    pub const STOPPED: &str = "stopped";
    pub const TERMINATED: &str = "terminated";
    pub const EXITED: &str = "exited";
}

/// Request commands the client sends
pub mod requests {
    pub const INITIALIZE: &str = "initialize";
    pub const LAUNCH: &str = "launch";
    pub const ATTACH: &str = "attach";
    pub const SET_BREAKPOINTS: &str = "setBreakpoints";
    pub const CONFIGURATION_DONE: &str = "configurationDone";
    pub const STACK_TRACE: &str = "stackTrace";
    pub const EVALUATE: &str = "evaluate";
    pub const CONTINUE: &str = "continue";
    pub const DISCONNECT: &str = "disconnect";
}

/// `reason` values of `stopped` that need special handling.
/// Any other reason counts as reaching the breakpoint.
pub mod stop_reasons {
    /// Launch paused before user code; continued automatically
    pub const ENTRY: &str = "entry";
    /// Raised before the target line; ends the wait
    pub const EXCEPTION: &str = "exception";
}

/// `output` categories left out of the captured program output
pub mod output_categories {
    pub const CONSOLE: &str = "console";
    pub const TELEMETRY: &str = "telemetry";
}

pub mod defaults {
    /// Thread used when a `stopped` event omits `threadId`.
    ///
    /// Every built-in adapter runs user code on thread 1.
    pub const THREAD_ID: i64 = 1;
}

/// Wire framing limits
pub mod framing {
    /// Header carrying the body length
    pub const CONTENT_LENGTH: &str = "Content-Length";
    /// Largest body accepted from an adapter
    pub const MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;
    /// Longest header line, terminator included
    pub const MAX_HEADER_LINE_LENGTH: usize = 8 * 1024;
    /// Capacity of the reader-to-broker channel
    pub const INCOMING_CHANNEL_CAPACITY: usize = 256;
}

/// Log target for drained adapter stderr
pub const ADAPTER_STDERR_TARGET: &str = "dapshot::adapter_stderr";
