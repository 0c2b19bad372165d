//! Default constants for dapshot configuration
//!
//! Single source of truth for default values. Everything that is
//! configurable has its default here.

// ============================================================================
// HOSTS
// ============================================================================

/// Host debug adapters listen on in TCP mode (localhost only)
pub const DEFAULT_ADAPTER_HOST: &str = "127.0.0.1";

// ============================================================================
// ENVIRONMENT VARIABLES
// ============================================================================

/// Config file path override
pub const ENV_DAPSHOT_CONFIG: &str = "DAPSHOT_CONFIG";

// ============================================================================
// TIMEOUTS (milliseconds)
// ============================================================================

/// Per-request response timeout
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// How long to wait for a `stopped` event after configurationDone
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 30_000;

/// Deadline for a TCP adapter to start accepting connections
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 10_000;

/// Bound on the `disconnect` request sent during teardown
pub const DEFAULT_DISCONNECT_TIMEOUT_MS: u64 = 2_000;

/// Wait for the adapter to exit on its own after disconnect, before killing it
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2_000;

/// Global deadline over one whole debug invocation
pub const DEFAULT_INVOCATION_TIMEOUT_MS: u64 = 60_000;

// ============================================================================
// RETRY / BACKOFF
// ============================================================================

/// Initial interval between TCP connection attempts
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 50;

/// Cap on the exponential backoff interval
pub const DEFAULT_MAX_RETRY_INTERVAL_MS: u64 = 1_000;

/// Upper bound of the random jitter added to each backoff step
pub const DEFAULT_RETRY_JITTER_MS: u64 = 25;

// ============================================================================
// LIMITS
// ============================================================================

/// Frames requested from `stackTrace`
pub const DEFAULT_STACK_TRACE_LEVELS: u32 = 20;

/// Maximum bytes of program output kept for the result
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024;

// ============================================================================
// DAP
// ============================================================================

/// `context` sent with `evaluate` requests
pub const DEFAULT_EVALUATE_CONTEXT: &str = "repl";

/// `clientID` sent with `initialize`
pub const DAP_CLIENT_ID: &str = "dapshot";

/// `clientName` sent with `initialize`
pub const DAP_CLIENT_NAME: &str = "dapshot";

/// `locale` sent with `initialize`
pub const DAP_LOCALE: &str = "en-US";
