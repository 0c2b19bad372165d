//! dapshot DAP - Debug Adapter Protocol client engine
//!
//! Drives an external debug adapter through one fixed lifecycle: initialize,
//! set a breakpoint, launch, wait for the stop, read the stack, evaluate one
//! expression, tear everything down.
//!
//! # Architecture
//!
//! - [`codec`] frames messages with `Content-Length` headers
//! - [`DapBroker`] is an actor that owns the write half, correlates responses
//!   by `request_seq` and forwards events in order
//! - [`DapSession`] is the state machine for one invocation
//! - [`AdapterRegistry`] maps languages to adapter configs and launchers
//! - [`DebugOrchestrator`] is the `debug(...)` entry point that always
//!   returns a [`DebugResult`]

pub mod adapter;
pub mod broker;
pub mod codec;
pub mod constants;
pub mod error;
pub mod ext;
pub mod orchestrator;
pub mod protocol;
pub mod registry;
pub mod session;

pub use adapter::{
    builtin_config, validate, AdapterConfig, AdapterConnection, AdapterProcess, ConfigError,
    ProcessLauncher, RequestKind, TransportKind,
};
pub use broker::{DapBroker, EventReceiver, PendingResponse};
pub use error::{Error, Result};
pub use ext::LogErr;
pub use orchestrator::{DebugOrchestrator, DebugRequest};
pub use protocol::*;
pub use registry::{validate_environment, AdapterEntry, AdapterInfo, AdapterLauncher, AdapterRegistry};
pub use session::{DapSession, SessionState, StopInfo};

// Re-export the result types callers match on
pub use dapshot_core::{DebugError, DebugResult, ErrorKind, Language};
