//! dapshot core domain types
//!
//! Pure data and detection logic shared by the protocol engine:
//! - [`Language`] - closed set of target languages
//! - [`LanguageDetector`] - file path to language (extension, then shebang)
//! - [`DebugResult`] / [`DebugError`] / [`ErrorKind`] - the invocation outcome

pub mod detector;
pub mod error;
pub mod language;
pub mod result;

pub use detector::{parse_shebang, LanguageDetector};
pub use error::{Error, Result};
pub use language::{Language, ParseLanguageError};
pub use result::{DebugError, DebugResult, ErrorKind};
