//! Error types for dapshot core domain

use crate::language::ParseLanguageError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Neither the extension table nor a shebang line identified the file
    #[error("Cannot detect language for file: {}", path.display())]
    LanguageUnknown { path: PathBuf },

    /// An explicit language override names no known language
    #[error(transparent)]
    InvalidLanguage(#[from] ParseLanguageError),
}
