//! Target language types and parsing utilities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language of the program being debugged.
///
/// The set is closed: adding a language means adding a variant here and a row
/// to the detector and adapter tables. Some variants are detection-only and
/// have no built-in debug adapter (`Ruby`, `Php`, `Perl`, `Lua`, `Shell`, `Java`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    CSharp,
    FSharp,
    VbNet,
    JavaScript,
    TypeScript,
    Go,
    Rust,
    Java,
    Cpp,
    C,
    Ruby,
    Php,
    Perl,
    Lua,
    Shell,
}

impl Language {
    /// Every known language, in declaration order
    pub const ALL: &'static [Language] = &[
        Self::Python,
        Self::CSharp,
        Self::FSharp,
        Self::VbNet,
        Self::JavaScript,
        Self::TypeScript,
        Self::Go,
        Self::Rust,
        Self::Java,
        Self::Cpp,
        Self::C,
        Self::Ruby,
        Self::Php,
        Self::Perl,
        Self::Lua,
        Self::Shell,
    ];

    /// Get the lowercase identifier used in results and config
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::CSharp => "csharp",
            Self::FSharp => "fsharp",
            Self::VbNet => "vbnet",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Perl => "perl",
            Self::Lua => "lua",
            Self::Shell => "shell",
        }
    }

    /// Get display name for the language
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::CSharp => "C#",
            Self::FSharp => "F#",
            Self::VbNet => "VB.NET",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Go => "Go",
            Self::Rust => "Rust",
            Self::Java => "Java",
            Self::Cpp => "C++",
            Self::C => "C",
            Self::Ruby => "Ruby",
            Self::Php => "PHP",
            Self::Perl => "Perl",
            Self::Lua => "Lua",
            Self::Shell => "Shell",
        }
    }

    /// True for the languages that run on the .NET runtime
    pub fn is_dotnet(&self) -> bool {
        matches!(self, Self::CSharp | Self::FSharp | Self::VbNet)
    }

    /// Determine language from a file extension, with or without the leading dot.
    ///
    /// Matching is case-insensitive. Returns `None` for unrecognized extensions.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        let language = match ext.as_str() {
            "py" | "pyw" | "pyi" => Self::Python,
            "cs" | "csx" => Self::CSharp,
            "fs" | "fsx" | "fsi" => Self::FSharp,
            "vb" => Self::VbNet,
            "js" | "mjs" | "cjs" | "jsx" => Self::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Self::TypeScript,
            "go" => Self::Go,
            "rs" => Self::Rust,
            "java" => Self::Java,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => Self::Cpp,
            "c" | "h" => Self::C,
            "rb" => Self::Ruby,
            "php" => Self::Php,
            "pl" | "pm" => Self::Perl,
            "lua" => Self::Lua,
            "sh" | "bash" | "zsh" => Self::Shell,
            _ => return None,
        };
        Some(language)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            "csharp" | "c#" | "cs" => Ok(Self::CSharp),
            "fsharp" | "f#" | "fs" => Ok(Self::FSharp),
            "vbnet" | "vb.net" | "vb" => Ok(Self::VbNet),
            "javascript" | "js" | "node" => Ok(Self::JavaScript),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "go" | "golang" => Ok(Self::Go),
            "rust" | "rs" => Ok(Self::Rust),
            "java" => Ok(Self::Java),
            "cpp" | "c++" => Ok(Self::Cpp),
            "c" => Ok(Self::C),
            "ruby" | "rb" => Ok(Self::Ruby),
            "php" => Ok(Self::Php),
            "perl" => Ok(Self::Perl),
            "lua" => Ok(Self::Lua),
            "shell" | "bash" | "sh" | "zsh" => Ok(Self::Shell),
            _ => Err(ParseLanguageError::new(s)),
        }
    }
}

impl TryFrom<&str> for Language {
    type Error = ParseLanguageError;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// Error type for language parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLanguageError {
    pub invalid_value: String,
}

impl ParseLanguageError {
    pub fn new(invalid_value: impl Into<String>) -> Self {
        Self {
            invalid_value: invalid_value.into(),
        }
    }
}

impl fmt::Display for ParseLanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let valid = Language::ALL
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "Invalid language '{}'. Valid options: {}",
            self.invalid_value, valid
        )
    }
}

impl std::error::Error for ParseLanguageError {}
