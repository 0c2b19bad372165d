//! Language detection from file paths
//!
//! Detection order:
//! 1. File extension (static table, then any extensions added at runtime)
//! 2. Shebang on the first line (`#!/usr/bin/env python3`, `#!/bin/bash`)
//!
//! There are no content heuristics: a file that matches neither
//! rule yields [`Error::LanguageUnknown`].

use crate::error::{Error, Result};
use crate::language::Language;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, trace};

/// Upper bound on bytes read when looking for a shebang line
const SHEBANG_READ_LIMIT: u64 = 512;

/// Maps file paths to a [`Language`].
#[derive(Debug, Clone, Default)]
pub struct LanguageDetector {
    /// Extra extension mappings (lowercase, no leading dot); consulted before the static table
    extra_extensions: HashMap<String, Language>,
}

impl LanguageDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an additional extension to a language.
    ///
    /// Overrides the static table for that extension.
    pub fn with_extension(mut self, ext: impl AsRef<str>, language: Language) -> Self {
        let key = ext.as_ref().trim_start_matches('.').to_lowercase();
        self.extra_extensions.insert(key, language);
        self
    }

    /// Detect the language of `path`.
    pub fn detect(&self, path: &Path) -> Result<Language> {
        if let Some(language) = self.detect_by_extension(path) {
            debug!(path = %path.display(), %language, "Language detected from extension");
            return Ok(language);
        }

        if let Some(language) = self.detect_by_shebang(path) {
            debug!(path = %path.display(), %language, "Language detected from shebang");
            return Ok(language);
        }

        Err(Error::LanguageUnknown {
            path: path.to_path_buf(),
        })
    }

    /// Extension lookup only; never touches the filesystem
    pub fn detect_by_extension(&self, path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.extra_extensions
            .get(&ext)
            .copied()
            .or_else(|| Language::from_extension(&ext))
    }

    /// Read the first line of `path` and interpret it as a shebang.
    ///
    /// Unreadable or non-UTF-8 files simply have no shebang.
    pub fn detect_by_shebang(&self, path: &Path) -> Option<Language> {
        let file = File::open(path).ok()?;
        let mut reader = BufReader::new(file.take(SHEBANG_READ_LIMIT));
        let mut first_line = String::new();
        reader.read_line(&mut first_line).ok()?;
        parse_shebang(&first_line)
    }
}

/// Interpret a shebang line.
///
/// Handles `#!/path/interp args` and `#!/usr/bin/env [-S] interp args`;
/// trailing version suffixes are ignored (`python3.11` is `python`).
pub fn parse_shebang(line: &str) -> Option<Language> {
    let body = line.trim().strip_prefix("#!")?.trim();
    let mut parts = body.split_whitespace();
    let program = parts.next()?;

    let interpreter = if basename(program) == "env" {
        // Skip env flags (-S, -i) and VAR=value assignments
        parts.find(|p| !p.starts_with('-') && !p.contains('='))?
    } else {
        program
    };

    let name = basename(interpreter).trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
    trace!(interpreter, name, "Parsed shebang");

    match name {
        "python" | "pypy" => Some(Language::Python),
        "node" | "nodejs" => Some(Language::JavaScript),
        "ts-node" => Some(Language::TypeScript),
        "ruby" => Some(Language::Ruby),
        "perl" => Some(Language::Perl),
        "php" => Some(Language::Php),
        "lua" => Some(Language::Lua),
        "bash" | "sh" | "zsh" | "dash" | "ksh" => Some(Language::Shell),
        _ => None,
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
