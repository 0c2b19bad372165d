//! Built-in adapter table
//!
//! One entry per language we can debug out of the box. Languages that are
//! only detected (ruby, php, perl, lua, shell) and Java (JDWP, not DAP)
//! have no entry.

use super::config::AdapterConfig;
use dapshot_core::Language;

/// debugpy adapter port
pub const DEBUGPY_PORT: u16 = 5678;
/// js-debug DAP server port
pub const JS_DEBUG_PORT: u16 = 8123;
/// Delve DAP server port
pub const DELVE_PORT: u16 = 38697;

/// Built-in configuration for a language, if one exists
pub fn builtin_config(language: Language) -> Option<AdapterConfig> {
    let config = match language {
        Language::Python => AdapterConfig::new(language, "python3", "debugpy")
            .args(["-m", "debugpy.adapter", "--host", "127.0.0.1", "--port", "{port}"])
            .tcp(DEBUGPY_PORT)
            .extension(".py")
            .deferred_launch_response(),
        Language::CSharp => dotnet(language, ".cs"),
        Language::FSharp => dotnet(language, ".fs"),
        Language::VbNet => dotnet(language, ".vb"),
        Language::JavaScript => js_debug(language)
            .extension(".js")
            .extension(".mjs")
            .extension(".cjs"),
        Language::TypeScript => js_debug(language).extension(".ts").extension(".mts"),
        Language::Go => AdapterConfig::new(language, "dlv", "go")
            .args(["dap", "--listen", "127.0.0.1:{port}"])
            .tcp(DELVE_PORT)
            .extension(".go"),
        Language::Rust => AdapterConfig::new(language, "rust-gdb", "gdb")
            .arg("--interpreter=dap")
            .extension(".rs"),
        Language::C => AdapterConfig::new(language, "gdb", "gdb")
            .arg("--interpreter=dap")
            .extension(".c"),
        Language::Cpp => AdapterConfig::new(language, "gdb", "gdb")
            .arg("--interpreter=dap")
            .extension(".cpp")
            .extension(".cc")
            .extension(".cxx"),
        Language::Java
        | Language::Ruby
        | Language::Php
        | Language::Perl
        | Language::Lua
        | Language::Shell => return None,
    };
    Some(config)
}

/// Every built-in configuration
pub fn builtin_configs() -> Vec<AdapterConfig> {
    Language::ALL
        .iter()
        .filter_map(|language| builtin_config(*language))
        .collect()
}

fn dotnet(language: Language, extension: &str) -> AdapterConfig {
    AdapterConfig::new(language, "netcoredbg", "coreclr")
        .arg("--interpreter=vscode")
        .extension(extension)
}

fn js_debug(language: Language) -> AdapterConfig {
    AdapterConfig::new(language, "js-debug-adapter", "pwa-node")
        .args(["{port}", "127.0.0.1"])
        .tcp(JS_DEBUG_PORT)
}
