//! Tests for adapter configuration

use super::builtin::{builtin_config, builtin_configs};
use super::config::{validate, AdapterConfig, ConfigError, RequestKind, TransportKind};
use dapshot_core::Language;
use std::path::Path;

#[test]
fn test_adapter_config_builder() {
    let config = AdapterConfig::new(Language::Python, "python3", "debugpy")
        .arg("-m")
        .arg("debugpy.adapter")
        .arg("--port")
        .arg("{port}")
        .tcp(5678)
        .cwd("/app")
        .env("PYTHONPATH", "/app/src")
        .extension(".py");

    assert_eq!(config.language, Language::Python);
    assert_eq!(config.command, "python3");
    assert_eq!(config.args.len(), 4);
    assert_eq!(config.transport, TransportKind::Tcp);
    assert_eq!(config.port, Some(5678));
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.cwd, Some("/app".to_string()));
    assert_eq!(config.env.len(), 1);
    assert_eq!(config.request, RequestKind::Launch);
}

#[test]
fn test_adapter_config_port_substitution() {
    let config = AdapterConfig::new(Language::Go, "dlv", "go")
        .arg("--listen")
        .arg("127.0.0.1:{port}")
        .arg("--port")
        .arg("{port}")
        .port(5678);

    let args = config.substitute_port();
    assert_eq!(args, vec!["--listen", "127.0.0.1:5678", "--port", "5678"]);
    assert_eq!(
        config.command_line(),
        "dlv --listen 127.0.0.1:5678 --port 5678"
    );
}

#[test]
fn test_adapter_config_no_port() {
    let config = AdapterConfig::new(Language::Go, "dlv", "go")
        .arg("--listen")
        .arg("127.0.0.1:{port}");

    let args = config.substitute_port();
    assert_eq!(args, vec!["--listen", "127.0.0.1:{port}"]);
}

#[test]
fn test_validate_accepts_builtins() {
    let configs = builtin_configs();
    assert!(!configs.is_empty());
    for config in configs {
        assert_eq!(validate(&config), Ok(()), "{}", config.language);
    }
}

#[test]
fn test_validate_rejects_empty_command() {
    let config = AdapterConfig::new(Language::Python, "  ", "debugpy");
    assert_eq!(validate(&config), Err(ConfigError::EmptyCommand));
}

#[test]
fn test_validate_tcp_requires_port() {
    let mut config = AdapterConfig::new(Language::Go, "dlv", "go");
    config.transport = TransportKind::Tcp;
    assert_eq!(validate(&config), Err(ConfigError::MissingPort));

    config.port = Some(0);
    assert_eq!(validate(&config), Err(ConfigError::MissingPort));

    config.port = Some(38697);
    assert_eq!(validate(&config), Ok(()));
}

#[test]
fn test_validate_stdio_ignores_port() {
    let config = AdapterConfig::new(Language::CSharp, "netcoredbg", "coreclr");
    assert_eq!(config.port, None);
    assert_eq!(validate(&config), Ok(()));
}

#[test]
fn test_validate_extension_needs_dot() {
    let config = AdapterConfig::new(Language::Go, "dlv", "go").extension("go");
    assert_eq!(
        validate(&config),
        Err(ConfigError::InvalidExtension("go".to_string()))
    );
}

#[test]
fn test_validate_empty_adapter_type() {
    let config = AdapterConfig::new(Language::Go, "dlv", "");
    assert_eq!(validate(&config), Err(ConfigError::EmptyAdapterType));
}

#[test]
fn test_builtin_table() {
    let python = builtin_config(Language::Python).unwrap();
    assert_eq!(python.transport, TransportKind::Tcp);
    assert!(python.deferred_launch_response);

    let csharp = builtin_config(Language::CSharp).unwrap();
    assert_eq!(csharp.command, "netcoredbg");
    assert_eq!(csharp.adapter_type, "coreclr");
    assert_eq!(csharp.transport, TransportKind::Stdio);

    assert!(builtin_config(Language::Java).is_none());
    assert!(builtin_config(Language::Ruby).is_none());
}

#[test]
fn test_config_deserializes_with_defaults() {
    let config: AdapterConfig = serde_json::from_str(
        r#"{"language": "go", "command": "dlv", "adapter_type": "go", "transport": "tcp", "port": 4000}"#,
    )
    .unwrap();
    assert_eq!(config.transport, TransportKind::Tcp);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.request, RequestKind::Launch);
    assert!(config.launch_arguments.is_empty());
}

#[test]
fn test_supports_file_matches_extensions_case_insensitively() {
    let config = AdapterConfig::new(Language::Python, "python3", "debugpy")
        .extension(".py")
        .extension(".pyw");

    assert!(config.supports_file(Path::new("/work/app.py")));
    assert!(config.supports_file(Path::new("/work/GUI.PYW")));
    assert!(!config.supports_file(Path::new("/work/app.pyc")));
    assert!(!config.supports_file(Path::new("/work/Makefile")));
}
