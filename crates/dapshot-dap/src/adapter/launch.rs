//! Launch/attach envelope construction
//!
//! Builds `{type, name, request, ...}` for the target file. Every failure
//! here happens before an adapter process is spawned.

use super::config::{AdapterConfig, ConfigError, RequestKind};
use dapshot_core::Language;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

const DOTNET_PROJECT_EXTENSIONS: &[&str] = &["csproj", "fsproj", "vbproj"];
const DOTNET_CONFIGURATIONS: &[&str] = &["Debug", "Release"];

/// Build the arguments of the `launch` (or `attach`) request
pub fn build_launch_arguments(
    config: &AdapterConfig,
    file: &Path,
    args: &[String],
) -> Result<Map<String, Value>, ConfigError> {
    let mut envelope = Map::new();
    envelope.insert("type".into(), json!(config.adapter_type));
    envelope.insert(
        "name".into(),
        json!(format!("dapshot - {}", config.language.as_str())),
    );
    envelope.insert("request".into(), json!(config.request.command()));

    if config.request == RequestKind::Launch {
        let fields = launch_fields(config.language, file, args)?;
        envelope.extend(fields);
    }

    for (key, value) in &config.launch_arguments {
        envelope.insert(key.clone(), value.clone());
    }

    debug!(language = %config.language, request = config.request.command(), "Built launch arguments");
    Ok(envelope)
}

fn launch_fields(
    language: Language,
    file: &Path,
    args: &[String],
) -> Result<Map<String, Value>, ConfigError> {
    let program = path_string(file);
    let cwd = file.parent().map(path_string).unwrap_or_default();

    let fields = match language {
        Language::Python => json!({
            "program": program,
            "args": args,
            "cwd": cwd,
            "console": "internalConsole",
            "stopOnEntry": false,
            "justMyCode": true,
        }),
        Language::CSharp | Language::FSharp | Language::VbNet => {
            let dll = find_dotnet_dll(file)?;
            json!({
                "program": path_string(&dll),
                "args": args,
                "cwd": cwd,
                "console": "internalConsole",
                "stopAtEntry": false,
            })
        }
        Language::JavaScript => json!({
            "program": program,
            "args": args,
            "cwd": cwd,
            "runtimeExecutable": "node",
            "console": "internalConsole",
        }),
        Language::TypeScript => json!({
            "program": program,
            "args": args,
            "cwd": cwd,
            "runtimeExecutable": "node",
            "runtimeArgs": ["-r", "ts-node/register"],
            "console": "internalConsole",
        }),
        Language::Go => json!({
            "mode": "debug",
            "program": cwd,
            "args": args,
            "showGlobalVariables": true,
        }),
        Language::Rust => {
            let binary = find_cargo_binary(file)?;
            json!({
                "program": path_string(&binary),
                "args": args,
                "cwd": cwd,
            })
        }
        Language::C | Language::Cpp => {
            let binary = find_sibling_executable(file)?;
            json!({
                "program": path_string(&binary),
                "args": args,
                "cwd": cwd,
            })
        }
        _ => json!({
            "program": program,
            "args": args,
        }),
    };

    match fields {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Locate the compiled assembly for a .NET source file.
///
/// Looks for a project file next to the source, then for
/// `bin/{Debug,Release}/net*/<project>.dll`, newest target framework first.
pub fn find_dotnet_dll(file: &Path) -> Result<PathBuf, ConfigError> {
    let dir = file
        .parent()
        .ok_or_else(|| ConfigError::LaunchTarget(format!("{} has no parent", file.display())))?;

    let project = std::fs::read_dir(dir)
        .map_err(|e| ConfigError::LaunchTarget(format!("cannot read {}: {}", dir.display(), e)))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .find(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| DOTNET_PROJECT_EXTENSIONS.contains(&ext))
        })
        .ok_or_else(|| {
            ConfigError::LaunchTarget(format!("no .NET project file in {}", dir.display()))
        })?;

    let name = project
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ConfigError::LaunchTarget("unreadable project name".to_string()))?;
    let dll_name = format!("{}.dll", name);

    for configuration in DOTNET_CONFIGURATIONS {
        let bin = dir.join("bin").join(configuration);
        let Ok(entries) = std::fs::read_dir(&bin) else {
            continue;
        };
        let mut frameworks: Vec<(Vec<u32>, PathBuf)> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .filter_map(|path| framework_version(&path).map(|version| (version, path)))
            .collect();
        frameworks.sort_by(|a, b| b.0.cmp(&a.0));

        if let Some(dll) = frameworks
            .into_iter()
            .map(|(_, tfm)| tfm.join(&dll_name))
            .find(|dll| dll.is_file())
        {
            return Ok(dll);
        }
    }

    Err(ConfigError::LaunchTarget(format!(
        "{} not found under {}; build the project first",
        dll_name,
        dir.join("bin").display()
    )))
}

/// Numeric version of a target framework folder: `net8.0` is `[8, 0]`,
/// `netcoreapp3.1` is `[3, 1]`, `net48` is `[4, 8]`. Platform suffixes
/// (`net8.0-windows`) are ignored; `netstandard*` is not runnable.
fn framework_version(dir: &Path) -> Option<Vec<u32>> {
    let name = dir.file_name()?.to_str()?;
    let version = name
        .strip_prefix("netcoreapp")
        .or_else(|| name.strip_prefix("net"))?;
    let version = version.split('-').next()?;
    if version.is_empty() {
        return None;
    }
    if version.contains('.') {
        version.split('.').map(|part| part.parse().ok()).collect()
    } else {
        version.chars().map(|c| c.to_digit(10)).collect()
    }
}

/// Locate `target/debug/<package>` for a Rust source file
pub fn find_cargo_binary(file: &Path) -> Result<PathBuf, ConfigError> {
    let manifest_dir = file
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("Cargo.toml").is_file())
        .ok_or_else(|| {
            ConfigError::LaunchTarget(format!("no Cargo.toml above {}", file.display()))
        })?;

    let name = package_name(&manifest_dir.join("Cargo.toml")).or_else(|| {
        manifest_dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
    });
    let name = name.ok_or_else(|| {
        ConfigError::LaunchTarget(format!(
            "cannot determine package name in {}",
            manifest_dir.display()
        ))
    })?;

    let binary = manifest_dir.join("target").join("debug").join(&name);
    if binary.is_file() {
        Ok(binary)
    } else {
        Err(ConfigError::LaunchTarget(format!(
            "{} not found; build with cargo build",
            binary.display()
        )))
    }
}

fn package_name(manifest: &Path) -> Option<String> {
    let text = std::fs::read_to_string(manifest).ok()?;
    let value: toml::Value = toml::from_str(&text).ok()?;
    value
        .get("package")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

/// Locate the executable named after the source stem, next to the source
pub fn find_sibling_executable(file: &Path) -> Result<PathBuf, ConfigError> {
    let stem = file
        .file_stem()
        .ok_or_else(|| ConfigError::LaunchTarget(format!("{} has no stem", file.display())))?;
    let binary = file.with_file_name(stem);
    if binary.is_file() {
        Ok(binary)
    } else {
        Err(ConfigError::LaunchTarget(format!(
            "executable {} not found; compile with debug info first",
            binary.display()
        )))
    }
}
