//! SL-006: CLI subcommands — init, validate, keys, specs.

pub mod logging;

use crate::core::assets::SlingAssets;
use crate::core::translator::{self, DefaultTranslator};
use crate::core::{parser, types};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter replication.yaml
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Parse and validate a replication config
    Validate {
        /// Path to replication.yaml
        #[arg(short, long, default_value = "replication.yaml")]
        file: PathBuf,
    },

    /// Show the target and dependency asset key of every stream
    Keys {
        /// Path to replication.yaml
        #[arg(short, long, default_value = "replication.yaml")]
        file: PathBuf,

        /// First segment of derived target keys
        #[arg(long, default_value = translator::DEFAULT_TARGET_PREFIX)]
        target_prefix: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the asset specs as JSON
    Specs {
        /// Path to replication.yaml
        #[arg(short, long, default_value = "replication.yaml")]
        file: PathBuf,

        /// Group name attached to every spec
        #[arg(long)]
        group: Option<String>,

        /// Code version attached to every spec
        #[arg(long)]
        code_version: Option<String>,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Keys {
            file,
            target_prefix,
            json,
        } => cmd_keys(&file, &target_prefix, json),
        Commands::Specs {
            file,
            group,
            code_version,
        } => cmd_specs(&file, group.as_deref(), code_version.as_deref()),
    }
}

fn cmd_init(path: &Path) -> Result<(), String> {
    let config_path = path.join("replication.yaml");
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()));
    }

    std::fs::create_dir_all(path).map_err(|e| format!("cannot create {}: {}", path.display(), e))?;

    let template = r#"source: MY_SOURCE
target: MY_TARGET

defaults:
  mode: full-refresh
  object: "{stream_schema}_{stream_table}"

streams:
  public.accounts:
  public.users:
    meta:
      dagster:
        asset_key: [warehouse, users]
"#;
    std::fs::write(&config_path, template)
        .map_err(|e| format!("cannot write {}: {}", config_path.display(), e))?;

    tracing::info!(path = %config_path.display(), "wrote replication template");
    println!("Created: {}", config_path.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let config = parser::parse_replication_file(file).map_err(|e| e.to_string())?;
    let errors = parser::validate_replication(&config);

    if errors.is_empty() {
        println!(
            "OK: {} ({} streams, {} -> {})",
            file.display(),
            config.streams.len(),
            config.source.as_deref().unwrap_or("?"),
            config.target.as_deref().unwrap_or("?")
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(format!("{} validation error(s)", errors.len()))
    }
}

/// Parse and validate a replication file, returning errors if invalid.
fn parse_and_validate(file: &Path) -> Result<types::ReplicationConfig, String> {
    let config = parser::parse_replication_file(file).map_err(|e| e.to_string())?;
    let errors = parser::validate_replication(&config);
    if errors.is_empty() {
        return Ok(config);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err("validation failed".to_string())
}

fn cmd_keys(file: &Path, target_prefix: &str, json: bool) -> Result<(), String> {
    let config = parse_and_validate(file)?;
    let policy = DefaultTranslator::with_target_prefix(target_prefix);
    let keys = translator::translate_replication(&config, &policy);

    if json {
        let rows: Vec<serde_json::Value> = keys
            .iter()
            .map(|k| {
                serde_json::json!({
                    "stream": k.stream,
                    "target": k.target,
                    "dependency": k.dependency,
                })
            })
            .collect();
        let out = serde_json::to_string_pretty(&rows).map_err(|e| e.to_string())?;
        println!("{}", out);
        return Ok(());
    }

    for k in &keys {
        println!("{}", k.stream);
        println!("  target: {}", k.target);
        println!("  deps:   {}", k.dependency);
    }
    println!();
    println!("{} stream(s)", keys.len());
    Ok(())
}

fn cmd_specs(file: &Path, group: Option<&str>, code_version: Option<&str>) -> Result<(), String> {
    let config = parse_and_validate(file)?;
    let mut builder = SlingAssets::new(config);
    if let Some(group) = group {
        builder = builder.group_name(group);
    }
    if let Some(version) = code_version {
        builder = builder.code_version(version);
    }
    let assets = builder.build(()).map_err(|e| e.to_string())?;
    let out = serde_json::to_string_pretty(&assets.specs).map_err(|e| e.to_string())?;
    println!("{}", out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
source: MY_POSTGRES
target: MY_DUCKDB
streams:
  public.accounts:
  public."foo users":
"#;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("replication.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_sl006_init() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("project");
        cmd_init(&sub).unwrap();
        let written = sub.join("replication.yaml");
        assert!(written.exists());
        cmd_validate(&written).unwrap();
    }

    #[test]
    fn test_sl006_init_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("replication.yaml"), "exists").unwrap();
        let result = cmd_init(dir.path());
        assert!(result.unwrap_err().contains("already exists"));
    }

    #[test]
    fn test_sl006_validate_valid() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), VALID);
        cmd_validate(&config).unwrap();
    }

    #[test]
    fn test_sl006_validate_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "source: \"\"\nstreams:\n  public.a: 3\n");
        let result = cmd_validate(&config);
        assert_eq!(result.unwrap_err(), "2 validation error(s)");
    }

    #[test]
    fn test_sl006_validate_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = cmd_validate(&dir.path().join("missing.yaml"));
        assert!(result.unwrap_err().contains("failed to read"));
    }

    #[test]
    fn test_sl006_keys_text_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), VALID);
        cmd_keys(&config, "target", false).unwrap();
        cmd_keys(&config, "lake", true).unwrap();
    }

    #[test]
    fn test_sl006_keys_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "streams:\n  public.a: [x]\n");
        let result = cmd_keys(&config, "target", false);
        assert!(result.unwrap_err().contains("validation"));
    }

    #[test]
    fn test_sl006_specs() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), VALID);
        cmd_specs(&config, Some("raw"), Some("v1")).unwrap();
    }

    #[test]
    fn test_sl006_specs_duplicate_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), "streams:\n  public.a-b:\n  public.a_b:\n");
        let result = cmd_specs(&config, None, None);
        assert!(result.unwrap_err().contains("target/public/a_b"));
    }

    #[test]
    fn test_sl006_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path(), VALID);
        dispatch(Commands::Validate {
            file: config.clone(),
        })
        .unwrap();
        dispatch(Commands::Keys {
            file: config.clone(),
            target_prefix: "target".to_string(),
            json: true,
        })
        .unwrap();
        dispatch(Commands::Specs {
            file: config,
            group: None,
            code_version: None,
        })
        .unwrap();
    }

    #[test]
    fn test_sl006_dispatch_init() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("dispatch-test");
        dispatch(Commands::Init { path: sub.clone() }).unwrap();
        assert!(sub.join("replication.yaml").exists());
    }
}
