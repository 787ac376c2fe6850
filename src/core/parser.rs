//! SL-002: Replication YAML parsing and validation.
//!
//! Parses replication.yaml and validates structural constraints:
//! - `streams` must be present and a mapping (enforced by the schema)
//! - `source` / `target`, when given, must not be empty
//! - Stream names must not be empty
//! - Stream descriptors must be empty or a well-formed mapping
//! - `meta.dagster` key overrides must have non-empty segments

use super::error::ReplicationError;
use super::types::*;
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a replication.yaml file from disk.
pub fn parse_replication_file(path: &Path) -> Result<ReplicationConfig, ReplicationError> {
    tracing::debug!(path = %path.display(), "reading replication config");
    let content = std::fs::read_to_string(path).map_err(|source| ReplicationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_replication(&content)
}

/// Parse a replication.yaml from a string.
pub fn parse_replication(yaml: &str) -> Result<ReplicationConfig, ReplicationError> {
    let config: ReplicationConfig = serde_yaml_ng::from_str(yaml)?;
    tracing::debug!(streams = config.streams.len(), "parsed replication config");
    Ok(config)
}

/// Resolve a path-or-value parameter into a config.
pub fn load_replication(
    param: impl Into<ReplicationParam>,
) -> Result<ReplicationConfig, ReplicationError> {
    match param.into() {
        ReplicationParam::Path(path) => parse_replication_file(&path),
        ReplicationParam::Config(config) => Ok(config),
    }
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_replication(config: &ReplicationConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (field, value) in [("source", &config.source), ("target", &config.target)] {
        if value.as_deref() == Some("") {
            errors.push(ValidationError {
                message: format!("{} must not be empty", field),
            });
        }
    }

    if let Some(defaults) = &config.defaults {
        if defaults.meta.as_ref().and_then(|m| m.dagster.as_ref()).is_some() {
            errors.push(ValidationError {
                message: "defaults must not carry meta.dagster key overrides".to_string(),
            });
        }
    }

    for (name, descriptor) in &config.streams {
        if name.is_empty() {
            errors.push(ValidationError {
                message: "stream name must not be empty".to_string(),
            });
        }

        let stream = match descriptor {
            StreamDescriptor::Empty => continue,
            StreamDescriptor::Other(value) => {
                errors.push(ValidationError {
                    message: format!(
                        "stream '{}' has a malformed descriptor ({})",
                        name,
                        describe_value(value)
                    ),
                });
                continue;
            }
            StreamDescriptor::Config(stream) => stream,
        };

        let Some(dagster) = stream.meta.as_ref().and_then(|m| m.dagster.as_ref()) else {
            continue;
        };
        for (field, key) in [("asset_key", &dagster.asset_key), ("deps", &dagster.deps)] {
            if let Some(key) = key {
                if let Some(message) = check_override(name, field, key) {
                    errors.push(ValidationError { message });
                }
            }
        }
    }

    errors
}

fn check_override(stream: &str, field: &str, key: &KeyOverride) -> Option<String> {
    if key.is_empty() {
        return Some(format!(
            "stream '{}' has an empty meta.dagster.{} override",
            stream, field
        ));
    }
    if let KeyOverride::Path(segments) = key {
        if segments.iter().any(String::is_empty) {
            return Some(format!(
                "stream '{}' meta.dagster.{} has an empty segment",
                stream, field
            ));
        }
    }
    None
}

fn describe_value(value: &serde_yaml_ng::Value) -> &'static str {
    match value {
        serde_yaml_ng::Value::Null => "null",
        serde_yaml_ng::Value::Bool(_) => "boolean",
        serde_yaml_ng::Value::Number(_) => "number",
        serde_yaml_ng::Value::String(_) => "string",
        serde_yaml_ng::Value::Sequence(_) => "list",
        serde_yaml_ng::Value::Mapping(_) => "mapping with invalid fields",
        serde_yaml_ng::Value::Tagged(_) => "tagged value",
    }
}
