//! Error types for loading replication configs and building asset definitions.

use super::parser::ValidationError;
use super::types::AssetKey;
use std::path::PathBuf;

/// Failure to obtain a [`ReplicationConfig`](super::types::ReplicationConfig).
#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    /// The replication file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or does not match the schema
    /// (including a missing or non-mapping `streams` key).
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml_ng::Error),
}

/// Failure to assemble an [`AssetsDefinition`](super::assets::AssetsDefinition).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid replication config: {}", join_messages(.0))]
    Invalid(Vec<ValidationError>),

    #[error("streams '{first}' and '{second}' both map to asset key '{key}'")]
    DuplicateAssetKey {
        key: AssetKey,
        first: String,
        second: String,
    },

    #[error("invalid partitions definition: {0}")]
    InvalidPartitions(String),

    #[error("invalid backfill policy: {0}")]
    InvalidBackfillPolicy(String),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
