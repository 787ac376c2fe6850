//! SL-001: Replication config schema, asset keys, and asset specs.
//!
//! Defines the YAML schema of a Sling replication config plus the identity
//! and spec records produced from it. Config types derive
//! Serialize/Deserialize for YAML roundtripping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-level replication.yaml
// ============================================================================

/// Root of a Sling replication config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Source connection name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Target connection name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Descriptor applied to every stream unless overridden
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<StreamConfig>,

    /// Environment passed through to the replication engine
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, serde_yaml_ng::Value>,

    /// Stream declarations (order-preserving)
    pub streams: IndexMap<String, StreamDescriptor>,
}

/// Where a replication config comes from: a file on disk or an in-memory value.
#[derive(Debug, Clone)]
pub enum ReplicationParam {
    Path(PathBuf),
    Config(ReplicationConfig),
}

impl From<PathBuf> for ReplicationParam {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ReplicationParam {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<ReplicationConfig> for ReplicationParam {
    fn from(config: ReplicationConfig) -> Self {
        Self::Config(config)
    }
}

// ============================================================================
// Streams
// ============================================================================

/// The value stored under a stream name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamDescriptor {
    /// `public.accounts:` with nothing after it
    Empty,
    /// A structured descriptor
    Config(StreamConfig),
    /// Anything else (scalars, lists, wrongly typed mappings)
    Other(serde_yaml_ng::Value),
}

impl StreamDescriptor {
    /// The structured descriptor, if there is one.
    pub fn config(&self) -> Option<&StreamConfig> {
        match self {
            Self::Config(c) => Some(c),
            _ => None,
        }
    }
}

/// Structured per-stream settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Replication mode (full-refresh, incremental, truncate, snapshot)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Target object name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    /// Custom source query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,

    /// Primary key column(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<ColumnList>,

    /// Incremental cursor column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_key: Option<String>,

    /// Skip this stream entirely
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,

    /// Free-form metadata; `meta.dagster` carries key overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<StreamMeta>,

    /// Keys this crate does not interpret
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml_ng::Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Column list — single column or multiple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnList {
    Single(String),
    Multiple(Vec<String>),
}

impl ColumnList {
    /// Expand to a list of column names.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::Single(s) => vec![s.clone()],
            Self::Multiple(v) => v.clone(),
        }
    }
}

/// `meta:` block of a stream descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dagster: Option<DagsterMeta>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml_ng::Value>,
}

/// `meta.dagster:` block — literal asset key overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DagsterMeta {
    /// Replaces the derived target key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_key: Option<KeyOverride>,

    /// Replaces the derived dependency key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<KeyOverride>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml_ng::Value>,
}

/// An asset key written literally in the config.
///
/// A list is taken as the full segment path. A string is a single segment,
/// even when it contains `.` or `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyOverride {
    Single(String),
    Path(Vec<String>),
}

impl KeyOverride {
    /// True for `""` and `[]`, which count as "no override".
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(s) => s.is_empty(),
            Self::Path(v) => v.is_empty(),
        }
    }

    pub fn to_asset_key(&self) -> AssetKey {
        match self {
            Self::Single(s) => AssetKey::new([s.as_str()]),
            Self::Path(v) => AssetKey::new(v.iter().map(String::as_str)),
        }
    }
}

// ============================================================================
// Asset keys
// ============================================================================

/// Hierarchical asset identifier. Equality is segment-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(Vec<String>);

impl AssetKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse the `a/b/c` form.
    pub fn from_user_string(s: &str) -> Self {
        Self::new(s.split('/'))
    }

    pub fn path(&self) -> &[String] {
        &self.0
    }

    pub fn to_user_string(&self) -> String {
        self.0.join("/")
    }

    /// New key with `prefix` as the first segment.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.push(prefix.to_string());
        segments.extend(self.0.iter().cloned());
        Self(segments)
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_user_string())
    }
}

// ============================================================================
// Asset specs and scheduling policies
// ============================================================================

/// Declarative description of one asset produced by a replication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub key: AssetKey,

    #[serde(default)]
    pub deps: Vec<AssetKey>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_policy: Option<FreshnessPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_materialize_policy: Option<AutoMaterializePolicy>,
}

/// How the replication is partitioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "keys", rename_all = "snake_case")]
pub enum PartitionsDefinition {
    Static(Vec<String>),
}

impl PartitionsDefinition {
    pub fn partition_keys(&self) -> &[String] {
        match self {
            Self::Static(keys) => keys,
        }
    }
}

/// How backfills over partitions are split into runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackfillPolicy {
    SingleRun,
    MultiRun { max_partitions_per_run: u32 },
}

/// How stale an asset may get before it is considered overdue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessPolicy {
    pub maximum_lag_minutes: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_schedule: Option<String>,
}

/// When the orchestrator may materialize an asset on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoMaterializePolicy {
    Eager,
    Lazy,
}

impl fmt::Display for AutoMaterializePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager => write!(f, "eager"),
            Self::Lazy => write!(f, "lazy"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
