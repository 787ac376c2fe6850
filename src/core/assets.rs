//! SL-004: Asset spec construction and the replication asset definition.
//!
//! [`SlingAssets`] turns a replication config into one [`AssetSpec`] per
//! enabled stream and wraps the specs, together with a caller-supplied
//! compute function, into an [`AssetsDefinition`] graph node.

use super::error::{BuildError, ReplicationError};
use super::parser;
use super::translator::{self, DefaultTranslator, StreamTranslator};
use super::types::*;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Compute kind recorded on every replication asset definition.
pub const COMPUTE_KIND: &str = "sling";

/// Name used when the caller does not supply one.
pub const DEFAULT_NAME: &str = "sling_assets";

/// Builder for a replication-backed [`AssetsDefinition`].
pub struct SlingAssets {
    replication: ReplicationConfig,
    translator: Box<dyn StreamTranslator>,
    name: Option<String>,
    partitions_def: Option<PartitionsDefinition>,
    backfill_policy: Option<BackfillPolicy>,
    op_tags: IndexMap<String, String>,
    group_name: Option<String>,
    code_version: Option<String>,
    freshness_policy: Option<FreshnessPolicy>,
    auto_materialize_policy: Option<AutoMaterializePolicy>,
}

impl SlingAssets {
    pub fn new(replication: ReplicationConfig) -> Self {
        Self {
            replication,
            translator: Box::new(DefaultTranslator::default()),
            name: None,
            partitions_def: None,
            backfill_policy: None,
            op_tags: IndexMap::new(),
            group_name: None,
            code_version: None,
            freshness_policy: None,
            auto_materialize_policy: None,
        }
    }

    /// Load the replication from a path or take it as given.
    pub fn load(param: impl Into<ReplicationParam>) -> Result<Self, ReplicationError> {
        Ok(Self::new(parser::load_replication(param)?))
    }

    pub fn translator(mut self, translator: impl StreamTranslator + 'static) -> Self {
        self.translator = Box::new(translator);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn partitions_def(mut self, partitions_def: PartitionsDefinition) -> Self {
        self.partitions_def = Some(partitions_def);
        self
    }

    pub fn backfill_policy(mut self, policy: BackfillPolicy) -> Self {
        self.backfill_policy = Some(policy);
        self
    }

    pub fn op_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.op_tags.insert(key.into(), value.into());
        self
    }

    pub fn group_name(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = Some(group_name.into());
        self
    }

    pub fn code_version(mut self, code_version: impl Into<String>) -> Self {
        self.code_version = Some(code_version.into());
        self
    }

    pub fn freshness_policy(mut self, policy: FreshnessPolicy) -> Self {
        self.freshness_policy = Some(policy);
        self
    }

    pub fn auto_materialize_policy(mut self, policy: AutoMaterializePolicy) -> Self {
        self.auto_materialize_policy = Some(policy);
        self
    }

    pub fn replication(&self) -> &ReplicationConfig {
        &self.replication
    }

    /// One spec per enabled stream, in config order.
    pub fn specs(&self) -> Vec<AssetSpec> {
        self.stream_keys()
            .into_iter()
            .map(|keys| self.spec_for(keys))
            .collect()
    }

    fn stream_keys(&self) -> Vec<translator::StreamKeys> {
        translator::streams_from_replication(&self.replication)
            .iter()
            .filter(|s| {
                if s.disabled {
                    tracing::debug!(stream = %s.name, "skipping disabled stream");
                }
                !s.disabled
            })
            .map(|s| translator::translate_stream(self.translator.as_ref(), s))
            .collect()
    }

    fn spec_for(&self, keys: translator::StreamKeys) -> AssetSpec {
        AssetSpec {
            key: keys.target,
            deps: vec![keys.dependency],
            group_name: self.group_name.clone(),
            code_version: self.code_version.clone(),
            freshness_policy: self.freshness_policy.clone(),
            auto_materialize_policy: self.auto_materialize_policy,
        }
    }

    /// Validate everything and produce the definition.
    pub fn build<F>(self, compute: F) -> Result<AssetsDefinition<F>, BuildError> {
        let errors = parser::validate_replication(&self.replication);
        if !errors.is_empty() {
            return Err(BuildError::Invalid(errors));
        }
        if let Some(partitions) = &self.partitions_def {
            check_partitions(partitions)?;
        }
        if let Some(BackfillPolicy::MultiRun {
            max_partitions_per_run: 0,
        }) = self.backfill_policy
        {
            return Err(BuildError::InvalidBackfillPolicy(
                "max_partitions_per_run must be at least 1".to_string(),
            ));
        }

        let keys = self.stream_keys();
        let mut producers: HashMap<&AssetKey, &str> = HashMap::new();
        for k in &keys {
            if let Some(first) = producers.insert(&k.target, &k.stream) {
                return Err(BuildError::DuplicateAssetKey {
                    key: k.target.clone(),
                    first: first.to_string(),
                    second: k.stream.clone(),
                });
            }
        }

        let specs: Vec<AssetSpec> = keys.into_iter().map(|k| self.spec_for(k)).collect();
        let name = self.name.unwrap_or_else(|| DEFAULT_NAME.to_string());
        tracing::info!(name = %name, assets = specs.len(), "built replication assets");

        Ok(AssetsDefinition {
            name,
            compute_kind: COMPUTE_KIND,
            can_subset: false,
            specs,
            partitions_def: self.partitions_def,
            backfill_policy: self.backfill_policy,
            op_tags: self.op_tags,
            compute,
        })
    }
}

fn check_partitions(partitions: &PartitionsDefinition) -> Result<(), BuildError> {
    let mut seen = HashSet::new();
    for key in partitions.partition_keys() {
        if key.is_empty() {
            return Err(BuildError::InvalidPartitions(
                "partition keys must not be empty".to_string(),
            ));
        }
        if !seen.insert(key.as_str()) {
            return Err(BuildError::InvalidPartitions(format!(
                "duplicate partition key '{}'",
                key
            )));
        }
    }
    Ok(())
}

/// A multi-asset graph node: the specs a replication materializes plus the
/// function that runs it.
#[derive(Clone)]
pub struct AssetsDefinition<F> {
    pub name: String,
    pub compute_kind: &'static str,
    pub can_subset: bool,
    pub specs: Vec<AssetSpec>,
    pub partitions_def: Option<PartitionsDefinition>,
    pub backfill_policy: Option<BackfillPolicy>,
    pub op_tags: IndexMap<String, String>,
    compute: F,
}

impl<F> fmt::Debug for AssetsDefinition<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetsDefinition")
            .field("name", &self.name)
            .field("compute_kind", &self.compute_kind)
            .field("can_subset", &self.can_subset)
            .field("specs", &self.specs)
            .field("partitions_def", &self.partitions_def)
            .field("backfill_policy", &self.backfill_policy)
            .field("op_tags", &self.op_tags)
            .finish_non_exhaustive()
    }
}

impl<F> AssetsDefinition<F> {
    /// Keys of every asset this node materializes.
    pub fn keys(&self) -> BTreeSet<AssetKey> {
        self.specs.iter().map(|s| s.key.clone()).collect()
    }

    /// Keys of every declared upstream dependency.
    pub fn dependency_keys(&self) -> BTreeSet<AssetKey> {
        self.specs.iter().flat_map(|s| s.deps.iter().cloned()).collect()
    }

    /// Upstream keys not materialized by this node itself.
    pub fn external_dependency_keys(&self) -> BTreeSet<AssetKey> {
        let own = self.keys();
        self.dependency_keys()
            .into_iter()
            .filter(|k| !own.contains(k))
            .collect()
    }

    pub fn spec(&self, key: &AssetKey) -> Option<&AssetSpec> {
        self.specs.iter().find(|s| &s.key == key)
    }

    pub fn compute_fn(&self) -> &F {
        &self.compute
    }
}
