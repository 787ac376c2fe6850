//! SL-003: Stream name sanitization and stream → asset key translation.
//!
//! The default policy sanitizes a stream name, splits it on `.` and, for the
//! target key, prepends a prefix (`target` unless configured otherwise).
//! Any other policy plugs in by implementing [`StreamTranslator`]. Literal
//! `meta.dagster` overrides in the config win over every policy.

use super::types::*;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

/// Prefix given to target keys by the default policy.
pub const DEFAULT_TARGET_PREFIX: &str = "target";

static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_.]").expect("valid stream name regex"));

/// Strip `"` and replace every other character outside `[A-Za-z0-9_.]`
/// with one `_`. Idempotent.
pub fn sanitize_stream_name(stream_name: &str) -> String {
    let unquoted = stream_name.replace('"', "");
    DISALLOWED_RE.replace_all(&unquoted, "_").into_owned()
}

/// `[target_prefix] + split(sanitize(stream_name), ".")`.
pub fn target_identifier(stream_name: &str, target_prefix: &str) -> AssetKey {
    dependency_identifier(stream_name).with_prefix(target_prefix)
}

/// `split(sanitize(stream_name), ".")`.
pub fn dependency_identifier(stream_name: &str) -> AssetKey {
    AssetKey::new(sanitize_stream_name(stream_name).split('.'))
}

/// Policy deciding which asset keys a stream maps to.
///
/// Every method has a default; implementors replace as much of the
/// derivation as they need, up to ignoring the stream name entirely.
pub trait StreamTranslator: Send + Sync {
    /// First segment of derived target keys.
    fn target_prefix(&self) -> &str {
        DEFAULT_TARGET_PREFIX
    }

    fn sanitize_stream_name(&self, stream_name: &str) -> String {
        sanitize_stream_name(stream_name)
    }

    /// Key of the asset the replication writes.
    fn asset_key_for_target(&self, stream_name: &str) -> AssetKey {
        AssetKey::new(self.sanitize_stream_name(stream_name).split('.'))
            .with_prefix(self.target_prefix())
    }

    /// Key of the upstream asset the replication reads.
    fn deps_asset_key(&self, stream_name: &str) -> AssetKey {
        AssetKey::new(self.sanitize_stream_name(stream_name).split('.'))
    }
}

/// Sanitize-and-split policy with a configurable target prefix.
#[derive(Debug, Clone)]
pub struct DefaultTranslator {
    target_prefix: String,
}

impl DefaultTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_prefix(prefix: impl Into<String>) -> Self {
        Self {
            target_prefix: prefix.into(),
        }
    }
}

impl Default for DefaultTranslator {
    fn default() -> Self {
        Self {
            target_prefix: DEFAULT_TARGET_PREFIX.to_string(),
        }
    }
}

impl StreamTranslator for DefaultTranslator {
    fn target_prefix(&self) -> &str {
        &self.target_prefix
    }
}

/// Explicit stream → key lookup, deferring unmapped streams to `fallback`.
#[derive(Debug, Clone, Default)]
pub struct TableTranslator<T = DefaultTranslator> {
    targets: IndexMap<String, AssetKey>,
    deps: IndexMap<String, AssetKey>,
    fallback: T,
}

impl TableTranslator<DefaultTranslator> {
    pub fn new() -> Self {
        Self::with_fallback(DefaultTranslator::default())
    }
}

impl<T: StreamTranslator> TableTranslator<T> {
    pub fn with_fallback(fallback: T) -> Self {
        Self {
            targets: IndexMap::new(),
            deps: IndexMap::new(),
            fallback,
        }
    }

    pub fn map_target(mut self, stream_name: impl Into<String>, key: AssetKey) -> Self {
        self.targets.insert(stream_name.into(), key);
        self
    }

    pub fn map_deps(mut self, stream_name: impl Into<String>, key: AssetKey) -> Self {
        self.deps.insert(stream_name.into(), key);
        self
    }
}

impl<T: StreamTranslator> StreamTranslator for TableTranslator<T> {
    fn target_prefix(&self) -> &str {
        self.fallback.target_prefix()
    }

    fn sanitize_stream_name(&self, stream_name: &str) -> String {
        self.fallback.sanitize_stream_name(stream_name)
    }

    fn asset_key_for_target(&self, stream_name: &str) -> AssetKey {
        match self.targets.get(stream_name) {
            Some(key) => key.clone(),
            None => self.fallback.asset_key_for_target(stream_name),
        }
    }

    fn deps_asset_key(&self, stream_name: &str) -> AssetKey {
        match self.deps.get(stream_name) {
            Some(key) => key.clone(),
            None => self.fallback.deps_asset_key(stream_name),
        }
    }
}

// ============================================================================
// Stream enumeration
// ============================================================================

/// One declared stream with any literal key overrides pulled out of `meta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamIdentity {
    /// Raw stream key from the config
    pub name: String,

    /// `meta.dagster.asset_key`, when present and non-empty
    pub asset_key: Option<KeyOverride>,

    /// `meta.dagster.deps`, when present and non-empty
    pub deps: Option<KeyOverride>,

    /// `disabled: true` on the descriptor
    pub disabled: bool,
}

/// Target and dependency keys resolved for one stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamKeys {
    pub stream: String,
    pub target: AssetKey,
    pub dependency: AssetKey,
}

/// List every declared stream in config order. No filtering is done here.
pub fn streams_from_replication(config: &ReplicationConfig) -> Vec<StreamIdentity> {
    config
        .streams
        .iter()
        .map(|(name, descriptor)| identify_stream(name, descriptor))
        .collect()
}

fn identify_stream(name: &str, descriptor: &StreamDescriptor) -> StreamIdentity {
    let Some(config) = descriptor.config() else {
        return StreamIdentity {
            name: name.to_string(),
            asset_key: None,
            deps: None,
            disabled: false,
        };
    };

    let dagster = config.meta.as_ref().and_then(|m| m.dagster.as_ref());
    let present = |o: Option<&KeyOverride>| o.filter(|o| !o.is_empty()).cloned();

    StreamIdentity {
        name: name.to_string(),
        asset_key: present(dagster.and_then(|d| d.asset_key.as_ref())),
        deps: present(dagster.and_then(|d| d.deps.as_ref())),
        disabled: config.disabled,
    }
}

/// Resolve one stream's keys.
///
/// `asset_key` becomes the target verbatim and also stands in for the stream
/// name when deriving the dependency: a string goes through the translator,
/// a list is used as the dependency path as is. `deps` beats both.
pub fn translate_stream(translator: &dyn StreamTranslator, stream: &StreamIdentity) -> StreamKeys {
    let target = match &stream.asset_key {
        Some(key) => key.to_asset_key(),
        None => translator.asset_key_for_target(&stream.name),
    };
    let dependency = match (&stream.deps, &stream.asset_key) {
        (Some(deps), _) => deps.to_asset_key(),
        (None, Some(KeyOverride::Single(name))) => translator.deps_asset_key(name),
        (None, Some(path @ KeyOverride::Path(_))) => path.to_asset_key(),
        (None, None) => translator.deps_asset_key(&stream.name),
    };
    tracing::debug!(
        stream = %stream.name,
        target = %target,
        dependency = %dependency,
        "translated stream"
    );
    StreamKeys {
        stream: stream.name.clone(),
        target,
        dependency,
    }
}

/// Resolve every declared stream, in config order.
pub fn translate_replication(
    config: &ReplicationConfig,
    translator: &dyn StreamTranslator,
) -> Vec<StreamKeys> {
    streams_from_replication(config)
        .iter()
        .map(|s| translate_stream(translator, s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn config(yaml: &str) -> ReplicationConfig {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn test_sl003_sanitize_clean_name() {
        assert_eq!(sanitize_stream_name("public.accounts"), "public.accounts");
    }

    #[test]
    fn test_sl003_sanitize_strips_quotes() {
        assert_eq!(sanitize_stream_name("\"weird name!\""), "weird_name_");
        assert_eq!(
            sanitize_stream_name("public.\"foo users\""),
            "public.foo_users"
        );
    }

    #[test]
    fn test_sl003_sanitize_one_underscore_per_char() {
        assert_eq!(sanitize_stream_name("a  b"), "a__b");
        assert_eq!(sanitize_stream_name("a-b/c"), "a_b_c");
        assert_eq!(sanitize_stream_name("naïve"), "na_ve");
    }

    #[test]
    fn test_sl003_sanitize_idempotent() {
        for s in ["", "public.accounts", "\"weird name!\"", "x.\"y z\".w$"] {
            let once = sanitize_stream_name(s);
            assert_eq!(sanitize_stream_name(&once), once);
        }
    }

    #[test]
    fn test_sl003_target_identifier() {
        assert_eq!(
            target_identifier("public.accounts", DEFAULT_TARGET_PREFIX),
            AssetKey::new(["target", "public", "accounts"])
        );
        assert_eq!(
            target_identifier("public.accounts", "lake"),
            AssetKey::new(["lake", "public", "accounts"])
        );
    }

    #[test]
    fn test_sl003_dependency_identifier() {
        assert_eq!(
            dependency_identifier("public.accounts"),
            AssetKey::new(["public", "accounts"])
        );
    }

    #[test]
    fn test_sl003_empty_name_is_one_empty_segment() {
        assert_eq!(dependency_identifier("").path(), [""]);
    }

    #[test]
    fn test_sl003_default_translator_matches_free_functions() {
        let t = DefaultTranslator::new();
        assert_eq!(
            t.asset_key_for_target("public.\"foo users\""),
            target_identifier("public.\"foo users\"", "target")
        );
        assert_eq!(
            t.deps_asset_key("public.Transactions"),
            dependency_identifier("public.Transactions")
        );
    }

    #[test]
    fn test_sl003_custom_prefix() {
        let t = DefaultTranslator::with_target_prefix("snowflake");
        assert_eq!(
            t.asset_key_for_target("public.accounts").to_string(),
            "snowflake/public/accounts"
        );
    }

    #[test]
    fn test_sl003_table_translator() {
        let t = TableTranslator::new()
            .map_target("stream1", AssetKey::new(["asset1"]))
            .map_deps("stream1", AssetKey::new(["raw", "asset1"]));
        assert_eq!(t.asset_key_for_target("stream1"), AssetKey::new(["asset1"]));
        assert_eq!(t.deps_asset_key("stream1"), AssetKey::new(["raw", "asset1"]));
        assert_eq!(
            t.asset_key_for_target("public.other"),
            AssetKey::new(["target", "public", "other"])
        );
    }

    struct Flat;

    impl StreamTranslator for Flat {
        fn asset_key_for_target(&self, stream_name: &str) -> AssetKey {
            AssetKey::new([self.sanitize_stream_name(stream_name).replace('.', "_")])
        }
    }

    #[test]
    fn test_sl003_trait_override_replaces_derivation() {
        let c = config("streams:\n  public.accounts:\n");
        let keys = translate_replication(&c, &Flat);
        assert_eq!(keys[0].target, AssetKey::new(["public_accounts"]));
        assert_eq!(keys[0].dependency, AssetKey::new(["public", "accounts"]));
    }

    #[test]
    fn test_sl003_enumerate_streams() {
        let c = config(
            r#"
streams:
  public.accounts:
  public.users:
    meta:
      dagster:
        asset_key: mydb_users
  public.skip:
    disabled: true
  public.odd: 42
"#,
        );
        let streams = streams_from_replication(&c);
        assert_eq!(streams.len(), 4);
        assert_eq!(streams[0].name, "public.accounts");
        assert!(streams[0].asset_key.is_none());
        assert_eq!(
            streams[1].asset_key,
            Some(KeyOverride::Single("mydb_users".into()))
        );
        assert!(streams[2].disabled);
        assert_eq!(streams[3].name, "public.odd");
        assert!(streams[3].asset_key.is_none());
    }

    #[test]
    fn test_sl003_asset_key_override_bypasses_sanitize() {
        let c = config(
            r#"
streams:
  public."foo users":
    meta:
      dagster:
        asset_key: ["Odd Name!", "x.y"]
"#,
        );
        let keys = translate_replication(&c, &DefaultTranslator::new());
        assert_eq!(keys[0].target, AssetKey::new(["Odd Name!", "x.y"]));
        assert_eq!(keys[0].dependency, AssetKey::new(["Odd Name!", "x.y"]));
    }

    #[test]
    fn test_sl003_scalar_asset_key_drives_dependency() {
        let c = config(
            r#"
streams:
  public.users:
    meta:
      dagster:
        asset_key: mydb_users
  public.orders:
    meta:
      dagster:
        asset_key: "sales.Orders 2024"
"#,
        );
        let keys = translate_replication(&c, &DefaultTranslator::new());
        assert_eq!(keys[0].target, AssetKey::new(["mydb_users"]));
        assert_eq!(keys[0].dependency, AssetKey::new(["mydb_users"]));
        assert_eq!(keys[1].target, AssetKey::new(["sales.Orders 2024"]));
        assert_eq!(keys[1].dependency, AssetKey::new(["sales", "Orders_2024"]));
    }

    #[test]
    fn test_sl003_asset_key_dependency_uses_policy() {
        let c = config(
            r#"
streams:
  public.users:
    meta:
      dagster:
        asset_key: mydb_users
"#,
        );
        let t = TableTranslator::new().map_deps("mydb_users", AssetKey::new(["source", "users"]));
        let keys = translate_replication(&c, &t);
        assert_eq!(keys[0].target, AssetKey::new(["mydb_users"]));
        assert_eq!(keys[0].dependency, AssetKey::new(["source", "users"]));
    }

    #[test]
    fn test_sl003_override_wins_over_custom_policy() {
        let c = config(
            r#"
streams:
  public.accounts:
    meta:
      dagster:
        asset_key: [pinned]
        deps: [upstream, accounts]
"#,
        );
        let keys = translate_replication(&c, &Flat);
        assert_eq!(keys[0].target, AssetKey::new(["pinned"]));
        assert_eq!(keys[0].dependency, AssetKey::new(["upstream", "accounts"]));
    }

    #[test]
    fn test_sl003_empty_override_ignored() {
        let c = config(
            r#"
streams:
  public.accounts:
    meta:
      dagster:
        asset_key: ""
"#,
        );
        let keys = translate_replication(&c, &DefaultTranslator::new());
        assert_eq!(keys[0].target.to_string(), "target/public/accounts");
    }

    #[test]
    fn test_sl003_empty_replication() {
        let c = config("streams: {}\n");
        assert!(translate_replication(&c, &DefaultTranslator::new()).is_empty());
    }

    #[test]
    fn test_sl003_order_independent() {
        let c = config(
            r#"
streams:
  public.b:
  public.a:
  public."c d":
"#,
        );
        let mut reversed = c.clone();
        reversed.streams.reverse();
        let t = DefaultTranslator::new();
        let forward: BTreeSet<_> = translate_replication(&c, &t).into_iter().collect();
        let backward: BTreeSet<_> = translate_replication(&reversed, &t).into_iter().collect();
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 3);
    }
}
