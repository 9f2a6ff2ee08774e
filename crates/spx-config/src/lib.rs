//! spx-config
//!
//! - Layered YAML container configuration (realm layout + bean listing),
//!   canonicalized and hashed so a layout can be fingerprinted in logs.
//! - [`ConfigurationError`], the error carried by configuration-time failures.
//! - Basic string converters for `byte`, `short` and `int` values.

pub mod converters;
pub mod error;

pub use converters::{
    decode_integer, BasicConverter, ByteConverter, Converted, ConverterLookup, DecodeError,
    IntConverter, ShortConverter, ValueType,
};
pub use error::ConfigurationError;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

/// JSON-pointer prefixes read by the workspace. Any leaf outside them is
/// reported by [`report_unused_keys`].
///
/// Observed reads:
/// - spx-realm::RealmRegistry::from_config_json   /realms
/// - spx-cli (context realm default, bean listing) /context_realm, /beans
pub const CONSUMED_POINTERS: &[&str] = &["/context_realm", "/realms", "/beans"];

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

/// Typed view of the container config. `realms` is read separately by
/// `spx-realm` from the raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Realm entered for lookups when the caller does not pick one.
    #[serde(default)]
    pub context_realm: Option<String>,
    #[serde(default)]
    pub beans: Vec<BeanConfig>,
}

/// One bean listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeanConfig {
    pub name: String,
    /// Source descriptor, e.g. `Static` or `ClassRealm:project`.
    pub source: String,
    /// Raw configured value; scalars are taken as their string form.
    #[serde(default)]
    pub value: Option<Value>,
    /// `byte`, `short` or `int`. Untyped values are kept as text.
    #[serde(default, rename = "type")]
    pub value_type: Option<String>,
}

impl BeanConfig {
    /// The configured value as text (`None` when absent or null).
    pub fn value_text(&self) -> Option<String> {
        match &self.value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    pub fn container(&self) -> Result<ContainerConfig> {
        serde_json::from_value(self.config_json.clone()).context("invalid container config")
    }
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    // Earlier docs are base, later docs override.
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    tracing::debug!(layers = yaml_docs.len(), %config_hash, "container config loaded");
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; anything else (lists included) is replaced.
fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json::Map is BTreeMap-backed here, so keys serialize sorted.
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Unused-key guard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Consumed JSON-pointer prefixes used for this analysis (sorted, unique)
    pub consumed_prefixes: Vec<String>,
    /// Unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report config leaves that nothing reads.
/// `Fail` errors when any exist; `Warn` logs them and returns the report.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = CONSUMED_POINTERS
        .iter()
        .map(|p| normalize_pointer(p))
        .collect();
    let consumed_prefixes: Vec<String> = consumed.into_iter().collect();

    let mut leaves: Vec<String> = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let mut unused: Vec<String> = leaves
        .into_iter()
        .filter(|lp| !consumed_prefixes.iter().any(|cp| is_prefix_pointer(cp, lp)))
        .collect();
    unused.sort();
    unused.dedup();

    let report = UnusedKeyReport {
        consumed_prefixes,
        unused_leaf_pointers: unused,
    };

    if report.is_clean() {
        return Ok(report);
    }

    match policy {
        UnusedKeyPolicy::Fail => bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected. First few: {}",
            report.unused_leaf_pointers.len(),
            preview_list(&report.unused_leaf_pointers, 12)
        ),
        UnusedKeyPolicy::Warn => {
            for p in &report.unused_leaf_pointers {
                tracing::warn!(pointer = %p, "unused config key");
            }
            Ok(report)
        }
    }
}

/// Leading "/", no trailing "/" (except the root pointer itself).
fn normalize_pointer(p: &str) -> String {
    let mut s = p.trim().to_string();
    if s.is_empty() {
        return "/".to_string();
    }
    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    while s.ends_with('/') && s.len() > 1 {
        s.pop();
    }
    s
}

/// "/a/b" covers "/a/b" and "/a/b/c" but not "/a/bc".
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map.iter() {
                let next = format!("{}/{}", prefix, escape_pointer_token(k));
                collect_leaf_pointers(vv, &next, out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                let next = format!("{}/{}", prefix, i);
                collect_leaf_pointers(vv, &next, out);
            }
        }
        _ => {
            let p = if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            };
            out.push(p);
        }
    }
}

fn escape_pointer_token(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn preview_list(items: &[String], n: usize) -> String {
    let take = items.iter().take(n).cloned().collect::<Vec<_>>();
    format!("{:?}", take)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_prefix_respects_segment_boundary() {
        assert!(is_prefix_pointer("/beans", "/beans/0/name"));
        assert!(is_prefix_pointer("/beans", "/beans"));
        assert!(!is_prefix_pointer("/beans", "/beansx/0"));
        assert!(is_prefix_pointer("/", "/anything"));
    }

    #[test]
    fn normalize_pointer_forms() {
        assert_eq!(normalize_pointer(""), "/");
        assert_eq!(normalize_pointer("realms/"), "/realms");
        assert_eq!(normalize_pointer(" /beans "), "/beans");
    }

    #[test]
    fn deep_merge_overrides_scalars_and_replaces_lists() {
        let a = serde_json::json!({"context_realm": "a", "beans": [1, 2], "x": {"y": 1, "z": 2}});
        let b = serde_json::json!({"context_realm": "b", "beans": [3], "x": {"z": 9}});
        let m = deep_merge(a, b);
        assert_eq!(
            m,
            serde_json::json!({"context_realm": "b", "beans": [3], "x": {"y": 1, "z": 9}})
        );
    }

    #[test]
    fn bean_value_text_from_scalars() {
        let bean: BeanConfig = serde_json::from_value(serde_json::json!({
            "name": "n", "source": "Static", "value": 7, "type": "int"
        }))
        .unwrap();
        assert_eq!(bean.value_text().as_deref(), Some("7"));
        assert_eq!(bean.value_type.as_deref(), Some("int"));

        let bean: BeanConfig =
            serde_json::from_value(serde_json::json!({"name": "n", "source": "Static"})).unwrap();
        assert_eq!(bean.value_text(), None);
    }
}
