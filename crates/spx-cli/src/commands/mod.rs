//! Command handler modules for spx-cli.
//!
//! Shared loading used by multiple command paths lives here.

pub mod convert;
pub mod lookup;

use anyhow::{Context, Result};
use spx_config::{ContainerConfig, UnusedKeyPolicy};
use spx_realm::{RealmId, RealmRegistry};

/// Realm graph and typed view built from a layered config.
pub struct Container {
    pub config: ContainerConfig,
    pub registry: RealmRegistry,
}

impl Container {
    pub fn load(config_paths: &[String]) -> Result<Self> {
        let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
        let loaded = spx_config::load_layered_yaml(&path_refs)?;
        spx_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;

        let registry = RealmRegistry::from_config_json(&loaded.config_json)
            .context("failed to build realm registry")?;
        let config = loaded.container()?;

        tracing::info!(
            config_hash = %loaded.config_hash,
            realms = registry.len(),
            beans = config.beans.len(),
            "container loaded"
        );

        Ok(Self { config, registry })
    }

    /// `--realm` if given, else the configured context realm.
    pub fn pick_realm(&self, flag: Option<String>) -> Option<RealmId> {
        let realm = flag
            .or_else(|| self.config.context_realm.clone())
            .map(RealmId::new)?;
        if !self.registry.contains(&realm) {
            tracing::warn!(realm = %realm, "realm is not registered; lookups will not be filtered");
        }
        Some(realm)
    }
}
