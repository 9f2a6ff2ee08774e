//! Realm graph and visibility resolution.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use crate::context;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Realm identity (stable string: e.g. `plexus.core`, `project`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RealmId(pub String);

impl RealmId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Visible realm set
// ---------------------------------------------------------------------------

/// Names visible from a calling context. Empty means "do not filter".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibleRealms {
    names: BTreeSet<String>,
}

impl VisibleRealms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for VisibleRealms {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver contract
// ---------------------------------------------------------------------------

/// Source of the ambient context realm and of realm visibility.
///
/// Passed into [`RealmFilteredBeans`](crate::RealmFilteredBeans) explicitly so
/// callers (and tests) control what a lookup can see.
pub trait VisibilityResolver {
    /// The calling context's current realm, if any.
    fn context_realm(&self) -> Option<RealmId>;

    /// Names visible from `realm`, including `realm` itself.
    fn visible_realm_names(&self, realm: &RealmId) -> VisibleRealms;

    /// Visible names for the current context. No context realm => empty.
    fn resolve_visible(&self) -> VisibleRealms {
        match self.context_realm() {
            Some(realm) => self.visible_realm_names(&realm),
            None => VisibleRealms::new(),
        }
    }
}

impl<R: VisibilityResolver + ?Sized> VisibilityResolver for &R {
    fn context_realm(&self) -> Option<RealmId> {
        (**self).context_realm()
    }

    fn visible_realm_names(&self, realm: &RealmId) -> VisibleRealms {
        (**self).visible_realm_names(realm)
    }

    fn resolve_visible(&self) -> VisibleRealms {
        (**self).resolve_visible()
    }
}

impl<R: VisibilityResolver + ?Sized> VisibilityResolver for Arc<R> {
    fn context_realm(&self) -> Option<RealmId> {
        (**self).context_realm()
    }

    fn visible_realm_names(&self, realm: &RealmId) -> VisibleRealms {
        (**self).visible_realm_names(realm)
    }

    fn resolve_visible(&self) -> VisibleRealms {
        (**self).resolve_visible()
    }
}

/// Resolver that always reports the same visible set.
#[derive(Clone, Debug, Default)]
pub struct FixedVisibility(pub VisibleRealms);

impl FixedVisibility {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self(names.into_iter().collect())
    }
}

impl VisibilityResolver for FixedVisibility {
    fn context_realm(&self) -> Option<RealmId> {
        None
    }

    fn visible_realm_names(&self, _realm: &RealmId) -> VisibleRealms {
        self.0.clone()
    }

    fn resolve_visible(&self) -> VisibleRealms {
        self.0.clone()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by [`RealmRegistry`] operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RealmError {
    /// The realm id is empty or contains only whitespace.
    EmptyId,
    /// A realm with the given id is already registered.
    DuplicateRealm { id: String },
    /// A realm names a parent that is not registered.
    UnknownParent { id: String, parent: String },
    /// A realm imports a realm that is not registered.
    UnknownImport { id: String, import: String },
}

impl fmt::Display for RealmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "realm id must not be empty"),
            Self::DuplicateRealm { id } => write!(f, "realm '{id}' is already registered"),
            Self::UnknownParent { id, parent } => {
                write!(f, "realm '{id}': parent '{parent}' is not registered")
            }
            Self::UnknownImport { id, import } => {
                write!(f, "realm '{id}': import '{import}' is not registered")
            }
        }
    }
}

impl std::error::Error for RealmError {}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Declaration of one realm: its parent and the realms it imports from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RealmSpec {
    pub id: RealmId,
    pub parent: Option<RealmId>,
    /// Searched before the parent, in declaration order.
    pub imports: Vec<RealmId>,
}

impl RealmSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RealmId::new(id),
            parent: None,
            imports: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(RealmId::new(parent));
        self
    }

    pub fn with_import(mut self, import: impl Into<String>) -> Self {
        self.imports.push(RealmId::new(import));
        self
    }
}

/// Realm graph. Visibility of a realm is the closure over itself, its
/// imports and its parent chain.
///
/// The context realm comes from the thread-local ambient context
/// (see [`enter_realm`](crate::enter_realm)).
#[derive(Clone, Debug, Default)]
pub struct RealmRegistry {
    realms: BTreeMap<RealmId, RealmSpec>,
}

impl RealmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a realm.
    ///
    /// # Errors
    /// - [`RealmError::EmptyId`] if the id is empty/whitespace.
    /// - [`RealmError::DuplicateRealm`] if the id is already registered.
    pub fn insert(&mut self, spec: RealmSpec) -> Result<(), RealmError> {
        if spec.id.as_str().trim().is_empty() {
            return Err(RealmError::EmptyId);
        }
        if self.realms.contains_key(&spec.id) {
            return Err(RealmError::DuplicateRealm {
                id: spec.id.0.clone(),
            });
        }
        self.realms.insert(spec.id.clone(), spec);
        Ok(())
    }

    /// Check that every parent and import reference is registered.
    pub fn validate(&self) -> Result<(), RealmError> {
        for spec in self.realms.values() {
            if let Some(parent) = &spec.parent {
                if !self.realms.contains_key(parent) {
                    return Err(RealmError::UnknownParent {
                        id: spec.id.0.clone(),
                        parent: parent.0.clone(),
                    });
                }
            }
            for import in &spec.imports {
                if !self.realms.contains_key(import) {
                    return Err(RealmError::UnknownImport {
                        id: spec.id.0.clone(),
                        import: import.0.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn contains(&self, id: &RealmId) -> bool {
        self.realms.contains_key(id)
    }

    pub fn get(&self, id: &RealmId) -> Option<&RealmSpec> {
        self.realms.get(id)
    }

    pub fn len(&self) -> usize {
        self.realms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.realms.is_empty()
    }

    /// Build from the `realms` section of the container config JSON.
    ///
    /// Each element: `{ id, parent?, imports? }`. A missing section yields an
    /// empty registry. References are validated.
    pub fn from_config_json(cfg: &Value) -> Result<Self> {
        let mut registry = Self::new();

        let Some(realms) = cfg.get("realms") else {
            return Ok(registry);
        };
        let realms = realms.as_array().context("config realms must be a list")?;

        for (i, entry) in realms.iter().enumerate() {
            let id = entry
                .get("id")
                .and_then(Value::as_str)
                .with_context(|| format!("config realms[{i}] missing id"))?;

            let mut spec = RealmSpec::new(id);

            match entry.get("parent") {
                None | Some(Value::Null) => {}
                Some(Value::String(p)) => spec.parent = Some(RealmId::new(p.as_str())),
                Some(other) => {
                    return Err(anyhow!(
                        "config realms[{i}].parent must be a string (got {other})"
                    ))
                }
            }

            if let Some(imports) = entry.get("imports") {
                let imports = imports
                    .as_array()
                    .with_context(|| format!("config realms[{i}].imports must be a list"))?;
                for import in imports {
                    let import = import.as_str().with_context(|| {
                        format!("config realms[{i}].imports entries must be strings")
                    })?;
                    spec.imports.push(RealmId::new(import));
                }
            }

            registry
                .insert(spec)
                .with_context(|| format!("config realms[{i}] rejected"))?;
        }

        registry.validate().context("config realms invalid")?;
        Ok(registry)
    }
}

impl VisibilityResolver for RealmRegistry {
    fn context_realm(&self) -> Option<RealmId> {
        context::context_realm()
    }

    fn visible_realm_names(&self, realm: &RealmId) -> VisibleRealms {
        let mut visible = VisibleRealms::new();
        if !self.realms.contains_key(realm) {
            return visible;
        }

        // Breadth-first: self, then imports, then parent. Cycles stop at the
        // first revisit.
        let mut queue = VecDeque::from([realm.clone()]);
        while let Some(id) = queue.pop_front() {
            if !visible.insert(id.0.clone()) {
                continue;
            }
            if let Some(spec) = self.realms.get(&id) {
                queue.extend(spec.imports.iter().cloned());
                queue.extend(spec.parent.iter().cloned());
            }
        }
        visible
    }
}
