//! Bean source descriptors.
//!
//! Upstream descriptors are plain strings. Anything starting with
//! [`REALM_TAG`] came from a class realm and is only visible inside that
//! realm's visibility chain; everything else (static bindings, global
//! configuration) is visible everywhere.

use std::fmt;

use crate::realm::{RealmId, VisibleRealms};

/// Literal prefix marking realm-scoped descriptors.
pub const REALM_TAG: &str = "ClassRealm";

/// Where a bean entry originated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BeanSource {
    /// Not realm-scoped; always visible.
    Static(String),
    /// Contributed by a class realm.
    Realm {
        realm: RealmId,
        /// Descriptor text as received (kept for display and compatibility checks).
        descriptor: String,
    },
}

impl BeanSource {
    /// Global source with the given descriptor text.
    pub fn global(descriptor: impl Into<String>) -> Self {
        BeanSource::Static(descriptor.into())
    }

    /// Realm-scoped source with the canonical `ClassRealm:<id>` descriptor.
    pub fn realm(realm: impl Into<String>) -> Self {
        let realm = RealmId::new(realm);
        let descriptor = format!("{REALM_TAG}:{realm}");
        BeanSource::Realm { realm, descriptor }
    }

    /// Classify a raw descriptor.
    ///
    /// Accepted realm forms:
    /// - `ClassRealm:<id>` / `ClassRealm <id>`
    /// - `ClassRealm[<id>, parent: ...]`
    /// - `ClassRealm<id>` (no separator)
    pub fn parse(descriptor: &str) -> Self {
        let Some(rest) = descriptor.strip_prefix(REALM_TAG) else {
            return BeanSource::Static(descriptor.to_string());
        };

        let id = if let Some(bracketed) = rest.strip_prefix('[') {
            let end = bracketed.find([',', ']']).unwrap_or(bracketed.len());
            &bracketed[..end]
        } else {
            rest.strip_prefix(':')
                .or_else(|| rest.strip_prefix(char::is_whitespace))
                .unwrap_or(rest)
        };

        BeanSource::Realm {
            realm: RealmId::new(id.trim()),
            descriptor: descriptor.to_string(),
        }
    }

    pub fn descriptor(&self) -> &str {
        match self {
            BeanSource::Static(d) => d,
            BeanSource::Realm { descriptor, .. } => descriptor,
        }
    }

    /// Realm id for realm-scoped sources.
    pub fn realm_id(&self) -> Option<&RealmId> {
        match self {
            BeanSource::Static(_) => None,
            BeanSource::Realm { realm, .. } => Some(realm),
        }
    }

    pub fn is_realm_scoped(&self) -> bool {
        matches!(self, BeanSource::Realm { .. })
    }

    /// Static sources are always visible. Realm sources are visible when
    /// either the realm id or the full descriptor is in `visible`.
    pub fn is_visible(&self, visible: &VisibleRealms) -> bool {
        match self {
            BeanSource::Static(_) => true,
            BeanSource::Realm { realm, descriptor } => {
                visible.contains(realm.as_str()) || visible.contains(descriptor)
            }
        }
    }
}

impl fmt::Display for BeanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor())
    }
}

impl From<&str> for BeanSource {
    fn from(descriptor: &str) -> Self {
        BeanSource::parse(descriptor)
    }
}
