//! spx-realm
//!
//! Realm scoping for bean lookups.
//!
//! Responsibilities:
//! - Structured bean source descriptors (global vs realm-scoped)
//! - Realm graph + visible-realm resolution (self, imports, parent chain)
//! - Thread-local ambient "context realm"
//! - Lazy, order-preserving realm filter over bean sequences

pub mod context;
pub mod filter;
pub mod realm;
pub mod source;

pub use context::{context_realm, enter_realm, ContextRealmGuard};
pub use filter::{BeanEntry, LookupError, RealmFilteredBeans, RealmFilteredIter, Sourced};
pub use realm::{
    FixedVisibility, RealmError, RealmId, RealmRegistry, RealmSpec, VisibilityResolver,
    VisibleRealms,
};
pub use source::{BeanSource, REALM_TAG};
