//! Thread-local ambient context realm.
//!
//! Lookups started on a thread see the realm most recently entered on that
//! thread. [`ContextRealmGuard`] restores the previous realm on drop, so
//! nested `enter_realm` calls unwind correctly.

use std::cell::RefCell;

use crate::realm::RealmId;

thread_local! {
    static CONTEXT_REALM: RefCell<Option<RealmId>> = const { RefCell::new(None) };
}

/// The current thread's context realm.
pub fn context_realm() -> Option<RealmId> {
    CONTEXT_REALM.with(|c| c.borrow().clone())
}

/// Make `realm` the current thread's context realm until the guard drops.
#[must_use = "the context realm is reset when the guard is dropped"]
pub fn enter_realm(realm: RealmId) -> ContextRealmGuard {
    tracing::trace!(realm = %realm, "entering context realm");
    let previous = CONTEXT_REALM.with(|c| c.borrow_mut().replace(realm));
    ContextRealmGuard {
        previous,
        _not_send: std::marker::PhantomData,
    }
}

/// Restores the previous context realm when dropped.
#[derive(Debug)]
pub struct ContextRealmGuard {
    previous: Option<RealmId>,
    // Tied to the thread whose context it modified.
    _not_send: std::marker::PhantomData<*const ()>,
}

impl Drop for ContextRealmGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CONTEXT_REALM.with(|c| *c.borrow_mut() = previous);
    }
}
