//! Realm-scoped bean lookup filter.
//!
//! [`RealmFilteredBeans`] wraps a re-iterable bean sequence. Every call to
//! [`RealmFilteredBeans::iter`] asks the resolver for the realms visible from
//! the current context and returns a [`RealmFilteredIter`]:
//!
//! - empty visible set: every bean passes through unchanged;
//! - otherwise: only beans with a static source, or a realm source whose realm
//!   is visible, are yielded. Order is preserved.
//!
//! The iterator is a read-only view with a one-entry lookahead buffer.

use std::fmt;
use std::iter::FusedIterator;

use tracing::{debug, trace};

use crate::realm::{VisibilityResolver, VisibleRealms};
use crate::source::BeanSource;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Anything carrying a bean source.
pub trait Sourced {
    fn source(&self) -> &BeanSource;
}

impl<T: Sourced + ?Sized> Sourced for &T {
    fn source(&self) -> &BeanSource {
        (**self).source()
    }
}

/// A named bean value plus where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeanEntry<T> {
    pub name: String,
    pub source: BeanSource,
    pub value: T,
}

impl<T> BeanEntry<T> {
    pub fn new(name: impl Into<String>, source: impl Into<BeanSource>, value: T) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            value,
        }
    }
}

impl<T> Sourced for BeanEntry<T> {
    fn source(&self) -> &BeanSource {
        &self.source
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Contract violations on a [`RealmFilteredIter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupError {
    /// `next_entry` was called with no visible entry left.
    Exhausted,
    /// The filtered view is read-only.
    Unsupported { operation: &'static str },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "no more elements in realm-filtered lookup"),
            Self::Unsupported { operation } => write!(
                f,
                "operation '{operation}' is not supported on realm-filtered lookups"
            ),
        }
    }
}

impl std::error::Error for LookupError {}

// ---------------------------------------------------------------------------
// RealmFilteredBeans
// ---------------------------------------------------------------------------

/// Re-iterable, realm-filtered view over `beans`.
///
/// `beans` is stored as given and only iterated when [`iter`](Self::iter) is
/// called; it must be cheap to clone (a slice iterator, `&Vec<_>`, ...).
#[derive(Clone, Debug)]
pub struct RealmFilteredBeans<S, R> {
    beans: S,
    resolver: R,
}

impl<S, R> RealmFilteredBeans<S, R> {
    pub fn new(beans: S, resolver: R) -> Self {
        Self { beans, resolver }
    }
}

impl<S, R> RealmFilteredBeans<S, R>
where
    S: Clone + IntoIterator,
    S::Item: Sourced,
    R: VisibilityResolver,
{
    /// Start a lookup pass. Visibility is resolved now, not at construction.
    pub fn iter(&self) -> RealmFilteredIter<S::IntoIter> {
        let visible = self.resolver.resolve_visible();
        let itr = self.beans.clone().into_iter();
        if visible.is_empty() {
            debug!("realm filter pass: no visible realms, passing all beans through");
            RealmFilteredIter::unfiltered(itr)
        } else {
            debug!(visible = visible.len(), "realm filter pass");
            RealmFilteredIter::filtered(itr, visible)
        }
    }
}

impl<'a, S, R> IntoIterator for &'a RealmFilteredBeans<S, R>
where
    S: Clone + IntoIterator,
    S::Item: Sourced,
    R: VisibilityResolver,
{
    type Item = S::Item;
    type IntoIter = RealmFilteredIter<S::IntoIter>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// RealmFilteredIter
// ---------------------------------------------------------------------------

/// Iterator over the beans visible from a fixed set of realms.
///
/// Not safe for concurrent use; the lookahead slot is plain mutable state.
pub struct RealmFilteredIter<I: Iterator> {
    itr: I,
    /// `None` => pass-through.
    visible: Option<VisibleRealms>,
    /// Populated by `has_next`.
    next_bean: Option<I::Item>,
}

impl<I> RealmFilteredIter<I>
where
    I: Iterator,
    I::Item: Sourced,
{
    /// Yields only beans visible from `visible`.
    pub fn filtered(itr: I, visible: VisibleRealms) -> Self {
        Self {
            itr,
            visible: Some(visible),
            next_bean: None,
        }
    }

    /// Yields every bean of `itr`.
    pub fn unfiltered(itr: I) -> Self {
        Self {
            itr,
            visible: None,
            next_bean: None,
        }
    }

    pub fn is_filtering(&self) -> bool {
        self.visible.is_some()
    }

    /// `true` if another visible bean exists. Repeated calls do not advance
    /// past a buffered bean.
    pub fn has_next(&mut self) -> bool {
        if self.next_bean.is_some() {
            return true;
        }

        let Some(visible) = &self.visible else {
            self.next_bean = self.itr.next();
            return self.next_bean.is_some();
        };

        for bean in self.itr.by_ref() {
            if bean.source().is_visible(visible) {
                self.next_bean = Some(bean);
                return true;
            }
            trace!(source = %bean.source(), "skipping bean outside visible realms");
        }
        false
    }

    /// Take the next visible bean.
    ///
    /// # Errors
    /// [`LookupError::Exhausted`] once no visible bean is left.
    pub fn next_entry(&mut self) -> Result<I::Item, LookupError> {
        self.has_next();
        self.next_bean.take().ok_or(LookupError::Exhausted)
    }

    /// Always fails: the view never mutates its source.
    pub fn remove(&mut self) -> Result<(), LookupError> {
        Err(LookupError::Unsupported {
            operation: "remove",
        })
    }
}

impl<I> Iterator for RealmFilteredIter<I>
where
    I: Iterator,
    I::Item: Sourced,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let buffered = usize::from(self.next_bean.is_some());
        let (lo, hi) = self.itr.size_hint();
        let hi = hi.and_then(|h| h.checked_add(buffered));
        if self.visible.is_some() {
            (buffered, hi)
        } else {
            (lo.saturating_add(buffered), hi)
        }
    }
}

impl<I> FusedIterator for RealmFilteredIter<I>
where
    I: FusedIterator,
    I::Item: Sourced,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::FixedVisibility;
    use std::cell::Cell;

    fn beans(sources: &[&str]) -> Vec<BeanEntry<usize>> {
        sources
            .iter()
            .enumerate()
            .map(|(i, s)| BeanEntry::new(format!("bean{i}"), *s, i))
            .collect()
    }

    fn sources<'a>(itr: impl Iterator<Item = &'a BeanEntry<usize>>) -> Vec<&'a str> {
        itr.map(|b| b.source.descriptor()).collect()
    }

    #[test]
    fn filters_to_visible_realms_in_order() {
        let all = beans(&["Static", "ClassRealm:A", "ClassRealm:B", "Static2"]);
        let view = RealmFilteredBeans::new(all.iter(), FixedVisibility::new(["A"]));
        assert_eq!(sources(view.iter()), ["Static", "ClassRealm:A", "Static2"]);
    }

    #[test]
    fn empty_visible_set_passes_everything_through() {
        let all = beans(&["Static", "ClassRealm:A", "ClassRealm:B"]);
        let view = RealmFilteredBeans::new(&all, FixedVisibility::default());
        let itr = view.iter();
        assert!(!itr.is_filtering());
        assert_eq!(sources(itr), ["Static", "ClassRealm:A", "ClassRealm:B"]);
    }

    #[test]
    fn has_next_is_idempotent() {
        let all = beans(&["ClassRealm:B", "ClassRealm:A", "ClassRealm:B"]);
        let view = RealmFilteredBeans::new(all.iter(), FixedVisibility::new(["A"]));
        let mut itr = view.iter();

        assert!(itr.has_next());
        assert!(itr.has_next());
        assert!(itr.has_next());
        assert_eq!(itr.next_entry().unwrap().value, 1);
        assert!(!itr.has_next());
        assert!(!itr.has_next());
    }

    #[test]
    fn next_entry_after_exhaustion_errors() {
        let all = beans(&["ClassRealm:B"]);
        let view = RealmFilteredBeans::new(all.iter(), FixedVisibility::new(["A"]));
        let mut itr = view.iter();
        assert_eq!(itr.next_entry().unwrap_err(), LookupError::Exhausted);
        assert_eq!(itr.next(), None);
    }

    #[test]
    fn unfiltered_next_entry_after_exhaustion_errors() {
        let all = beans(&["Static", "ClassRealm:B"]);
        let view = RealmFilteredBeans::new(all.iter(), FixedVisibility::default());
        let mut itr = view.iter();
        assert!(!itr.is_filtering());
        assert_eq!(itr.next_entry().unwrap().name, "bean0");
        assert_eq!(itr.next_entry().unwrap().name, "bean1");
        assert!(!itr.has_next());
        assert_eq!(itr.next_entry().unwrap_err(), LookupError::Exhausted);
        assert_eq!(itr.next(), None);
    }

    #[test]
    fn next_entry_without_has_next_still_finds_match() {
        let all = beans(&["ClassRealm:B", "Static"]);
        let view = RealmFilteredBeans::new(all.iter(), FixedVisibility::new(["A"]));
        let mut itr = view.iter();
        assert_eq!(itr.next_entry().unwrap().name, "bean1");
    }

    #[test]
    fn remove_is_unsupported() {
        let all = beans(&["Static"]);
        let view = RealmFilteredBeans::new(all.iter(), FixedVisibility::new(["A"]));
        let mut itr = view.iter();
        assert_eq!(
            itr.remove(),
            Err(LookupError::Unsupported {
                operation: "remove"
            })
        );
        itr.next();
        assert!(itr.remove().is_err());
    }

    #[test]
    fn construction_is_lazy() {
        let all = beans(&["Static", "ClassRealm:A"]);
        let pulled = Cell::new(0);
        let counted = all.iter().inspect(|_| pulled.set(pulled.get() + 1));

        let view = RealmFilteredBeans::new(counted, FixedVisibility::new(["A"]));
        assert_eq!(pulled.get(), 0);

        let mut itr = view.iter();
        assert_eq!(pulled.get(), 0);
        assert!(itr.has_next());
        assert_eq!(pulled.get(), 1);
    }

    #[test]
    fn size_hint_bounds() {
        let all = beans(&["Static", "ClassRealm:A", "ClassRealm:B"]);
        let view = RealmFilteredBeans::new(all.iter(), FixedVisibility::new(["A"]));
        let mut itr = view.iter();
        assert_eq!(itr.size_hint(), (0, Some(3)));
        itr.has_next();
        assert_eq!(itr.size_hint(), (1, Some(3)));

        let view = RealmFilteredBeans::new(all.iter(), FixedVisibility::default());
        assert_eq!(view.iter().size_hint(), (3, Some(3)));
    }

    #[test]
    fn lookup_error_messages() {
        assert_eq!(
            LookupError::Exhausted.to_string(),
            "no more elements in realm-filtered lookup"
        );
        assert!(LookupError::Unsupported {
            operation: "remove"
        }
        .to_string()
        .contains("'remove' is not supported"));
    }
}
