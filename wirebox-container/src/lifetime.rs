//! Instance lifetime policies.
//!
//! A lifetime decides whether the container caches what it builds:
//! - [`Lifetime::Singleton`]: one instance for the container's whole life
//! - [`Lifetime::ReferenceCounting`]: one live instance while someone holds it
//! - [`Lifetime::NotControlled`]: a new instance on every resolve, owned by the caller
//!
//! The lifetime also decides which ownership handles may be requested,
//! see [`Lifetime::permits`].

use std::fmt;

use serde::Serialize;

use crate::wrapper::WrapperKind;

/// Defines how the container manages instances of a binding.
///
/// # Examples
/// ```
/// use wirebox_container::lifetime::Lifetime;
/// use wirebox_container::wrapper::WrapperKind;
///
/// assert!(Lifetime::Singleton.permits(WrapperKind::Reference));
/// assert!(!Lifetime::Singleton.permits(WrapperKind::Unique));
/// assert!(!Lifetime::ReferenceCounting.permits(WrapperKind::Raw));
/// assert!(Lifetime::NotControlled.permits(WrapperKind::Unique));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Lifetime {
    /// The container builds nothing ahead of time and keeps nothing.
    ///
    /// Every resolve constructs a fresh instance and ownership passes to the
    /// caller immediately.
    NotControlled,

    /// At most one instance per binding, ever.
    ///
    /// Built on first resolve and kept by the container until it is dropped.
    /// Every handle kind except an exclusive owner may be requested.
    Singleton,

    /// At most one live instance per binding at a time.
    ///
    /// The container only observes the instance weakly. Once every shared
    /// owner is gone the instance is dropped, and the next resolve builds a
    /// new one.
    ReferenceCounting,
}

impl Lifetime {
    /// Returns `true` if the container tracks instances of this lifetime.
    #[inline]
    pub fn is_controlled(&self) -> bool {
        !matches!(self, Lifetime::NotControlled)
    }

    /// Returns `true` if a handle of `kind` may be requested for this lifetime.
    pub fn permits(&self, kind: WrapperKind) -> bool {
        match self {
            Lifetime::Singleton => !matches!(kind, WrapperKind::Unique),
            Lifetime::ReferenceCounting => {
                matches!(kind, WrapperKind::Shared | WrapperKind::Weak)
            }
            Lifetime::NotControlled => matches!(
                kind,
                WrapperKind::Unique | WrapperKind::Raw | WrapperKind::Shared
            ),
        }
    }

    /// Handle kinds this lifetime accepts, in declaration order.
    pub fn permitted(&self) -> Vec<WrapperKind> {
        WrapperKind::ALL
            .into_iter()
            .filter(|kind| self.permits(*kind))
            .collect()
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::NotControlled => write!(f, "NotControlled"),
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::ReferenceCounting => write!(f, "ReferenceCounting"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_permits_everything_but_unique() {
        assert_eq!(
            Lifetime::Singleton.permitted(),
            vec![
                WrapperKind::Shared,
                WrapperKind::Weak,
                WrapperKind::Raw,
                WrapperKind::Reference,
            ]
        );
    }

    #[test]
    fn reference_counting_permits_shared_and_weak() {
        assert_eq!(
            Lifetime::ReferenceCounting.permitted(),
            vec![WrapperKind::Shared, WrapperKind::Weak]
        );
    }

    #[test]
    fn not_controlled_permits_owning_and_raw() {
        assert_eq!(
            Lifetime::NotControlled.permitted(),
            vec![WrapperKind::Unique, WrapperKind::Shared, WrapperKind::Raw]
        );
    }

    #[test]
    fn controlled_lifetimes() {
        assert!(Lifetime::Singleton.is_controlled());
        assert!(Lifetime::ReferenceCounting.is_controlled());
        assert!(!Lifetime::NotControlled.is_controlled());
    }

    #[test]
    fn lifetime_display() {
        assert_eq!(Lifetime::Singleton.to_string(), "Singleton");
        assert_eq!(Lifetime::ReferenceCounting.to_string(), "ReferenceCounting");
        assert_eq!(Lifetime::NotControlled.to_string(), "NotControlled");
    }
}
