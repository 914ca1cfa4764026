//! Process-stable type identities.
//!
//! A [`TypeIdentity`] is minted the first time a type is seen and stays
//! the same for the rest of the process. Tokens are handed out in
//! first-use order, so they are only meaningful within one run and must
//! never be persisted.

use std::any::{TypeId, type_name};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{self, AtomicU64};

use dashmap::DashMap;
use once_cell::sync::Lazy;

static IDENTITIES: Lazy<DashMap<TypeId, TypeIdentity>> = Lazy::new(DashMap::new);
static NEXT_INDEX: AtomicU64 = AtomicU64::new(0);

/// Opaque, comparable token identifying one Rust type.
///
/// # Examples
/// ```
/// use wirebox_container::identity::TypeIdentity;
///
/// trait Audio {}
///
/// assert_eq!(TypeIdentity::of::<dyn Audio>(), TypeIdentity::of::<dyn Audio>());
/// assert_ne!(TypeIdentity::of::<dyn Audio>(), TypeIdentity::of::<String>());
/// ```
#[derive(Clone, Copy)]
pub struct TypeIdentity {
    index: u64,
    type_name: &'static str,
}

impl TypeIdentity {
    /// Returns the identity of `T`, minting it on first use.
    pub fn of<T: ?Sized + 'static>() -> Self {
        let type_id = TypeId::of::<T>();
        if let Some(existing) = IDENTITIES.get(&type_id) {
            return *existing;
        }

        *IDENTITIES.entry(type_id).or_insert_with(|| TypeIdentity {
            index: NEXT_INDEX.fetch_add(1, atomic::Ordering::Relaxed),
            type_name: type_name::<T>(),
        })
    }

    /// Position of this type in first-use order.
    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Fully qualified name of the type, for diagnostics only.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Returns the identity of `T`.
///
/// Shorthand for [`TypeIdentity::of`], handy when building override maps.
#[inline]
pub fn type_identity<T: ?Sized + 'static>() -> TypeIdentity {
    TypeIdentity::of::<T>()
}

// Identity is the index alone; the name rides along for messages.
impl PartialEq for TypeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for TypeIdentity {}

impl Hash for TypeIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl PartialOrd for TypeIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeIdentity(#{} {})", self.index, self.type_name)
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;
    trait Shape {}

    #[test]
    fn same_type_same_identity() {
        assert_eq!(TypeIdentity::of::<Marker>(), TypeIdentity::of::<Marker>());
        assert_eq!(type_identity::<Marker>(), TypeIdentity::of::<Marker>());
    }

    #[test]
    fn distinct_types_distinct_identities() {
        assert_ne!(TypeIdentity::of::<Marker>(), TypeIdentity::of::<dyn Shape>());
        assert_ne!(TypeIdentity::of::<u32>(), TypeIdentity::of::<i32>());
    }

    #[test]
    fn identity_carries_type_name() {
        let identity = TypeIdentity::of::<dyn Shape>();
        assert!(identity.type_name().contains("Shape"));
        assert!(format!("{identity:?}").contains('#'));
    }

    #[test]
    fn identities_are_stable_across_threads() {
        let here = TypeIdentity::of::<Vec<Marker>>();
        let there = std::thread::spawn(TypeIdentity::of::<Vec<Marker>>)
            .join()
            .unwrap();
        assert_eq!(here, there);
        assert_eq!(here.index(), there.index());
    }

    #[test]
    fn ordering_follows_index() {
        let a = TypeIdentity::of::<(Marker, u8)>();
        let b = TypeIdentity::of::<(Marker, u16)>();
        assert_eq!(a.cmp(&b), a.index().cmp(&b.index()));
    }
}
