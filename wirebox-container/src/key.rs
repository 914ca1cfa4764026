//! Binding identification keys.
//!
//! [`TypeKey`] uniquely identifies a binding within the container.
//! It combines the interface's [`TypeIdentity`] with a binding name so one
//! interface can have several implementations side by side.

use std::fmt;

use wirebox_support::rendering::binding_label;

use crate::identity::TypeIdentity;

/// Uniquely identifies a binding in the container.
///
/// The empty name is the default binding. Keys order by identity first,
/// then by name.
///
/// # Examples
/// ```
/// use wirebox_container::key::TypeKey;
///
/// trait Audio {}
///
/// let default = TypeKey::of::<dyn Audio>();
/// assert_eq!(default.name(), "");
/// assert!(default.is_default());
///
/// let linux = TypeKey::named::<dyn Audio>("Linux");
/// assert_eq!(linux.name(), "Linux");
/// assert_ne!(default, linux);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    identity: TypeIdentity,
    name: String,
}

impl TypeKey {
    /// Creates the default-binding key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeIdentity::of::<T>(), "")
    }

    /// Creates a named key for `T`.
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(TypeIdentity::of::<T>(), name)
    }

    /// Creates a key from an already minted identity.
    #[inline]
    pub fn new(identity: TypeIdentity, name: impl Into<String>) -> Self {
        Self {
            identity,
            name: name.into(),
        }
    }

    #[inline]
    pub fn identity(&self) -> TypeIdentity {
        self.identity
    }

    /// Returns the binding name; empty for the default binding.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.identity.type_name()
    }

    /// Short human-readable label, e.g. `dyn Audio["Linux"]`.
    pub fn label(&self) -> String {
        binding_label(self.type_name(), &self.name)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "TypeKey({})", self.type_name())
        } else {
            write!(f, "TypeKey({}, name={:?})", self.type_name(), self.name)
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "{}", self.type_name())
        } else {
            write!(f, "{} (name={:?})", self.type_name(), self.name)
        }
    }
}
