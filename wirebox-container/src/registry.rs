//! Binding registry: every registered [`TypeKey`] and its [`TypeRecord`].
//!
//! Records are immutable once inserted. Registering an existing key again
//! is ignored, never an error.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::Result;
use crate::identity::TypeIdentity;
use crate::inject::{DependencyInfo, Injector};
use crate::key::TypeKey;
use crate::lifetime::Lifetime;
use crate::slot::InstanceSlot;

/// Erased factory: builds one instance of the bound interface.
///
/// Tracked lifetimes get an [`InstanceSlot::Shared`] built straight into its
/// `Rc`; NotControlled bindings get an [`InstanceSlot::Raw`].
/// The [`Injector`] resolves the factory's own dependencies against the key
/// under construction, so overrides apply.
pub(crate) type CreateFn = Rc<dyn Fn(&Injector<'_>) -> Result<InstanceSlot>>;

/// Per-dependency binding-name redirections for one consuming binding.
///
/// Maps the identity of a dependency's interface to the binding name it
/// should be resolved under.
///
/// # Examples
/// ```
/// use wirebox_container::registry::Overrides;
///
/// trait Audio {}
///
/// let overrides = Overrides::new().with::<dyn Audio>("Linux");
/// assert_eq!(overrides.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    entries: HashMap<TypeIdentity, String>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves dependencies on `D` under `name`.
    pub fn with<D: ?Sized + 'static>(mut self, name: impl Into<String>) -> Self {
        self.insert(TypeIdentity::of::<D>(), name);
        self
    }

    /// Adds or replaces the redirection for `dependency`.
    pub fn insert(&mut self, dependency: TypeIdentity, name: impl Into<String>) {
        self.entries.insert(dependency, name.into());
    }

    pub fn get(&self, dependency: TypeIdentity) -> Option<&str> {
        self.entries.get(&dependency).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeIdentity, &str)> + '_ {
        self.entries
            .iter()
            .map(|(identity, name)| (*identity, name.as_str()))
    }
}

impl<S: Into<String>> FromIterator<(TypeIdentity, S)> for Overrides {
    fn from_iter<T: IntoIterator<Item = (TypeIdentity, S)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(identity, name)| (identity, name.into()))
                .collect(),
        }
    }
}

/// Everything the container knows about one binding.
#[derive(Clone)]
pub(crate) struct TypeRecord {
    pub lifetime: Lifetime,
    pub overrides: Overrides,
    pub create: CreateFn,
    /// Declared dependencies, in construction order. Empty for closures.
    pub dependencies: Vec<DependencyInfo>,
    /// Name of the concrete type behind the interface.
    pub concrete: &'static str,
}

impl fmt::Debug for TypeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRecord")
            .field("lifetime", &self.lifetime)
            .field("concrete", &self.concrete)
            .field("overrides", &self.overrides)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Stores all binding records.
#[derive(Debug, Default)]
pub(crate) struct TypeRegistry {
    records: HashMap<TypeKey, TypeRecord>,
}

impl TypeRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: HashMap::with_capacity(capacity),
        }
    }

    /// Inserts `record` under `key` unless the key is already bound.
    ///
    /// Returns `true` if the record was inserted.
    pub fn insert(&mut self, key: TypeKey, record: TypeRecord) -> bool {
        if self.records.contains_key(&key) {
            trace!(key = %key, "Binding already registered, ignoring");
            return false;
        }

        debug!(
            key = %key,
            lifetime = %record.lifetime,
            concrete = record.concrete,
            "Registered binding"
        );
        self.records.insert(key, record);
        true
    }

    pub fn get(&self, key: &TypeKey) -> Option<&TypeRecord> {
        self.records.get(key)
    }

    /// Binding name `key` resolves its `dependency` under.
    ///
    /// Empty when `key` is unregistered or has no override for `dependency`.
    pub fn override_for(&self, key: &TypeKey, dependency: TypeIdentity) -> &str {
        self.records
            .get(key)
            .and_then(|record| record.overrides.get(dependency))
            .unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeKey, &TypeRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Short labels of every binding, for suggestions.
    pub fn labels(&self) -> Vec<String> {
        self.records.keys().map(TypeKey::label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Database;
    trait Audio {}

    fn record(lifetime: Lifetime, overrides: Overrides) -> TypeRecord {
        TypeRecord {
            lifetime,
            overrides,
            create: Rc::new(|_| Ok(InstanceSlot::owned(Box::new(Database)))),
            dependencies: vec![],
            concrete: "Database",
        }
    }

    #[test]
    fn insert_and_get() {
        let mut registry = TypeRegistry::default();
        let key = TypeKey::of::<Database>();
        assert!(registry.insert(key.clone(), record(Lifetime::Singleton, Overrides::new())));
        assert_eq!(registry.get(&key).unwrap().lifetime, Lifetime::Singleton);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_is_ignored() {
        let mut registry = TypeRegistry::default();
        let key = TypeKey::of::<Database>();
        assert!(registry.insert(key.clone(), record(Lifetime::Singleton, Overrides::new())));
        assert!(!registry.insert(key.clone(), record(Lifetime::NotControlled, Overrides::new())));

        // First registration wins.
        assert_eq!(registry.get(&key).unwrap().lifetime, Lifetime::Singleton);
    }

    #[test]
    fn named_bindings_coexist() {
        let mut registry = TypeRegistry::default();
        assert!(registry.insert(TypeKey::of::<Database>(), record(Lifetime::Singleton, Overrides::new())));
        assert!(registry.insert(
            TypeKey::named::<Database>("replica"),
            record(Lifetime::Singleton, Overrides::new())
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn override_lookup() {
        let mut registry = TypeRegistry::default();
        let consumer = TypeKey::of::<Database>();
        registry.insert(
            consumer.clone(),
            record(Lifetime::NotControlled, Overrides::new().with::<dyn Audio>("Linux")),
        );

        let audio = TypeIdentity::of::<dyn Audio>();
        assert_eq!(registry.override_for(&consumer, audio), "Linux");
        assert_eq!(registry.override_for(&consumer, TypeIdentity::of::<String>()), "");
        assert_eq!(registry.override_for(&TypeKey::named::<Database>("missing"), audio), "");
    }

    #[test]
    fn overrides_from_pairs() {
        let overrides: Overrides = [(TypeIdentity::of::<dyn Audio>(), "Linux")]
            .into_iter()
            .collect();
        assert_eq!(overrides.get(TypeIdentity::of::<dyn Audio>()), Some("Linux"));
        assert!(!overrides.is_empty());
        assert_eq!(overrides.iter().count(), 1);
    }

    #[test]
    fn labels_are_short() {
        let mut registry = TypeRegistry::default();
        registry.insert(TypeKey::named::<Database>("replica"), record(Lifetime::Singleton, Overrides::new()));
        assert_eq!(registry.labels(), vec!["Database[\"replica\"]".to_string()]);
    }
}
