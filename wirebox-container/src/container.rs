//! # The Container
//!
//! Holds every binding and the instances the container keeps alive, and
//! hands out the ownership handle a caller asks for.
//!
//! # Architecture
//! ```text
//! register ──> TypeRegistry ─┐
//!                            ├──> resolve_as::<I, W>(name)
//! resolve  ──> InstanceRegistry ─┘        │
//!                                  W::cast(Instance)
//!                                          │
//!                                          ▼
//!                              Box<I> / Rc<I> / Weak<I> / *const I / &I
//! ```
//!
//! # Examples
//! ```rust
//! use std::rc::Rc;
//! use wirebox_container::prelude::*;
//!
//! trait Logger {
//!     fn prefix(&self) -> &str;
//! }
//!
//! struct Console;
//! impl Logger for Console {
//!     fn prefix(&self) -> &str { "console" }
//! }
//!
//! let mut container = Container::builder().max_suggestions(5).build();
//! container.register_factory::<dyn Logger>("", Lifetime::Singleton, Overrides::new(), |_| {
//!     Ok(Box::new(Console))
//! });
//!
//! let first: Rc<dyn Logger> = container.resolve().unwrap();
//! let second: Rc<dyn Logger> = container.resolve().unwrap();
//! assert!(Rc::ptr_eq(&first, &second));
//! assert_eq!(first.prefix(), "console");
//! ```

use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, instrument, trace};
use wirebox_support::rendering::{closest_labels, short_type_name};

use crate::error::{ContainerError, IncompatibleWrapperError, NotRegisteredError, Result};
use crate::identity::TypeIdentity;
use crate::inject::{Dependencies, Implements, Injectable, Injector};
use crate::key::TypeKey;
use crate::lifetime::Lifetime;
use crate::provider::Provider;
use crate::registry::{CreateFn, Overrides, TypeRecord, TypeRegistry};
use crate::slot::{InstanceRegistry, InstanceSlot, InstanceState, Probe};
use crate::wrapper::{Instance, Shared, Wrapper, WrapperKind};

const DEFAULT_MAX_SUGGESTIONS: usize = 3;

// ============================================================
// ContainerBuilder
// ============================================================

/// Configures a [`Container`] before any binding is registered.
///
/// # Examples
/// ```rust
/// use wirebox_container::prelude::*;
///
/// let container = Container::builder()
///     .max_suggestions(0)
///     .with_capacity(32)
///     .build();
/// assert!(container.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    max_suggestions: usize,
    capacity: usize,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            capacity: 0,
        }
    }

    /// Caps the "did you mean" list of a not-registered error. `0` disables it.
    pub fn max_suggestions(mut self, limit: usize) -> Self {
        self.max_suggestions = limit;
        self
    }

    /// Pre-sizes the binding and instance tables.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build(self) -> Container {
        debug!(
            max_suggestions = self.max_suggestions,
            capacity = self.capacity,
            "Building container"
        );
        Container {
            types: TypeRegistry::with_capacity(self.capacity),
            instances: InstanceRegistry::with_capacity(self.capacity),
            path: RefCell::new(Vec::new()),
            max_suggestions: self.max_suggestions,
        }
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Container
// ============================================================

/// Single-threaded dependency injection container.
///
/// Registration needs `&mut self`; resolution works through `&self` so
/// handles can be requested while other handles are still borrowed.
///
/// Singleton instances live until the container is dropped.
/// ReferenceCounting instances live while a shared owner exists outside the
/// container. NotControlled instances belong to the caller.
pub struct Container {
    types: TypeRegistry,
    instances: InstanceRegistry,
    /// Bindings under construction, outermost first.
    path: RefCell<Vec<TypeKey>>,
    max_suggestions: usize,
}

impl Container {
    /// Creates a container with default settings.
    pub fn new() -> Self {
        ContainerBuilder::new().build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    // ── Registration ──

    /// Binds concrete type `T` to interface `I` under `name`.
    ///
    /// Returns `false` and changes nothing if `(I, name)` is already bound.
    /// Dependencies are not checked until the binding is resolved.
    pub fn register<T, I>(&mut self, name: &str, overrides: Overrides) -> bool
    where
        T: Injectable + Implements<I>,
        I: ?Sized + 'static,
    {
        let record = TypeRecord {
            lifetime: T::LIFETIME,
            overrides,
            create: create_fn(|injector| {
                let deps = <T::Deps as Dependencies>::resolve(injector)?;
                let instance = T::construct(deps);
                Ok(if T::LIFETIME.is_controlled() {
                    InstanceSlot::shared(<T as Implements<I>>::upcast_rc(Rc::new(instance)))
                } else {
                    InstanceSlot::owned(<T as Implements<I>>::upcast(Box::new(instance)))
                })
            }),
            dependencies: <T::Deps as Dependencies>::declare(),
            concrete: type_name::<T>(),
        };
        self.types.insert(TypeKey::named::<I>(name), record)
    }

    /// Binds `T` to itself under the default name, without overrides.
    pub fn register_type<T: Injectable>(&mut self) -> bool {
        self.register::<T, T>("", Overrides::new())
    }

    /// Binds interface `I` under `name` to a factory closure.
    ///
    /// The closure resolves its own dependencies through the [`Injector`]
    /// and may fail with [`Injector::fail`].
    pub fn register_factory<I: ?Sized + 'static>(
        &mut self,
        name: &str,
        lifetime: Lifetime,
        overrides: Overrides,
        factory: impl Fn(&Injector<'_>) -> Result<Box<I>> + 'static,
    ) -> bool {
        let record = TypeRecord {
            lifetime,
            overrides,
            create: create_fn(move |injector| {
                let instance = factory(injector)?;
                Ok(if lifetime.is_controlled() {
                    InstanceSlot::shared(Rc::<I>::from(instance))
                } else {
                    InstanceSlot::owned(instance)
                })
            }),
            dependencies: Vec::new(),
            concrete: "<factory>",
        };
        self.types.insert(TypeKey::named::<I>(name), record)
    }

    /// Lets `provider` register its bindings.
    pub fn add_provider(&mut self, provider: &dyn Provider) -> &mut Self {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(self);
        self
    }

    // ── Resolution ──

    /// Resolves the default binding of `I` as a shared owner.
    pub fn resolve<I: ?Sized + 'static>(&self) -> Result<Rc<I>> {
        self.resolve_as::<I, Shared>("")
    }

    /// Resolves the binding of `I` named `name` as a shared owner.
    pub fn resolve_named<I: ?Sized + 'static>(&self, name: &str) -> Result<Rc<I>> {
        self.resolve_as::<I, Shared>(name)
    }

    /// Resolves the binding of `I` named `name` as the handle `W` names.
    ///
    /// ```rust,ignore
    /// let engine: &dyn Engine = container.resolve_as::<dyn Engine, Ref>("")?;
    /// let part: Box<Part> = container.resolve_as::<Part, Unique>("")?;
    /// ```
    #[instrument(
        level = "trace",
        name = "resolve",
        skip_all,
        fields(interface = type_name::<I>(), binding = name, wrapper = %W::KIND)
    )]
    pub fn resolve_as<I: ?Sized + 'static, W: Wrapper>(
        &self,
        name: &str,
    ) -> Result<W::Output<'_, I>> {
        let key = TypeKey::named::<I>(name);
        trace!(key = %key, "Resolving");

        let record = self.checked_record(&key, W::KIND)?;
        let slot = self.resolve_key(&key, record)?;
        W::cast::<I>(Instance::new(key, slot))
    }

    /// Binding name `key` resolves its dependency on `D` under.
    ///
    /// Empty when `key` is unregistered or has no override for `D`.
    pub fn override_for<D: ?Sized + 'static>(&self, key: &TypeKey) -> &str {
        self.override_for_identity(key, TypeIdentity::of::<D>())
    }

    pub(crate) fn override_for_identity(&self, key: &TypeKey, dependency: TypeIdentity) -> &str {
        self.types.override_for(key, dependency)
    }

    // ── Introspection ──

    /// Returns `true` if `I` is bound under `name`.
    pub fn contains<I: ?Sized + 'static>(&self, name: &str) -> bool {
        self.types.get(&TypeKey::named::<I>(name)).is_some()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Where `key` stands in its lifetime; `None` if it is not bound.
    pub fn instance_state(&self, key: &TypeKey) -> Option<InstanceState> {
        let record = self.types.get(key)?;
        Some(if record.lifetime.is_controlled() {
            self.instances.state(key)
        } else {
            InstanceState::Untracked
        })
    }

    /// Snapshot of every binding, ordered by key.
    pub fn bindings(&self) -> Vec<BindingInfo> {
        let mut records: Vec<_> = self.types.iter().collect();
        records.sort_by(|a, b| a.0.cmp(b.0));

        records
            .into_iter()
            .map(|(key, record)| BindingInfo {
                interface: short_type_name(key.type_name()),
                name: key.name().to_string(),
                concrete: short_type_name(record.concrete),
                lifetime: record.lifetime,
                state: self
                    .instance_state(key)
                    .unwrap_or(InstanceState::Uninstantiated),
                dependencies: record
                    .dependencies
                    .iter()
                    .map(|dep| DependencyBinding {
                        interface: short_type_name(dep.identity.type_name()),
                        name: self.override_for_identity(key, dep.identity).to_string(),
                        wrapper: dep.wrapper,
                    })
                    .collect(),
            })
            .collect()
    }

    // ── Internal ──

    /// Looks up `key` and checks `kind` against its lifetime.
    fn checked_record(&self, key: &TypeKey, kind: WrapperKind) -> Result<&TypeRecord> {
        let record = self
            .types
            .get(key)
            .ok_or_else(|| self.not_registered(key))?;

        if !record.lifetime.permits(kind) {
            return Err(ContainerError::IncompatibleWrapper(IncompatibleWrapperError {
                key: key.clone(),
                lifetime: record.lifetime,
                requested: kind,
            }));
        }
        Ok(record)
    }

    /// Runs the lifetime state machine for `key`.
    fn resolve_key(&self, key: &TypeKey, record: &TypeRecord) -> Result<InstanceSlot> {
        let lifetime = record.lifetime;
        if !lifetime.is_controlled() {
            return self.construct(key, record);
        }

        match (lifetime, self.instances.probe(key)) {
            (_, None) => self.construct_tracked(key, record),
            (Lifetime::Singleton, Some(Probe::Owned(shared))) => Ok(InstanceSlot::Shared(shared)),
            (Lifetime::ReferenceCounting, Some(Probe::Alive(shared))) => {
                Ok(InstanceSlot::Shared(shared))
            }
            (Lifetime::ReferenceCounting, Some(Probe::Expired)) => {
                debug!(key = %key, "Instance expired, rebuilding");
                self.construct_tracked(key, record)
            }
            (_, Some(probe)) => Err(ContainerError::inconsistent(
                key,
                format!("{lifetime} binding holds a {}", probe.tag()),
            )),
        }
    }

    /// Builds a controlled instance and stores what its lifetime keeps.
    fn construct_tracked(&self, key: &TypeKey, record: &TypeRecord) -> Result<InstanceSlot> {
        let shared = match self.construct(key, record)? {
            InstanceSlot::Shared(shared) => shared,
            other => {
                return Err(ContainerError::inconsistent(
                    key,
                    format!("{} binding built a {} handle", record.lifetime, other.tag()),
                ));
            }
        };
        let stored = match record.lifetime {
            Lifetime::ReferenceCounting => InstanceSlot::Weak(shared.downgrade()),
            _ => InstanceSlot::Shared(shared.clone_handle()),
        };
        self.instances.commit(key.clone(), stored);
        Ok(InstanceSlot::Shared(shared))
    }

    fn construct(&self, key: &TypeKey, record: &TypeRecord) -> Result<InstanceSlot> {
        let _frame = PathFrame::enter(&self.path, key);
        debug!(
            key = %key,
            concrete = record.concrete,
            lifetime = %record.lifetime,
            "Constructing instance"
        );

        let injector = Injector::new(self, key.clone());
        (record.create)(&injector)
    }

    fn not_registered(&self, key: &TypeKey) -> ContainerError {
        ContainerError::NotRegistered(NotRegisteredError {
            requested: key.clone(),
            path: self.path.borrow().clone(),
            suggestions: closest_labels(&key.label(), &self.types.labels(), self.max_suggestions),
        })
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.types.len())
            .field("instances", &self.instances.len())
            .finish()
    }
}

fn create_fn<F>(create: F) -> CreateFn
where
    F: Fn(&Injector<'_>) -> Result<InstanceSlot> + 'static,
{
    Rc::new(create)
}

/// Keeps `key` on the construction path until dropped.
struct PathFrame<'a> {
    path: &'a RefCell<Vec<TypeKey>>,
}

impl<'a> PathFrame<'a> {
    fn enter(path: &'a RefCell<Vec<TypeKey>>, key: &TypeKey) -> Self {
        path.borrow_mut().push(key.clone());
        Self { path }
    }
}

impl Drop for PathFrame<'_> {
    fn drop(&mut self) {
        self.path.borrow_mut().pop();
    }
}

// ============================================================
// Introspection records
// ============================================================

/// One binding as reported by [`Container::bindings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingInfo {
    pub interface: String,
    pub name: String,
    pub concrete: String,
    pub lifetime: Lifetime,
    pub state: InstanceState,
    pub dependencies: Vec<DependencyBinding>,
}

/// A declared dependency and the binding name it resolves under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyBinding {
    pub interface: String,
    pub name: String,
    pub wrapper: WrapperKind,
}

// ============================================================
// Prelude
// ============================================================

pub mod prelude {
    pub use super::{BindingInfo, Container, ContainerBuilder};
    pub use crate::error::{ContainerError, Result};
    pub use crate::identity::{TypeIdentity, type_identity};
    pub use crate::implements;
    pub use crate::inject::{Dep, Implements, Injectable, Injector, Resolved};
    pub use crate::key::TypeKey;
    pub use crate::lifetime::Lifetime;
    pub use crate::provider::Provider;
    pub use crate::registry::Overrides;
    pub use crate::slot::InstanceState;
    pub use crate::wrapper::{Raw, Ref, Shared, Unique, Weak};
}

// ============================================================
// Tests
// ============================================================
