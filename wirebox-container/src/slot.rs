//! Type-erased instance storage.
//!
//! The resolution algorithm works without knowing the interface type, so
//! instances travel as one of three erased handles:
//!
//! ```text
//! Raw     Box<I>        freshly constructed, owned by whoever takes it
//! Shared  Rc<I>         strong owner
//! Weak    rc::Weak<I>   observer, upgradeable while an owner lives
//! ```
//!
//! Each erased handle still knows its concrete `I`, so a typed caller can
//! downcast it back through [`Any`].

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{self, Rc};

use serde::Serialize;

use crate::key::TypeKey;

/// A freshly constructed NotControlled instance, erased from [`Owned<I>`].
pub(crate) trait OwnedHandle {
    /// Returns the inner `Box<I>` for downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn address(&self) -> *const ();
}

/// A strong owner, erased from `Rc<I>`.
pub(crate) trait SharedHandle {
    fn as_any(&self) -> &dyn Any;

    fn clone_handle(&self) -> Box<dyn SharedHandle>;

    fn downgrade(&self) -> Box<dyn WeakHandle>;

    fn address(&self) -> *const ();
}

/// A weak observer, erased from `rc::Weak<I>`.
pub(crate) trait WeakHandle {
    fn as_any(&self) -> &dyn Any;

    /// Returns a strong owner, or `None` once the instance is gone.
    fn upgrade(&self) -> Option<Box<dyn SharedHandle>>;

    fn is_expired(&self) -> bool;
}

/// Owner of a freshly built `Box<I>`.
///
/// A newtype rather than an impl on `Box<I>` itself, which would also cover
/// `Box<dyn OwnedHandle>` and shadow the trait object's own methods.
pub(crate) struct Owned<I: ?Sized>(Box<I>);

impl<I: ?Sized + 'static> Owned<I> {
    pub fn erase(instance: Box<I>) -> Box<dyn OwnedHandle> {
        Box::new(Owned(instance))
    }
}

impl<I: ?Sized + 'static> OwnedHandle for Owned<I> {
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        Box::new(self.0)
    }

    fn address(&self) -> *const () {
        &*self.0 as *const I as *const ()
    }
}

impl<I: ?Sized + 'static> SharedHandle for Rc<I> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_handle(&self) -> Box<dyn SharedHandle> {
        Box::new(Rc::clone(self))
    }

    fn downgrade(&self) -> Box<dyn WeakHandle> {
        Box::new(Rc::downgrade(self))
    }

    fn address(&self) -> *const () {
        Rc::as_ptr(self) as *const ()
    }
}

impl<I: ?Sized + 'static> WeakHandle for rc::Weak<I> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn upgrade(&self) -> Option<Box<dyn SharedHandle>> {
        rc::Weak::upgrade(self).map(|shared| Box::new(shared) as Box<dyn SharedHandle>)
    }

    fn is_expired(&self) -> bool {
        self.strong_count() == 0
    }
}

/// Erased ownership handle: the stored form of an instance and the form
/// the resolution algorithm hands to the casting step.
pub(crate) enum InstanceSlot {
    Raw(Box<dyn OwnedHandle>),
    Shared(Box<dyn SharedHandle>),
    Weak(Box<dyn WeakHandle>),
}

impl InstanceSlot {
    /// A caller-owned instance.
    pub fn owned<I: ?Sized + 'static>(instance: Box<I>) -> Self {
        InstanceSlot::Raw(Owned::erase(instance))
    }

    /// A tracked instance. It stays in the `Rc` allocation it was built in
    /// for its whole life.
    pub fn shared<I: ?Sized + 'static>(instance: Rc<I>) -> Self {
        InstanceSlot::Shared(Box::new(instance))
    }

    /// Short tag for messages.
    pub fn tag(&self) -> &'static str {
        match self {
            InstanceSlot::Raw(_) => "raw",
            InstanceSlot::Shared(_) => "shared",
            InstanceSlot::Weak(_) => "weak",
        }
    }
}

impl fmt::Debug for InstanceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceSlot::Raw(owned) => write!(f, "Raw({:p})", owned.address()),
            InstanceSlot::Shared(shared) => write!(f, "Shared({:p})", shared.address()),
            InstanceSlot::Weak(weak) if weak.is_expired() => write!(f, "Weak(expired)"),
            InstanceSlot::Weak(_) => write!(f, "Weak(alive)"),
        }
    }
}

/// What a slot holds right now, read without keeping the registry borrowed.
pub(crate) enum Probe {
    /// The slot owns the instance.
    Owned(Box<dyn SharedHandle>),
    /// The slot observes a live instance; carries a fresh strong owner.
    Alive(Box<dyn SharedHandle>),
    /// The slot observes an instance that has been dropped.
    Expired,
    /// The slot holds a raw instance, which no lifetime ever stores.
    Raw,
}

impl Probe {
    pub fn tag(&self) -> &'static str {
        match self {
            Probe::Owned(_) => "shared owner",
            Probe::Alive(_) => "live weak observer",
            Probe::Expired => "expired weak observer",
            Probe::Raw => "raw instance",
        }
    }
}

/// Observable state of a binding's instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstanceState {
    /// NotControlled binding; the container never tracks instances.
    Untracked,
    /// Controlled binding that has not been resolved yet.
    Uninstantiated,
    /// A live instance is cached or observed.
    Alive,
    /// The observed instance was dropped; the next resolve rebuilds it.
    Expired,
}

/// Per-key cached handles for Singleton and ReferenceCounting bindings.
///
/// Borrows of the inner map never outlive a single method call, so the
/// resolution algorithm may recurse into the registry while constructing.
#[derive(Default)]
pub(crate) struct InstanceRegistry {
    slots: RefCell<HashMap<TypeKey, InstanceSlot>>,
}

impl InstanceRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: RefCell::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Reads the slot for `key`; `None` means uninstantiated.
    pub fn probe(&self, key: &TypeKey) -> Option<Probe> {
        let slots = self.slots.borrow();
        let probe = match slots.get(key)? {
            InstanceSlot::Shared(shared) => Probe::Owned(shared.clone_handle()),
            InstanceSlot::Weak(weak) => match weak.upgrade() {
                Some(shared) => Probe::Alive(shared),
                None => Probe::Expired,
            },
            InstanceSlot::Raw(_) => Probe::Raw,
        };
        Some(probe)
    }

    /// Stores `slot` for `key`, replacing whatever was there.
    pub fn commit(&self, key: TypeKey, slot: InstanceSlot) {
        self.slots.borrow_mut().insert(key, slot);
    }

    pub fn state(&self, key: &TypeKey) -> InstanceState {
        match self.slots.borrow().get(key) {
            None => InstanceState::Uninstantiated,
            Some(InstanceSlot::Weak(weak)) if weak.is_expired() => InstanceState::Expired,
            Some(_) => InstanceState::Alive,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }
}

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.slots.borrow().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {
        fn greet(&self) -> String;
    }

    struct English(u8);

    impl Greeter for English {
        fn greet(&self) -> String {
            format!("hello #{}", self.0)
        }
    }

    fn owned() -> Box<dyn OwnedHandle> {
        let instance: Box<dyn Greeter> = Box::new(English(1));
        Owned::erase(instance)
    }

    fn shared() -> Box<dyn SharedHandle> {
        let instance: Rc<dyn Greeter> = Rc::new(English(2));
        Box::new(instance)
    }

    #[test]
    fn owned_downcasts_to_boxed_interface() {
        let any = owned().into_any();
        let boxed = any.downcast::<Box<dyn Greeter>>().ok().unwrap();
        assert_eq!(boxed.greet(), "hello #1");
    }

    #[test]
    fn shared_slot_keeps_allocation() {
        let instance: Rc<dyn Greeter> = Rc::new(English(3));
        let address = Rc::as_ptr(&instance) as *const ();

        let registry = InstanceRegistry::default();
        let key = TypeKey::of::<dyn Greeter>();
        registry.commit(key.clone(), InstanceSlot::shared(Rc::clone(&instance)));

        match registry.probe(&key) {
            Some(Probe::Owned(stored)) => {
                assert_eq!(stored.address(), address);
                let rc = stored.as_any().downcast_ref::<Rc<dyn Greeter>>().unwrap();
                assert!(Rc::ptr_eq(rc, &instance));
            }
            other => panic!("Expected a shared owner, got: {:?}", other.map(|p| p.tag())),
        }
    }

    #[test]
    fn owned_slot_is_raw() {
        let slot = InstanceSlot::owned::<dyn Greeter>(Box::new(English(4)));
        assert_eq!(slot.tag(), "raw");
    }

    #[test]
    fn weak_handle_expires_with_last_owner() {
        let shared = shared();
        let weak = shared.downgrade();
        assert!(!weak.is_expired());
        assert!(weak.upgrade().is_some());

        drop(shared);
        assert!(weak.is_expired());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn registry_probe_states() {
        let registry = InstanceRegistry::default();
        let owner = TypeKey::named::<dyn Greeter>("owner");
        let observer = TypeKey::named::<dyn Greeter>("observer");

        assert!(registry.probe(&owner).is_none());
        assert_eq!(registry.state(&owner), InstanceState::Uninstantiated);

        let shared = shared();
        registry.commit(owner.clone(), InstanceSlot::Shared(shared.clone_handle()));
        registry.commit(observer.clone(), InstanceSlot::Weak(shared.downgrade()));

        assert!(matches!(registry.probe(&owner), Some(Probe::Owned(_))));
        assert!(matches!(registry.probe(&observer), Some(Probe::Alive(_))));
        assert_eq!(registry.state(&observer), InstanceState::Alive);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_reports_expired_observer() {
        let registry = InstanceRegistry::default();
        let key = TypeKey::of::<dyn Greeter>();

        let shared = shared();
        registry.commit(key.clone(), InstanceSlot::Weak(shared.downgrade()));
        drop(shared);

        assert!(matches!(registry.probe(&key), Some(Probe::Expired)));
        assert_eq!(registry.state(&key), InstanceState::Expired);
    }

    #[test]
    fn slot_debug_shows_tag() {
        let shared = shared();
        let slot = InstanceSlot::Weak(shared.downgrade());
        assert_eq!(format!("{slot:?}"), "Weak(alive)");
        assert_eq!(slot.tag(), "weak");
    }
}
