//! Ownership handles a caller can ask for.
//!
//! | Marker      | Handle          | Meaning                                   |
//! |-------------|-----------------|-------------------------------------------|
//! | [`Unique`]  | `Box<I>`        | sole owner, drops the instance on release |
//! | [`Shared`]  | `Rc<I>`         | reference-counted owner                   |
//! | [`Weak`]    | `rc::Weak<I>`   | non-owning, upgradeable observer          |
//! | [`Raw`]     | `*const I`      | non-owning address, no lifetime guarantee |
//! | [`Ref`]     | `&'container I` | non-owning reference, tied to the container |
//!
//! Only raw, shared and weak handles are ever stored; exclusive owners and
//! references are derived when a caller asks for them.
//!
//! A raw pointer to a `NotControlled` instance is the only owner of that
//! instance. Release it with `Box::from_raw(ptr.cast_mut())`.

use std::any::type_name;
use std::fmt;
use std::rc::{self, Rc};

use serde::Serialize;

use crate::error::{ContainerError, Result};
use crate::key::TypeKey;
use crate::slot::{InstanceSlot, SharedHandle, WeakHandle};

/// The kind of ownership handle requested from the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WrapperKind {
    Unique,
    Shared,
    Weak,
    Raw,
    Reference,
}

impl WrapperKind {
    pub const ALL: [WrapperKind; 5] = [
        WrapperKind::Unique,
        WrapperKind::Shared,
        WrapperKind::Weak,
        WrapperKind::Raw,
        WrapperKind::Reference,
    ];
}

impl fmt::Display for WrapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrapperKind::Unique => write!(f, "exclusive owner"),
            WrapperKind::Shared => write!(f, "shared owner"),
            WrapperKind::Weak => write!(f, "weak observer"),
            WrapperKind::Raw => write!(f, "raw pointer"),
            WrapperKind::Reference => write!(f, "bound reference"),
        }
    }
}

/// A resolved instance on its way to the caller.
///
/// Produced by the resolution algorithm and consumed by [`Wrapper::cast`];
/// it cannot be built or inspected outside this crate.
#[doc(hidden)]
pub struct Instance {
    key: TypeKey,
    slot: InstanceSlot,
}

impl Instance {
    pub(crate) fn new(key: TypeKey, slot: InstanceSlot) -> Self {
        Self { key, slot }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Unique {}
    impl Sealed for super::Shared {}
    impl Sealed for super::Weak {}
    impl Sealed for super::Raw {}
    impl Sealed for super::Ref {}
}

/// Type-level choice of ownership handle.
///
/// Implemented by the five marker types of this module only.
pub trait Wrapper: sealed::Sealed + 'static {
    const KIND: WrapperKind;

    /// The handle handed to the caller for interface `I`.
    type Output<'c, I: ?Sized + 'static>;

    #[doc(hidden)]
    fn cast<'c, I: ?Sized + 'static>(instance: Instance) -> Result<Self::Output<'c, I>>;
}

/// Exclusive owner: `Box<I>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unique;

/// Shared owner: `Rc<I>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shared;

/// Weak observer: `rc::Weak<I>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Weak;

/// Raw non-owning pointer: `*const I`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

/// Bound reference: `&'container I`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ref;

impl Wrapper for Unique {
    const KIND: WrapperKind = WrapperKind::Unique;
    type Output<'c, I: ?Sized + 'static> = Box<I>;

    fn cast<'c, I: ?Sized + 'static>(instance: Instance) -> Result<Self::Output<'c, I>> {
        let Instance { key, slot } = instance;
        match slot {
            InstanceSlot::Raw(owned) => take_box::<I>(&key, owned.into_any()),
            other => Err(uncastable(&key, &other, Self::KIND)),
        }
    }
}

impl Wrapper for Shared {
    const KIND: WrapperKind = WrapperKind::Shared;
    type Output<'c, I: ?Sized + 'static> = Rc<I>;

    fn cast<'c, I: ?Sized + 'static>(instance: Instance) -> Result<Self::Output<'c, I>> {
        let Instance { key, slot } = instance;
        match slot {
            InstanceSlot::Raw(owned) => take_box::<I>(&key, owned.into_any()).map(Rc::from),
            InstanceSlot::Shared(shared) => shared_rc::<I>(&key, &*shared).map(Rc::clone),
            InstanceSlot::Weak(weak) => weak_rc::<I>(&key, &*weak)?.upgrade().ok_or_else(|| {
                ContainerError::inconsistent(&key, "observed instance expired before hand-off")
            }),
        }
    }
}

impl Wrapper for Weak {
    const KIND: WrapperKind = WrapperKind::Weak;
    type Output<'c, I: ?Sized + 'static> = rc::Weak<I>;

    fn cast<'c, I: ?Sized + 'static>(instance: Instance) -> Result<Self::Output<'c, I>> {
        let Instance { key, slot } = instance;
        match slot {
            InstanceSlot::Shared(shared) => shared_rc::<I>(&key, &*shared).map(Rc::downgrade),
            InstanceSlot::Weak(weak) => weak_rc::<I>(&key, &*weak).map(rc::Weak::clone),
            other => Err(uncastable(&key, &other, Self::KIND)),
        }
    }
}

impl Wrapper for Raw {
    const KIND: WrapperKind = WrapperKind::Raw;
    type Output<'c, I: ?Sized + 'static> = *const I;

    fn cast<'c, I: ?Sized + 'static>(instance: Instance) -> Result<Self::Output<'c, I>> {
        let Instance { key, slot } = instance;
        match slot {
            InstanceSlot::Raw(owned) => {
                take_box::<I>(&key, owned.into_any()).map(|boxed| Box::into_raw(boxed).cast_const())
            }
            InstanceSlot::Shared(shared) => shared_rc::<I>(&key, &*shared).map(Rc::as_ptr),
            other => Err(uncastable(&key, &other, Self::KIND)),
        }
    }
}

impl Wrapper for Ref {
    const KIND: WrapperKind = WrapperKind::Reference;
    type Output<'c, I: ?Sized + 'static> = &'c I;

    fn cast<'c, I: ?Sized + 'static>(instance: Instance) -> Result<Self::Output<'c, I>> {
        let Instance { key, slot } = instance;
        match slot {
            InstanceSlot::Shared(shared) => {
                let ptr = Rc::as_ptr(shared_rc::<I>(&key, &*shared)?);
                // SAFETY: references are only handed out for Singleton bindings.
                // Their slot keeps a strong owner that is never replaced or
                // removed until the container drops, and `'c` borrows the container.
                Ok(unsafe { &*ptr })
            }
            other => Err(uncastable(&key, &other, Self::KIND)),
        }
    }
}

fn take_box<I: ?Sized + 'static>(key: &TypeKey, any: Box<dyn std::any::Any>) -> Result<Box<I>> {
    any.downcast::<Box<I>>()
        .map(|boxed| *boxed)
        .map_err(|_| mismatch::<I>(key, "raw"))
}

fn shared_rc<'a, I: ?Sized + 'static>(key: &TypeKey, shared: &'a dyn SharedHandle) -> Result<&'a Rc<I>> {
    shared
        .as_any()
        .downcast_ref::<Rc<I>>()
        .ok_or_else(|| mismatch::<I>(key, "shared"))
}

fn weak_rc<'a, I: ?Sized + 'static>(key: &TypeKey, weak: &'a dyn WeakHandle) -> Result<&'a rc::Weak<I>> {
    weak.as_any()
        .downcast_ref::<rc::Weak<I>>()
        .ok_or_else(|| mismatch::<I>(key, "weak"))
}

fn mismatch<I: ?Sized>(key: &TypeKey, tag: &str) -> ContainerError {
    ContainerError::inconsistent(
        key,
        format!("stored {tag} handle does not hold {}", type_name::<I>()),
    )
}

fn uncastable(key: &TypeKey, slot: &InstanceSlot, kind: WrapperKind) -> ContainerError {
    ContainerError::inconsistent(
        key,
        format!("a {kind} cannot be derived from a {} handle", slot.tag()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::Owned;

    trait Counter {
        fn value(&self) -> u32;
    }

    struct Fixed(u32);

    impl Counter for Fixed {
        fn value(&self) -> u32 {
            self.0
        }
    }

    fn key() -> TypeKey {
        TypeKey::of::<dyn Counter>()
    }

    fn raw(value: u32) -> Instance {
        let boxed: Box<dyn Counter> = Box::new(Fixed(value));
        Instance::new(key(), InstanceSlot::Raw(Owned::erase(boxed)))
    }

    fn shared(rc: &Rc<dyn Counter>) -> Instance {
        Instance::new(key(), InstanceSlot::Shared(Box::new(Rc::clone(rc))))
    }

    #[test]
    fn raw_casts_to_every_owning_kind() {
        let unique = Unique::cast::<dyn Counter>(raw(1)).unwrap();
        assert_eq!(unique.value(), 1);

        let shared = Shared::cast::<dyn Counter>(raw(2)).unwrap();
        assert_eq!(shared.value(), 2);
        assert_eq!(Rc::strong_count(&shared), 1);

        let ptr = Raw::cast::<dyn Counter>(raw(3)).unwrap();
        let reclaimed = unsafe { Box::from_raw(ptr.cast_mut()) };
        assert_eq!(reclaimed.value(), 3);
    }

    #[test]
    fn shared_casts_keep_address() {
        let owner: Rc<dyn Counter> = Rc::new(Fixed(7));
        let address = Rc::as_ptr(&owner) as *const ();

        let again = Shared::cast::<dyn Counter>(shared(&owner)).unwrap();
        let weak = Weak::cast::<dyn Counter>(shared(&owner)).unwrap();
        let ptr = Raw::cast::<dyn Counter>(shared(&owner)).unwrap();
        let reference = Ref::cast::<dyn Counter>(shared(&owner)).unwrap();

        assert_eq!(Rc::as_ptr(&again) as *const (), address);
        assert_eq!(weak.as_ptr() as *const (), address);
        assert_eq!(ptr as *const (), address);
        assert_eq!(reference as *const dyn Counter as *const (), address);
        assert_eq!(reference.value(), 7);
    }

    #[test]
    fn weak_upgrades_to_shared() {
        let owner: Rc<dyn Counter> = Rc::new(Fixed(9));
        let observed = Instance::new(key(), InstanceSlot::Weak(Box::new(Rc::downgrade(&owner))));

        let upgraded = Shared::cast::<dyn Counter>(observed).unwrap();
        assert!(Rc::ptr_eq(&upgraded, &owner));
    }

    #[test]
    fn expired_weak_is_inconsistent() {
        let owner: Rc<dyn Counter> = Rc::new(Fixed(9));
        let observed = Instance::new(key(), InstanceSlot::Weak(Box::new(Rc::downgrade(&owner))));
        drop(owner);

        let err = Shared::cast::<dyn Counter>(observed).err().unwrap();
        assert!(matches!(err, ContainerError::InternalInconsistency { .. }));
    }

    #[test]
    fn underivable_combinations_are_inconsistent() {
        let owner: Rc<dyn Counter> = Rc::new(Fixed(1));

        assert!(matches!(
            Unique::cast::<dyn Counter>(shared(&owner)),
            Err(ContainerError::InternalInconsistency { .. })
        ));
        assert!(matches!(
            Ref::cast::<dyn Counter>(raw(1)),
            Err(ContainerError::InternalInconsistency { .. })
        ));
        assert!(matches!(
            Weak::cast::<dyn Counter>(raw(1)),
            Err(ContainerError::InternalInconsistency { .. })
        ));
    }

    #[test]
    fn wrong_interface_is_inconsistent() {
        let err = Shared::cast::<Fixed>(raw(1)).err().unwrap();
        assert!(err.to_string().contains("does not hold"));
    }

    #[test]
    fn kinds_display() {
        assert_eq!(Unique::KIND.to_string(), "exclusive owner");
        assert_eq!(Ref::KIND.to_string(), "bound reference");
        assert_eq!(WrapperKind::ALL.len(), 5);
    }
}
