//! Declared dependencies and the injector handed to factories.
//!
//! A concrete type becomes registrable by implementing [`Injectable`]: it
//! names its lifetime, lists its dependencies as a tuple of [`Dep`]
//! declarations and builds itself from the resolved handles.
//!
//! ```rust
//! use std::rc::Rc;
//! use wirebox_container::prelude::*;
//!
//! trait Audio {
//!     fn play(&self) -> String;
//! }
//!
//! struct Alsa;
//!
//! impl Audio for Alsa {
//!     fn play(&self) -> String {
//!         "alsa".into()
//!     }
//! }
//!
//! impl Injectable for Alsa {
//!     const LIFETIME: Lifetime = Lifetime::Singleton;
//!     type Deps = ();
//!
//!     fn construct(_: Resolved<'_, Self::Deps>) -> Self {
//!         Alsa
//!     }
//! }
//!
//! implements!(Alsa => dyn Audio);
//!
//! struct Button {
//!     audio: Rc<dyn Audio>,
//! }
//!
//! impl Injectable for Button {
//!     const LIFETIME: Lifetime = Lifetime::NotControlled;
//!     type Deps = (Dep<dyn Audio>,);
//!
//!     fn construct(deps: Resolved<'_, Self::Deps>) -> Self {
//!         let (audio,) = deps;
//!         Button { audio }
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.register::<Alsa, dyn Audio>("", Overrides::new());
//! container.register_type::<Button>();
//!
//! let button = container.resolve::<Button>().unwrap();
//! assert_eq!(button.audio.play(), "alsa");
//! ```

use std::error::Error;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::container::Container;
use crate::error::{ContainerError, Result};
use crate::identity::TypeIdentity;
use crate::key::TypeKey;
use crate::lifetime::Lifetime;
use crate::wrapper::{Shared, Wrapper, WrapperKind};

/// A concrete type the container can build on its own.
///
/// The container has no separate teardown hook. Releasing the last owner
/// drops the instance, so custom cleanup belongs in the type's `Drop` impl.
pub trait Injectable: Sized + 'static {
    /// How the container manages instances of this type.
    const LIFETIME: Lifetime;

    /// Dependencies resolved before [`construct`](Injectable::construct),
    /// in declaration order.
    type Deps: Dependencies;

    fn construct(deps: Resolved<'_, Self::Deps>) -> Self;
}

/// Resolved handles of a dependency list.
pub type Resolved<'c, D> = <D as Dependencies>::Resolved<'c>;

/// An ordered list of dependency declarations.
///
/// Implemented for `()`, for [`Dep`] and for tuples of up to eight lists.
pub trait Dependencies: 'static {
    type Resolved<'c>;

    fn resolve<'c>(injector: &Injector<'c>) -> Result<Self::Resolved<'c>>;

    fn declare() -> Vec<DependencyInfo>;
}

/// One dependency on interface `I`, delivered as the handle `W` names.
pub struct Dep<I: ?Sized, W = Shared>(PhantomData<(fn() -> *const I, W)>);

/// A declared dependency, as recorded on its consumer's binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyInfo {
    pub identity: TypeIdentity,
    pub wrapper: WrapperKind,
}

impl Dependencies for () {
    type Resolved<'c> = ();

    fn resolve<'c>(_: &Injector<'c>) -> Result<()> {
        Ok(())
    }

    fn declare() -> Vec<DependencyInfo> {
        Vec::new()
    }
}

impl<I: ?Sized + 'static, W: Wrapper> Dependencies for Dep<I, W> {
    type Resolved<'c> = W::Output<'c, I>;

    fn resolve<'c>(injector: &Injector<'c>) -> Result<Self::Resolved<'c>> {
        injector.resolve::<I, W>()
    }

    fn declare() -> Vec<DependencyInfo> {
        vec![DependencyInfo {
            identity: TypeIdentity::of::<I>(),
            wrapper: W::KIND,
        }]
    }
}

macro_rules! impl_dependencies_tuple {
    ($($list:ident),+) => {
        impl<$($list: Dependencies),+> Dependencies for ($($list,)+) {
            type Resolved<'c> = ($($list::Resolved<'c>,)+);

            fn resolve<'c>(injector: &Injector<'c>) -> Result<Self::Resolved<'c>> {
                Ok(($($list::resolve(injector)?,)+))
            }

            fn declare() -> Vec<DependencyInfo> {
                let mut declared = Vec::new();
                $(declared.extend($list::declare());)+
                declared
            }
        }
    };
}

impl_dependencies_tuple!(A);
impl_dependencies_tuple!(A, B);
impl_dependencies_tuple!(A, B, C);
impl_dependencies_tuple!(A, B, C, D);
impl_dependencies_tuple!(A, B, C, D, E);
impl_dependencies_tuple!(A, B, C, D, E, F);
impl_dependencies_tuple!(A, B, C, D, E, F, G);
impl_dependencies_tuple!(A, B, C, D, E, F, G, H);

/// Conversion of a boxed concrete type into its interface.
///
/// Every type implements its own identity; use [`implements!`](crate::implements)
/// for trait objects.
///
/// Tracked instances are upcast through [`upcast_rc`](Implements::upcast_rc)
/// so they stay in the allocation they were built in.
pub trait Implements<I: ?Sized + 'static>: 'static {
    fn upcast(self: Box<Self>) -> Box<I>;

    fn upcast_rc(self: Rc<Self>) -> Rc<I>;
}

impl<T: 'static> Implements<T> for T {
    fn upcast(self: Box<Self>) -> Box<T> {
        self
    }

    fn upcast_rc(self: Rc<Self>) -> Rc<T> {
        self
    }
}

/// Declares that a concrete type can be bound to one or more interfaces.
///
/// ```rust
/// use wirebox_container::implements;
///
/// trait Audio {}
/// trait Device {}
///
/// struct Alsa;
/// impl Audio for Alsa {}
/// impl Device for Alsa {}
///
/// implements!(Alsa => dyn Audio, dyn Device);
/// ```
#[macro_export]
macro_rules! implements {
    ($ty:ty => $($iface:ty),+ $(,)?) => {
        $(
            impl $crate::inject::Implements<$iface> for $ty {
                fn upcast(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<$iface> {
                    self
                }

                fn upcast_rc(self: ::std::rc::Rc<Self>) -> ::std::rc::Rc<$iface> {
                    self
                }
            }
        )+
    };
}

/// Resolves dependencies on behalf of the binding under construction.
///
/// Lookups go through the binding's overrides first, so a consumer
/// registered with `Overrides::new().with::<dyn Audio>("Linux")` receives
/// the `"Linux"` binding whenever it asks for `dyn Audio`.
pub struct Injector<'c> {
    container: &'c Container,
    key: TypeKey,
}

impl<'c> Injector<'c> {
    pub(crate) fn new(container: &'c Container, key: TypeKey) -> Self {
        Self { container, key }
    }

    /// The binding being constructed.
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Resolves `I` as the handle `W` names, honouring overrides.
    pub fn resolve<I: ?Sized + 'static, W: Wrapper>(&self) -> Result<W::Output<'c, I>> {
        let container = self.container;
        let name = container.override_for_identity(&self.key, TypeIdentity::of::<I>());
        container.resolve_as::<I, W>(name)
    }

    /// Resolves `I` as a shared owner.
    pub fn shared<I: ?Sized + 'static>(&self) -> Result<Rc<I>> {
        self.resolve::<I, Shared>()
    }

    /// Reports a factory's own failure for the binding being constructed.
    pub fn fail(&self, source: impl Into<Box<dyn Error + Send + Sync>>) -> ContainerError {
        ContainerError::construction(&self.key, source)
    }
}
