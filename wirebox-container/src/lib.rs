//! Core container implementation for Wirebox DI.

pub mod container;
pub mod error;
pub mod identity;
pub mod inject;
pub mod key;
pub mod lifetime;
pub mod provider;
pub mod registry;
mod slot;
pub mod wrapper;

pub use container::{BindingInfo, Container, ContainerBuilder, DependencyBinding, prelude};
pub use error::{ContainerError, Result};
pub use identity::{TypeIdentity, type_identity};
pub use inject::{Dep, Dependencies, Implements, Injectable, Injector, Resolved};
pub use key::TypeKey;
pub use lifetime::Lifetime;
pub use provider::Provider;
pub use registry::Overrides;
pub use slot::InstanceState;
pub use wrapper::{Raw, Ref, Shared, Unique, Weak, Wrapper, WrapperKind};
