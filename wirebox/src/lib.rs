//! # Wirebox: a lifetime-aware dependency injection container
//!
//! Bind concrete types to interfaces, pick how the container manages each
//! binding, and ask for whichever ownership handle the binding allows.
//!
//! | Lifetime            | Instances                                  | Handles                        |
//! |---------------------|--------------------------------------------|--------------------------------|
//! | `Singleton`         | one, kept until the container drops        | `Rc`, `Weak`, `*const`, `&`    |
//! | `ReferenceCounting` | one live at a time, rebuilt after expiry    | `Rc`, `Weak`                   |
//! | `NotControlled`     | a fresh one per resolve, owned by the caller | `Box`, `Rc`, `*const`         |
//!
//! ```rust
//! use std::rc::Rc;
//! use wirebox::prelude::*;
//!
//! trait Audio {
//!     fn backend(&self) -> &'static str;
//! }
//!
//! struct DirectX;
//! struct Alsa;
//!
//! impl Audio for DirectX {
//!     fn backend(&self) -> &'static str { "directx" }
//! }
//! impl Audio for Alsa {
//!     fn backend(&self) -> &'static str { "alsa" }
//! }
//!
//! impl Injectable for DirectX {
//!     const LIFETIME: Lifetime = Lifetime::Singleton;
//!     type Deps = ();
//!     fn construct(_: Resolved<'_, Self::Deps>) -> Self { DirectX }
//! }
//! impl Injectable for Alsa {
//!     const LIFETIME: Lifetime = Lifetime::Singleton;
//!     type Deps = ();
//!     fn construct(_: Resolved<'_, Self::Deps>) -> Self { Alsa }
//! }
//!
//! implements!(DirectX => dyn Audio);
//! implements!(Alsa => dyn Audio);
//!
//! struct Button {
//!     audio: Rc<dyn Audio>,
//! }
//!
//! impl Injectable for Button {
//!     const LIFETIME: Lifetime = Lifetime::NotControlled;
//!     type Deps = (Dep<dyn Audio>,);
//!     fn construct(deps: Resolved<'_, Self::Deps>) -> Self {
//!         let (audio,) = deps;
//!         Button { audio }
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.register::<DirectX, dyn Audio>("", Overrides::new());
//! container.register::<Alsa, dyn Audio>("Linux", Overrides::new());
//! container.register_type::<Button>();
//! container.register::<Button, Button>("Linux", Overrides::new().with::<dyn Audio>("Linux"));
//!
//! assert_eq!(container.resolve::<Button>().unwrap().audio.backend(), "directx");
//! assert_eq!(container.resolve_named::<Button>("Linux").unwrap().audio.backend(), "alsa");
//!
//! let owned: Box<Button> = container.resolve_as::<Button, Unique>("").unwrap();
//! assert_eq!(owned.audio.backend(), "directx");
//! ```

pub use wirebox_container::*;
pub use wirebox_support::*;
