//! Provider trait: a module of related registrations.
//!
//! Providers group the bindings of one area of an application so they can
//! be installed together.
//!
//! # Examples
//! ```rust
//! use wirebox_container::prelude::*;
//!
//! struct Settings {
//!     verbose: bool,
//! }
//!
//! struct SettingsProvider;
//!
//! impl Provider for SettingsProvider {
//!     fn register(&self, container: &mut Container) {
//!         container.register_factory::<Settings>("", Lifetime::Singleton, Overrides::new(), |_| {
//!             Ok(Box::new(Settings { verbose: true }))
//!         });
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.add_provider(&SettingsProvider);
//! assert!(container.resolve::<Settings>().unwrap().verbose);
//! ```

use crate::container::Container;

/// A module that registers related bindings into a container.
///
/// Split registrations by concern instead of keeping one long block:
///
/// ```rust,ignore
/// container
///     .add_provider(&AudioProvider)
///     .add_provider(&InputProvider);
/// ```
pub trait Provider {
    /// Registers this module's bindings.
    ///
    /// Bindings that already exist are left untouched, so installing a
    /// provider twice is harmless.
    fn register(&self, container: &mut Container);

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
