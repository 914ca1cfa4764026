//! Error types for container operations.
//!
//! Every failure carries enough context to act on: which binding, which
//! chain of constructions needed it, and what is registered nearby.

use std::fmt;

use wirebox_support::rendering::render_path;

use crate::key::TypeKey;
use crate::lifetime::Lifetime;
use crate::wrapper::WrapperKind;

/// Main error type for all container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Requested binding was never registered.
    #[error("{}", .0)]
    NotRegistered(NotRegisteredError),

    /// Requested handle kind is not allowed for the binding's lifetime.
    #[error("{}", .0)]
    IncompatibleWrapper(IncompatibleWrapperError),

    /// A stored handle did not match what the binding's lifetime implies.
    ///
    /// Signals a defect in the container, not in the caller's wiring.
    #[error("Internal inconsistency for {key}: {detail}")]
    InternalInconsistency { key: TypeKey, detail: String },

    /// A factory closure reported its own failure.
    #[error("Failed to construct {key}: {source}")]
    ConstructionFailed {
        key: TypeKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ContainerError {
    pub(crate) fn inconsistent(key: &TypeKey, detail: impl Into<String>) -> Self {
        ContainerError::InternalInconsistency {
            key: key.clone(),
            detail: detail.into(),
        }
    }

    /// Wraps a factory's own error for the binding being constructed.
    pub fn construction(
        key: &TypeKey,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ContainerError::ConstructionFailed {
            key: key.clone(),
            source: source.into(),
        }
    }

    /// The binding the failure is about.
    pub fn key(&self) -> &TypeKey {
        match self {
            ContainerError::NotRegistered(err) => &err.requested,
            ContainerError::IncompatibleWrapper(err) => &err.key,
            ContainerError::InternalInconsistency { key, .. } => key,
            ContainerError::ConstructionFailed { key, .. } => key,
        }
    }
}

/// Error when a binding was not registered.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The binding that was requested.
    pub requested: TypeKey,
    /// Bindings under construction when the request was made, outermost first.
    pub path: Vec<TypeKey>,
    /// Labels of registered bindings that look alike.
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type is not registered: {}", self.requested)?;

        if !self.path.is_empty() {
            let mut chain: Vec<String> = self.path.iter().map(TypeKey::label).collect();
            chain.push(self.requested.label());
            write!(f, "\n  Required by: {}", render_path(&chain))?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: register it with Container::register before resolving"
        )
    }
}

/// Error when the requested handle kind conflicts with the lifetime.
#[derive(Debug)]
pub struct IncompatibleWrapperError {
    pub key: TypeKey,
    pub lifetime: Lifetime,
    pub requested: WrapperKind,
}

impl fmt::Display for IncompatibleWrapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot hand out a {} for {} ({} lifetime)",
            self.requested, self.key, self.lifetime,
        )?;

        let permitted: Vec<String> = self
            .lifetime
            .permitted()
            .iter()
            .map(ToString::to_string)
            .collect();
        write!(
            f,
            "\n  Hint: {} bindings can be resolved as {}",
            self.lifetime,
            permitted.join(", "),
        )
    }
}

/// Convenient Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Button;
    trait Audio {}

    #[test]
    fn not_registered_error_display() {
        let err = ContainerError::NotRegistered(NotRegisteredError {
            requested: TypeKey::named::<dyn Audio>("Linux"),
            path: vec![TypeKey::of::<Button>()],
            suggestions: vec!["dyn Audio".to_string()],
        });

        let msg = err.to_string();
        assert!(msg.contains("not registered"));
        assert!(msg.contains("Button → dyn Audio[\"Linux\"]"));
        assert!(msg.contains("- dyn Audio"));
    }

    #[test]
    fn top_level_not_registered_has_no_path() {
        let err = NotRegisteredError {
            requested: TypeKey::of::<Button>(),
            path: vec![],
            suggestions: vec![],
        };

        let msg = err.to_string();
        assert!(!msg.contains("Required by"));
        assert!(!msg.contains("Did you mean"));
    }

    #[test]
    fn incompatible_wrapper_error_display() {
        let err = ContainerError::IncompatibleWrapper(IncompatibleWrapperError {
            key: TypeKey::of::<Button>(),
            lifetime: Lifetime::ReferenceCounting,
            requested: WrapperKind::Raw,
        });

        let msg = err.to_string();
        assert!(msg.contains("raw pointer"));
        assert!(msg.contains("ReferenceCounting"));
        assert!(msg.contains("shared owner, weak observer"));
    }

    #[test]
    fn construction_failed_keeps_source() {
        use std::error::Error;

        let key = TypeKey::of::<Button>();
        let err = ContainerError::construction(&key, "device busy");
        assert_eq!(err.key(), &key);
        assert!(err.to_string().contains("device busy"));
        assert!(err.source().is_some());
    }
}
