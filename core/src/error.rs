//! Errors surfaced by the reconciler.
//!
//! Every variant is a programmer error. None of them is retried: recovering silently
//! would leave the host tree out of sync with the descriptors.

use thiserror::Error;

/// Ways a component can break the hook calling contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookViolation {
    /// The slot at `index` holds a different state type than the one requested.
    #[error("hook #{index} holds `{found}` but `{expected}` was requested")]
    TypeMismatch {
        /// Position of the hook call.
        index: usize,
        /// Type requested by the current render.
        expected: &'static str,
        /// Type stored by the previous render.
        found: &'static str,
    },
    /// The number of hook calls changed between two renders of the same unit.
    #[error("{current} hooks were called but the previous render called {previous}")]
    CountMismatch {
        /// Hook calls in the previous render.
        previous: usize,
        /// Hook calls in the current render.
        current: usize,
    },
}

/// Errors that abort a render pass or a commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A descriptor type that cannot be rendered.
    #[error("invalid descriptor type `{type_name}`: {reason}")]
    InvalidDescriptorType {
        /// The offending type, as written by the caller.
        type_name: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// Hooks were called in a different order or number than last time.
    #[error("hook order violation in `{component}`: {violation}")]
    HookOrderViolation {
        /// The component that broke the contract.
        component: String,
        /// What went wrong.
        #[source]
        violation: HookViolation,
    },
    /// A node was placed but no ancestor owns a host node to attach it to.
    #[error("no ancestor of `{unit}` owns a host node")]
    MissingHostAncestor {
        /// Label of the unit being placed.
        unit: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_details() {
        let err = RenderError::HookOrderViolation {
            component: "Counter".into(),
            violation: HookViolation::CountMismatch {
                previous: 2,
                current: 1,
            },
        };
        assert_eq!(
            err.to_string(),
            "hook order violation in `Counter`: 1 hooks were called but the previous render called 2"
        );
    }

    #[test]
    fn missing_host_ancestor_display() {
        let err = RenderError::MissingHostAncestor { unit: "li".into() };
        assert_eq!(err.to_string(), "no ancestor of `li` owns a host node");
    }
}
