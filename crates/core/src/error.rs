//! # Error Types
//!
//! Every entity (utility function, projection, state) goes through the same
//! staged lifecycle: parameter validation, attribute instantiation, execution.
//! Each stage can fail, and the variant tells you which stage did:
//!
//! | Variant | Raised by | Recoverable? |
//! |---------|-----------|--------------|
//! | `Configuration` | parameter merge, subclass validation, matrix specs | never |
//! | `ShapeMismatch` | a single producer/consumer boundary | locally, by coercion |
//! | `Projection` | wiring, after every recovery step failed | never |
//! | `ResolutionAmbiguity` | sender/receiver lookup | never |

use thiserror::Error;

use crate::shape::Shape;

/// Errors shared by every crate in the workspace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A parameter, sender-type or matrix specification is structurally invalid.
    #[error("Configuration error in {entity}: {reason}")]
    Configuration { entity: String, reason: String },

    /// A produced value's shape disagrees with the shape required at a boundary.
    #[error("Shape mismatch at {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        context: String,
        expected: Shape,
        got: Shape,
    },

    /// Terminal wiring failure.
    #[error(
        "Projection {projection} from {sender} to {receiver} failed: {reason} \
         (output {output}, receiver expects {expected})"
    )]
    Projection {
        projection: String,
        sender: String,
        receiver: String,
        output: Shape,
        expected: Shape,
        reason: String,
    },

    /// The sender or receiver could not be determined and no default applies.
    #[error("Cannot resolve endpoint for {entity}: {reason}")]
    ResolutionAmbiguity { entity: String, reason: String },

    /// An arena index does not refer to anything.
    #[error("{what} {index} not found")]
    NotFound { what: &'static str, index: usize },
}

impl CoreError {
    /// Shorthand for a [`CoreError::Configuration`].
    pub fn config(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Configuration {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`CoreError::ResolutionAmbiguity`].
    pub fn ambiguous(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::ResolutionAmbiguity {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, CoreError::Configuration { .. })
    }

    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, CoreError::ShapeMismatch { .. })
    }
}
