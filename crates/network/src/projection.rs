//! Committed projections and the auto-corrections made while wiring them.

use std::fmt;

use conduit_core::{EndpointRef, OutputType, ParamSet, Shape, StateId, Value};
use conduit_functions::{UtilityFunction, UtilityKind};

use crate::kind::ProjectionKind;

/// A non-fatal correction applied during wiring.
#[derive(Debug, Clone, PartialEq)]
pub enum Adjustment {
    /// The requested sender was unusable; the kind's default sender was used.
    DefaultSender { rejected: EndpointRef, reason: String },
    /// The declared variable did not fit the sender and was replaced by its value.
    VariableReassigned { declared: Shape, sender: Shape },
    /// The transform's output type was changed to fit the receiver.
    OutputCoerced { mode: OutputType },
    /// The configured transform could not reach the receiver; the kind's default was used.
    FallbackTransform { configured: UtilityKind, fallback: UtilityKind },
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::DefaultSender { rejected, reason } => {
                write!(f, "sender {} rejected ({}); using the default sender", rejected, reason)
            }
            Adjustment::VariableReassigned { declared, sender } => {
                write!(f, "variable {} reassigned to match sender {}", declared, sender)
            }
            Adjustment::OutputCoerced { mode } => write!(f, "output coerced to {}", mode),
            Adjustment::FallbackTransform { configured, fallback } => {
                write!(f, "{} replaced by fallback {}", configured, fallback)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Projection {
    pub(crate) name: String,
    pub(crate) kind: ProjectionKind,
    pub(crate) sender: StateId,
    pub(crate) receiver: StateId,
    pub(crate) params: ParamSet,
    pub(crate) function: UtilityFunction,
    pub(crate) value: Value,
    pub(crate) adjustments: Vec<Adjustment>,
    /// Default sender state built for this projection, removed on teardown.
    pub(crate) created_sender: Option<StateId>,
}

impl Projection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    pub fn sender(&self) -> StateId {
        self.sender
    }

    pub fn receiver(&self) -> StateId {
        self.receiver
    }

    /// Instance parameters after merging and validation.
    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    pub fn function(&self) -> &UtilityFunction {
        &self.function
    }

    /// The working variable the transform is bound to.
    pub fn variable(&self) -> &Value {
        self.function.variable()
    }

    /// The result of the last update (the construction-time output until then).
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn adjustments(&self) -> &[Adjustment] {
        &self.adjustments
    }

    /// The sender state created at commit, when no existing state was used.
    pub fn created_sender(&self) -> Option<StateId> {
        self.created_sender
    }
}
