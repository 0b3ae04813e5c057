//! States: the input, output and parameter slots projections attach to.

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use conduit_core::{MechanismId, StateRole, Value};

/// Index of a projection in a network's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectionId(pub usize);

impl fmt::Display for ProjectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projection #{}", self.0)
    }
}

/// A value slot on a mechanism (or a process, for pass-through inputs).
///
/// States never own projections. They only list the ids of the ones that
/// write to them (`incoming`) and read from them (`outgoing`), in the order
/// the projections were committed.
#[derive(Debug, Clone)]
pub struct State {
    pub(crate) name: String,
    pub(crate) role: StateRole,
    pub(crate) owner: Option<MechanismId>,
    pub(crate) value: Value,
    pub(crate) incoming: Vec<ProjectionId>,
    pub(crate) outgoing: Vec<ProjectionId>,
    pub(crate) node: NodeIndex,
}

impl State {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> StateRole {
        self.role
    }

    /// The mechanism this state belongs to, if any.
    pub fn owner(&self) -> Option<MechanismId> {
        self.owner
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Projections that write to this state.
    pub fn incoming(&self) -> &[ProjectionId] {
        &self.incoming
    }

    /// Projections that read from this state.
    pub fn outgoing(&self) -> &[ProjectionId] {
        &self.outgoing
    }
}
