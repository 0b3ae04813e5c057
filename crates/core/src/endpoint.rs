//! # Endpoint References
//!
//! Mechanisms, states and processes live in an arena owned by the network
//! crate; everything else refers to them by index. An [`EndpointRef`] is how
//! a projection names its sender or receiver before it has been resolved.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a state in a network's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub usize);

/// Index of a mechanism in a network's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MechanismId(pub usize);

/// Index of a process (a linear chain of mechanisms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessId(pub usize);

/// The kind of slot a state occupies on its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateRole {
    Input,
    Output,
    Parameter,
    /// The pass-through buffer feeding the first mechanism of a process.
    ProcessInput,
}

impl StateRole {
    /// Whether a state of this role may act as a projection sender.
    pub fn can_send(self) -> bool {
        matches!(self, StateRole::Output | StateRole::ProcessInput)
    }
}

impl fmt::Display for StateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateRole::Input => "InputState",
            StateRole::Output => "OutputState",
            StateRole::Parameter => "ParameterState",
            StateRole::ProcessInput => "ProcessInputState",
        };
        f.write_str(name)
    }
}

/// A sender or receiver specification.
///
/// `Class` stands for "a fresh default instance of this state role", the
/// way a projection kind declares its default sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointRef {
    State(StateId),
    Mechanism(MechanismId),
    Process(ProcessId),
    Class(StateRole),
}

impl From<StateId> for EndpointRef {
    fn from(id: StateId) -> Self {
        EndpointRef::State(id)
    }
}

impl From<MechanismId> for EndpointRef {
    fn from(id: MechanismId) -> Self {
        EndpointRef::Mechanism(id)
    }
}

impl From<ProcessId> for EndpointRef {
    fn from(id: ProcessId) -> Self {
        EndpointRef::Process(id)
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRef::State(id) => write!(f, "state #{}", id.0),
            EndpointRef::Mechanism(id) => write!(f, "mechanism #{}", id.0),
            EndpointRef::Process(id) => write!(f, "process #{}", id.0),
            EndpointRef::Class(role) => write!(f, "default {}", role),
        }
    }
}
