//! Mechanisms and processes, as far as projection wiring needs them.
//!
//! A mechanism is a named bundle of states. A process is an ordered chain of
//! mechanisms fed by a single pass-through input state.

use conduit_core::{MechanismId, StateId};

#[derive(Debug, Clone)]
pub struct Mechanism {
    pub(crate) name: String,
    pub(crate) input_states: Vec<StateId>,
    pub(crate) output_states: Vec<StateId>,
    pub(crate) parameter_states: Vec<StateId>,
}

impl Mechanism {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            input_states: Vec::new(),
            output_states: Vec::new(),
            parameter_states: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The state a projection lands on when it names this mechanism as receiver.
    pub fn primary_input(&self) -> Option<StateId> {
        self.input_states.first().copied()
    }

    /// The state a projection reads when it names this mechanism as sender.
    pub fn primary_output(&self) -> Option<StateId> {
        self.output_states.first().copied()
    }

    pub fn input_states(&self) -> &[StateId] {
        &self.input_states
    }

    pub fn output_states(&self) -> &[StateId] {
        &self.output_states
    }

    pub fn parameter_states(&self) -> &[StateId] {
        &self.parameter_states
    }
}

#[derive(Debug, Clone)]
pub struct Process {
    pub(crate) name: String,
    pub(crate) input: StateId,
    pub(crate) configuration: Vec<MechanismId>,
}

impl Process {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pass-through state feeding the first mechanism.
    pub fn input(&self) -> StateId {
        self.input
    }

    pub fn configuration(&self) -> &[MechanismId] {
        &self.configuration
    }

    /// The only mechanism the process input may project to.
    pub fn first_mechanism(&self) -> Option<MechanismId> {
        self.configuration.first().copied()
    }
}
