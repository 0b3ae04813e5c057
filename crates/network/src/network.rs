//! # Network - State Arena and Projection Graph
//!
//! The network owns every mechanism, state, process and projection; the
//! entities refer to each other by id only. Committed projections are also
//! edges of a state graph:
//!
//! ```text
//!   [A.output] ──Mapping-0──▶ [B.input]
//!                              [B.output] ──Mapping-1──▶ [C.input]
//! ```
//!
//! Wiring happens in [`crate::wiring`]; this module only stores the result
//! and runs committed projections.

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use tracing::debug;

use conduit_core::{
    is_compatible, CoreError, EndpointRef, MechanismId, ParamSet, Preferences, ProcessId, Registry,
    StateId, StateRole, Value,
};

use crate::kind::ProjectionKind;
use crate::mechanism::{Mechanism, Process};
use crate::projection::Projection;
use crate::state::{ProjectionId, State};
use crate::wiring;

#[derive(Debug, Clone, Default)]
pub struct Network {
    pub(crate) graph: StableDiGraph<StateId, ProjectionId>,
    /// Slots of removed states stay `None` so ids are never reused.
    pub(crate) states: Vec<Option<State>>,
    pub(crate) mechanisms: Vec<Mechanism>,
    pub(crate) processes: Vec<Process>,
    pub(crate) projections: Vec<Projection>,
    pub(crate) registry: Registry,
    pub(crate) preferences: Preferences,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences(preferences: Preferences) -> Self {
        Self {
            preferences,
            ..Self::default()
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ------------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------------

    /// Add a mechanism without states.
    pub fn add_mechanism(&mut self, name: impl Into<String>) -> MechanismId {
        let id = MechanismId(self.mechanisms.len());
        self.mechanisms.push(Mechanism::new(name.into()));
        id
    }

    /// Add a mechanism with one input state and one output state.
    pub fn add_transfer_mechanism(
        &mut self,
        name: impl Into<String>,
        input: Value,
        output: Value,
    ) -> Result<MechanismId, CoreError> {
        let id = self.add_mechanism(name);
        self.add_state(id, StateRole::Input, input)?;
        self.add_state(id, StateRole::Output, output)?;
        Ok(id)
    }

    /// Attach a state to a mechanism. States are appended, so the first one
    /// of each role is the mechanism's primary state.
    pub fn add_state(&mut self, owner: MechanismId, role: StateRole, value: Value) -> Result<StateId, CoreError> {
        let mechanism = self.mechanism(owner)?;
        if role == StateRole::ProcessInput {
            return Err(CoreError::config(
                mechanism.name(),
                "process input states belong to processes, not mechanisms",
            ));
        }
        let name = format!("{}.{}", mechanism.name(), role);
        let id = self.insert_state(name, role, Some(owner), value);
        let mechanism = &mut self.mechanisms[owner.0];
        match role {
            StateRole::Input => mechanism.input_states.push(id),
            StateRole::Output => mechanism.output_states.push(id),
            StateRole::Parameter => mechanism.parameter_states.push(id),
            StateRole::ProcessInput => {}
        }
        Ok(id)
    }

    /// Add a process over a chain of mechanisms. Its pass-through input state
    /// takes the value of the first mechanism's primary input.
    pub fn add_process(
        &mut self,
        name: impl Into<String>,
        configuration: Vec<MechanismId>,
    ) -> Result<ProcessId, CoreError> {
        let name = name.into();
        let first = configuration
            .first()
            .copied()
            .ok_or_else(|| CoreError::config(&name, "a process needs at least one mechanism"))?;
        for id in &configuration {
            self.mechanism(*id)?;
        }
        let value = match self.mechanism(first)?.primary_input() {
            Some(state) => self.value(state)?.clone(),
            None => return Err(CoreError::config(&name, "the first mechanism has no input state")),
        };
        let input = self.insert_state(format!("{}.{}", name, StateRole::ProcessInput), StateRole::ProcessInput, None, value);
        let id = ProcessId(self.processes.len());
        self.processes.push(Process {
            name,
            input,
            configuration,
        });
        Ok(id)
    }

    pub(crate) fn insert_state(
        &mut self,
        name: String,
        role: StateRole,
        owner: Option<MechanismId>,
        value: Value,
    ) -> StateId {
        let id = StateId(self.states.len());
        let node = self.graph.add_node(id);
        self.states.push(Some(State {
            name,
            role,
            owner,
            value,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            node,
        }));
        id
    }

    fn state_mut(&mut self, id: StateId) -> Result<&mut State, CoreError> {
        self.states
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(CoreError::NotFound {
                what: "state",
                index: id.0,
            })
    }

    /// Append `projection` to one endpoint list of `state`; returns its graph node.
    pub(crate) fn attach(
        &mut self,
        state: StateId,
        projection: ProjectionId,
        direction: Direction,
    ) -> Result<NodeIndex, CoreError> {
        let state = self.state_mut(state)?;
        match direction {
            Direction::Outgoing => state.outgoing.push(projection),
            Direction::Incoming => state.incoming.push(projection),
        }
        Ok(state.node)
    }

    /// Build and commit a projection. See [`wiring::make_projection`].
    pub fn project(
        &mut self,
        kind: ProjectionKind,
        receiver: impl Into<EndpointRef>,
        sender: Option<EndpointRef>,
        params: Option<&ParamSet>,
    ) -> Result<ProjectionId, CoreError> {
        wiring::make_projection(self, kind, receiver.into(), sender, params)
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    pub fn state(&self, id: StateId) -> Result<&State, CoreError> {
        self.states
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(CoreError::NotFound {
                what: "state",
                index: id.0,
            })
    }

    /// Number of live states.
    pub fn state_count(&self) -> usize {
        self.states.iter().flatten().count()
    }

    pub fn mechanism(&self, id: MechanismId) -> Result<&Mechanism, CoreError> {
        self.mechanisms.get(id.0).ok_or(CoreError::NotFound {
            what: "mechanism",
            index: id.0,
        })
    }

    pub fn process(&self, id: ProcessId) -> Result<&Process, CoreError> {
        self.processes.get(id.0).ok_or(CoreError::NotFound {
            what: "process",
            index: id.0,
        })
    }

    pub fn projection(&self, id: ProjectionId) -> Result<&Projection, CoreError> {
        self.projections.get(id.0).ok_or(CoreError::NotFound {
            what: "projection",
            index: id.0,
        })
    }

    pub fn projections(&self) -> impl Iterator<Item = (ProjectionId, &Projection)> {
        self.projections
            .iter()
            .enumerate()
            .map(|(i, p)| (ProjectionId(i), p))
    }

    pub fn value(&self, id: StateId) -> Result<&Value, CoreError> {
        Ok(&self.state(id)?.value)
    }

    /// Replace a state's value. The new value must keep a compatible shape.
    pub fn set_value(&mut self, id: StateId, value: Value) -> Result<(), CoreError> {
        let state = self.state(id)?;
        if !is_compatible(&value, &state.value) {
            return Err(CoreError::ShapeMismatch {
                context: state.name.clone(),
                expected: state.value.shape(),
                got: value.shape(),
            });
        }
        self.state_mut(id)?.value = value;
        Ok(())
    }

    /// The process whose pass-through input is `state`, if any.
    pub fn process_fed_by(&self, state: StateId) -> Option<&Process> {
        self.processes.iter().find(|p| p.input == state)
    }

    /// States with a committed projection into `state`.
    pub fn senders_of(&self, state: StateId) -> Result<Vec<StateId>, CoreError> {
        let node = self.state(state)?.node;
        Ok(self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| self.graph[e.source()])
            .collect())
    }

    /// States `state` has a committed projection into.
    pub fn receivers_of(&self, state: StateId) -> Result<Vec<StateId>, CoreError> {
        let node = self.state(state)?.node;
        Ok(self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| self.graph[e.target()])
            .collect())
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    /// Run a projection on its sender's current value. The receiver is not
    /// written; pushing values belongs to the mechanism update cycle.
    pub fn execute_projection(&self, id: ProjectionId, overrides: Option<&ParamSet>) -> Result<Value, CoreError> {
        let projection = self.projection(id)?;
        let input = self.value(projection.sender)?;
        projection.function.execute(Some(input), overrides)
    }

    /// Re-pull the sender value, re-run the transform and store the result
    /// as the projection's value.
    pub fn update_projection(&mut self, id: ProjectionId) -> Result<Value, CoreError> {
        let value = self.execute_projection(id, None)?;
        let projection = &mut self.projections[id.0];
        debug!(projection = %projection.name, value = %value, "updated projection");
        projection.value = value.clone();
        Ok(value)
    }

    /// Re-check every committed projection against the current states.
    pub fn validate(&self) -> Result<(), CoreError> {
        for edge in self.graph.edge_references() {
            let id = *edge.weight();
            let projection = self.projection(id)?;
            let sender = self.state(self.graph[edge.source()])?;
            let receiver = self.state(self.graph[edge.target()])?;
            let output = projection.function.default_output()?;

            let failure = |reason: &str| CoreError::Projection {
                projection: projection.name.clone(),
                sender: sender.name.clone(),
                receiver: receiver.name.clone(),
                output: output.shape(),
                expected: receiver.value.shape(),
                reason: reason.to_string(),
            };

            if !sender.role.can_send() {
                return Err(failure("sender state cannot send"));
            }
            if receiver.role != projection.kind.receiver_role() {
                return Err(failure("receiver state has the wrong role"));
            }
            if !sender.outgoing.contains(&id) || !receiver.incoming.contains(&id) {
                return Err(failure("projection is missing from its endpoint lists"));
            }
            if !is_compatible(&output, &receiver.value) {
                return Err(failure("transform output is not compatible with the receiver"));
            }
        }
        Ok(())
    }

    /// Remove every projection, clearing endpoint lists, graph edges and
    /// names. Default sender states created for a projection go with it.
    pub fn teardown(&mut self) {
        for projection in self.projections.drain(..) {
            self.registry.remove(projection.kind.name(), &projection.name);
            if let Some(state) = projection.created_sender.and_then(|id| self.states.get_mut(id.0)?.take()) {
                debug!(projection = %projection.name, state = %state.name, "removed default sender");
                self.graph.remove_node(state.node);
            }
        }
        self.graph.clear_edges();
        for state in self.states.iter_mut().flatten() {
            state.incoming.clear();
            state.outgoing.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_states_are_first_added() {
        let mut net = Network::new();
        let m = net.add_mechanism("A");
        let first = net.add_state(m, StateRole::Input, Value::scalar(0.0)).unwrap();
        net.add_state(m, StateRole::Input, Value::scalar(1.0)).unwrap();
        assert_eq!(net.mechanism(m).unwrap().primary_input(), Some(first));
        assert_eq!(net.mechanism(m).unwrap().primary_output(), None);
        assert_eq!(net.state(first).unwrap().owner(), Some(m));
        assert_eq!(net.state(first).unwrap().name(), "A.InputState");
    }

    #[test]
    fn test_process_input_not_allowed_on_mechanism() {
        let mut net = Network::new();
        let m = net.add_mechanism("A");
        let err = net.add_state(m, StateRole::ProcessInput, Value::scalar(0.0)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_process_input_copies_first_input() {
        let mut net = Network::new();
        let a = net
            .add_transfer_mechanism("A", Value::vector(vec![0.0, 0.0]), Value::vector(vec![0.0, 0.0]))
            .unwrap();
        let p = net.add_process("P", vec![a]).unwrap();
        let input = net.process(p).unwrap().input();
        assert_eq!(net.value(input).unwrap(), &Value::vector(vec![0.0, 0.0]));
        assert_eq!(net.state(input).unwrap().owner(), None);
        assert!(net.add_process("Empty", vec![]).is_err());
    }

    #[test]
    fn test_set_value_keeps_shape() {
        let mut net = Network::new();
        let a = net
            .add_transfer_mechanism("A", Value::vector(vec![0.0]), Value::vector(vec![0.0]))
            .unwrap();
        let out = net.mechanism(a).unwrap().primary_output().unwrap();
        net.set_value(out, Value::scalar(5.0)).unwrap();
        let err = net.set_value(out, Value::vector(vec![1.0, 2.0])).unwrap_err();
        assert!(err.is_shape_mismatch());
    }

    #[test]
    fn test_dangling_ids() {
        let net = Network::new();
        assert_eq!(
            net.state(StateId(3)).unwrap_err(),
            CoreError::NotFound { what: "state", index: 3 }
        );
        assert!(net.execute_projection(ProjectionId(0), None).is_err());
    }

    #[test]
    fn test_teardown_removes_created_senders() {
        let mut net = Network::new();
        let b = net
            .add_transfer_mechanism("B", Value::vector(vec![0.0]), Value::vector(vec![0.0]))
            .unwrap();
        let before = net.state_count();

        for _ in 0..3 {
            let id = net.project(ProjectionKind::Mapping, b, None, None).unwrap();
            let created = net.projection(id).unwrap().created_sender().unwrap();
            assert_eq!(net.state_count(), before + 1);
            assert_eq!(net.graph.node_count(), before + 1);

            net.teardown();
            assert_eq!(net.state_count(), before);
            assert_eq!(net.graph.node_count(), before);
            assert!(net.state(created).is_err());
        }
        assert_eq!(net.graph.edge_count(), 0);
    }

    #[test]
    fn test_teardown_keeps_existing_senders() {
        let mut net = Network::new();
        let a = net
            .add_transfer_mechanism("A", Value::vector(vec![0.0]), Value::vector(vec![0.0]))
            .unwrap();
        let b = net
            .add_transfer_mechanism("B", Value::vector(vec![0.0]), Value::vector(vec![0.0]))
            .unwrap();
        let id = net.project(ProjectionKind::Mapping, b, Some(a.into()), None).unwrap();
        let sender = net.projection(id).unwrap().sender();
        assert_eq!(net.projection(id).unwrap().created_sender(), None);

        net.teardown();
        assert_eq!(net.state_count(), 4);
        assert!(net.state(sender).unwrap().outgoing().is_empty());
    }
}
