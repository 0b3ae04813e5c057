//! # Projection Wiring
//!
//! A projection is built by a fixed sequence of stages. Each stage consumes
//! the previous stage's struct, so the order cannot be changed:
//!
//! ```text
//!   validate_params ─▶ resolve_sender ─▶ resolve_receiver ─▶ instantiate_transform ─▶ reconcile_output ─▶ commit
//!      Validated         SenderResolved    ReceiverResolved        Instantiated            Plan
//! ```
//!
//! Every stage before `commit` reads the network immutably. A failure at
//! any stage therefore leaves no trace: no state lists are appended, no
//! default sender state is created, no name is registered.
//!
//! Recovery happens only where a narrow fix exists:
//! - an unusable sender falls back to the kind's default sender,
//! - a declared variable that does not fit the sender is replaced by the
//!   sender's value,
//! - a scalar / length-1 output is coerced to match the receiver,
//! - a transform that cannot reach the receiver is replaced by the kind's
//!   default transform if that one can.

use petgraph::Direction;
use tracing::{debug, warn};

use conduit_core::{
    is_compatible, CoreError, EndpointRef, OutputType, ParamSet, ParamStore, Shape, StateId, StateRole, Value,
};
use conduit_functions::matrix::RECEIVER;
use conduit_functions::{UtilityFunction, UtilityKind};

use crate::kind::{configured_function, declared_variable, KindValidator, ProjectionKind, NAME, SENDER};
use crate::mapping;
use crate::network::Network;
use crate::projection::{Adjustment, Projection};
use crate::state::ProjectionId;

/// Carried through every stage.
#[derive(Debug)]
struct Draft {
    kind: ProjectionKind,
    /// Provisional name, used in diagnostics before commit.
    name: String,
    explicit_name: Option<String>,
    params: ParamSet,
    adjustments: Vec<Adjustment>,
    verbose: bool,
}

impl Draft {
    fn adjust(&mut self, adjustment: Adjustment) {
        if self.verbose {
            warn!(projection = %self.name, "{}", adjustment);
        }
        self.adjustments.push(adjustment);
    }
}

#[derive(Debug)]
enum SenderState {
    Existing(StateId),
    /// A default state of this role, created at commit.
    Pending { role: StateRole, value: Value },
}

#[derive(Debug)]
struct Validated {
    draft: Draft,
    sender: EndpointRef,
    receiver: EndpointRef,
}

#[derive(Debug)]
struct SenderResolved {
    draft: Draft,
    sender: SenderState,
    sender_name: String,
    variable: Value,
    receiver: EndpointRef,
}

#[derive(Debug)]
struct ReceiverResolved {
    draft: Draft,
    sender: SenderState,
    sender_name: String,
    variable: Value,
    receiver: StateId,
}

#[derive(Debug)]
struct Instantiated {
    draft: Draft,
    sender: SenderState,
    sender_name: String,
    receiver: StateId,
    function: UtilityFunction,
}

/// A fully checked projection, ready to commit.
#[derive(Debug)]
struct Plan {
    draft: Draft,
    sender: SenderState,
    receiver: StateId,
    function: UtilityFunction,
}

/// Build a projection of `kind` into `receiver`, optionally from `sender`.
///
/// Returns the id of the committed projection. On error the network is
/// unchanged.
pub fn make_projection(
    network: &mut Network,
    kind: ProjectionKind,
    receiver: EndpointRef,
    sender: Option<EndpointRef>,
    params: Option<&ParamSet>,
) -> Result<ProjectionId, CoreError> {
    let plan = {
        let network: &Network = network;
        let validated = validate_params(network, kind, receiver, sender, params)?;
        let sent = resolve_sender(network, validated)?;
        let received = resolve_receiver(network, sent)?;
        let instantiated = instantiate_transform(network, received)?;
        reconcile_output(network, instantiated)?
    };
    commit(network, plan)
}

// ============================================================================
// Stage 1: parameters and sender type
// ============================================================================

fn validate_params(
    network: &Network,
    kind: ProjectionKind,
    receiver: EndpointRef,
    sender_arg: Option<EndpointRef>,
    overrides: Option<&ParamSet>,
) -> Result<Validated, CoreError> {
    let store = ParamStore::new(kind.name(), kind.class_defaults(), overrides, &KindValidator { kind })?;
    let params = store.instance_defaults().clone();

    let explicit_name = match params.get(NAME) {
        Some(_) => {
            let name = params.keyword(kind.name(), NAME)?.to_string();
            network.registry.check_available(kind.name(), &name)?;
            Some(name)
        }
        None => None,
    };
    let name = explicit_name
        .clone()
        .unwrap_or_else(|| network.registry.peek_name(kind.name()));

    let mut draft = Draft {
        kind,
        name,
        explicit_name,
        params,
        adjustments: Vec::new(),
        verbose: network.preferences.verbose,
    };
    let sender = select_sender(network, &mut draft, sender_arg)?;
    debug!(projection = %draft.name, sender = %sender, receiver = %receiver, "validated parameters");
    Ok(Validated {
        draft,
        sender,
        receiver,
    })
}

/// Why an endpoint cannot act as a sender, if it cannot.
fn sender_problem(network: &Network, endpoint: EndpointRef) -> Option<String> {
    match endpoint {
        EndpointRef::State(id) => match network.state(id) {
            Ok(state) if state.role.can_send() => None,
            Ok(state) => Some(format!("a {} cannot send", state.role)),
            Err(e) => Some(e.to_string()),
        },
        EndpointRef::Mechanism(id) => network.mechanism(id).err().map(|e| e.to_string()),
        EndpointRef::Process(id) => network.process(id).err().map(|e| e.to_string()),
        EndpointRef::Class(StateRole::Output) => None,
        EndpointRef::Class(role) => Some(format!("no default {} can be created as a sender", role)),
    }
}

/// An explicit, non-default `sender` parameter wins over the argument,
/// which wins over the kind's default. Each unusable candidate is skipped;
/// if the default is reached after a rejection, the first rejection is
/// recorded. An unusable default is a configuration error.
fn select_sender(
    network: &Network,
    draft: &mut Draft,
    sender_arg: Option<EndpointRef>,
) -> Result<EndpointRef, CoreError> {
    let default = draft.kind.default_sender();
    let param = draft
        .params
        .endpoint(draft.kind.name(), SENDER)
        .ok()
        .filter(|p| *p != default);

    let mut rejected = None;
    for endpoint in [param, sender_arg].into_iter().flatten() {
        match sender_problem(network, endpoint) {
            None => return Ok(endpoint),
            Some(reason) => {
                debug!(projection = %draft.name, sender = %endpoint, %reason, "skipping sender");
                rejected.get_or_insert((endpoint, reason));
            }
        }
    }

    if let Some(reason) = sender_problem(network, default) {
        let requested = rejected
            .as_ref()
            .map_or(String::new(), |(e, r)| format!("requested sender {} is invalid ({}); ", e, r));
        return Err(CoreError::config(
            &draft.name,
            format!("{}default sender {} is invalid ({})", requested, default, reason),
        ));
    }
    if let Some((endpoint, reason)) = rejected {
        draft.adjust(Adjustment::DefaultSender {
            rejected: endpoint,
            reason,
        });
    }
    Ok(default)
}

// ============================================================================
// Stage 2: sender
// ============================================================================

fn resolve_sender(network: &Network, stage: Validated) -> Result<SenderResolved, CoreError> {
    let Validated {
        mut draft,
        sender,
        receiver,
    } = stage;
    let declared = declared_variable(draft.kind, &draft.params)?;

    let (sender, sender_name, sender_value) = match sender {
        EndpointRef::State(id) => {
            let state = network.state(id)?;
            (SenderState::Existing(id), state.name.clone(), state.value.clone())
        }
        EndpointRef::Mechanism(id) => {
            let mechanism = network.mechanism(id)?;
            let id = mechanism.primary_output().ok_or_else(|| {
                CoreError::ambiguous(
                    &draft.name,
                    format!("sender mechanism '{}' has no output state", mechanism.name()),
                )
            })?;
            let state = network.state(id)?;
            (SenderState::Existing(id), state.name.clone(), state.value.clone())
        }
        EndpointRef::Process(id) => {
            let input = network.process(id)?.input;
            let state = network.state(input)?;
            (SenderState::Existing(input), state.name.clone(), state.value.clone())
        }
        EndpointRef::Class(role) => (
            SenderState::Pending {
                role,
                value: declared.clone(),
            },
            format!("default {}", role),
            declared.clone(),
        ),
    };

    // the sender is never changed to fit the projection
    if !is_compatible(&declared, &sender_value) {
        draft.adjust(Adjustment::VariableReassigned {
            declared: declared.shape(),
            sender: sender_value.shape(),
        });
    }
    debug!(projection = %draft.name, sender = %sender_name, variable = %sender_value.shape(), "resolved sender");
    Ok(SenderResolved {
        draft,
        sender,
        sender_name,
        variable: sender_value,
        receiver,
    })
}

// ============================================================================
// Stage 3: receiver
// ============================================================================

fn resolve_receiver(network: &Network, stage: SenderResolved) -> Result<ReceiverResolved, CoreError> {
    let SenderResolved {
        draft,
        sender,
        sender_name,
        variable,
        receiver,
    } = stage;
    let kind = draft.kind;

    let receiver = match receiver {
        EndpointRef::State(id) => {
            network
                .state(id)
                .map_err(|e| CoreError::ambiguous(&draft.name, format!("receiver {}", e)))?;
            id
        }
        EndpointRef::Mechanism(id) => {
            let mechanism = network
                .mechanism(id)
                .map_err(|e| CoreError::ambiguous(&draft.name, format!("receiver {}", e)))?;
            match kind {
                ProjectionKind::Mapping => mechanism.primary_input().ok_or_else(|| {
                    CoreError::ambiguous(
                        &draft.name,
                        format!("receiver mechanism '{}' has no input state", mechanism.name()),
                    )
                })?,
                ProjectionKind::ControlSignal => match mechanism.parameter_states() {
                    [only] => *only,
                    states => {
                        return Err(CoreError::ambiguous(
                            &draft.name,
                            format!(
                                "receiver mechanism '{}' has {} parameter states; name one explicitly",
                                mechanism.name(),
                                states.len()
                            ),
                        ))
                    }
                },
            }
        }
        other => {
            return Err(CoreError::ambiguous(
                &draft.name,
                format!("receiver must be a state or a mechanism, got {}", other),
            ))
        }
    };

    let state = network.state(receiver)?;
    if state.role != kind.receiver_role() {
        return Err(CoreError::config(
            &draft.name,
            format!(
                "receiver '{}' is a {}, but a {} projects to a {}",
                state.name,
                state.role,
                kind,
                kind.receiver_role()
            ),
        ));
    }

    if let SenderState::Existing(id) = &sender {
        if let Some(process) = network.process_fed_by(*id) {
            if state.owner.is_none() || state.owner != process.first_mechanism() {
                return Err(CoreError::Projection {
                    projection: draft.name.clone(),
                    sender: sender_name,
                    receiver: state.name.clone(),
                    output: variable.shape(),
                    expected: state.value.shape(),
                    reason: format!(
                        "the input of process '{}' may only project to the first mechanism of its configuration",
                        process.name()
                    ),
                });
            }
        }
    }

    debug!(projection = %draft.name, receiver = %state.name, "resolved receiver");
    Ok(ReceiverResolved {
        draft,
        sender,
        sender_name,
        variable,
        receiver,
    })
}

// ============================================================================
// Stage 4: transform
// ============================================================================

/// Build a transform bound to `variable`. A LinearMatrix without an explicit
/// receiver template takes the receiver's value.
fn build_function(
    function: UtilityKind,
    mut params: ParamSet,
    variable: &Value,
    receiver_value: &Value,
) -> Result<UtilityFunction, CoreError> {
    if function == UtilityKind::LinearMatrix && params.get(RECEIVER).is_none() {
        params.insert(RECEIVER, receiver_value.flatten());
    }
    UtilityFunction::new(function, Some(variable.clone()), Some(&params))
}

fn instantiate_transform(network: &Network, stage: ReceiverResolved) -> Result<Instantiated, CoreError> {
    let ReceiverResolved {
        draft,
        sender,
        sender_name,
        variable,
        receiver,
    } = stage;
    let (function, params) = configured_function(draft.kind, &draft.params)?;
    let receiver_value = network.value(receiver)?;
    let function = build_function(function, params, &variable, receiver_value)?;
    debug!(
        projection = %draft.name,
        function = function.name(),
        output = %function.natural_output().shape(),
        "instantiated transform"
    );
    Ok(Instantiated {
        draft,
        sender,
        sender_name,
        receiver,
        function,
    })
}

// ============================================================================
// Stage 5: output against receiver
// ============================================================================

/// Try the scalar / length-1 coercions in whichever direction applies.
fn coerce_to_fit(function: &mut UtilityFunction, expected: &Shape) -> Option<OutputType> {
    let natural = function.natural_output().shape();
    let mode = match (&natural, expected) {
        (out, Shape::Scalar) if out.is_single() => OutputType::RawNumber,
        (Shape::Scalar, Shape::Vector(1)) => OutputType::Vector1D,
        _ => return None,
    };
    function.set_output_type(mode).ok().map(|_| mode)
}

fn reconcile_output(network: &Network, stage: Instantiated) -> Result<Plan, CoreError> {
    let Instantiated {
        mut draft,
        sender,
        sender_name,
        receiver,
        mut function,
    } = stage;
    let state = network.state(receiver)?;
    let expected = state.value.shape();

    let output = function.natural_output().clone();
    if output.shape() != expected {
        if let Some(mode) = coerce_to_fit(&mut function, &expected) {
            draft.adjust(Adjustment::OutputCoerced { mode });
        } else if !is_compatible(&output, &state.value) {
            let (fallback, fallback_params) = draft.kind.default_function();
            let replacement = if function.kind() != fallback {
                build_function(fallback, fallback_params, function.variable(), &state.value)
                    .ok()
                    .filter(|f| is_compatible(f.natural_output(), &state.value))
            } else {
                None
            };
            match replacement {
                Some(replacement) => {
                    draft.adjust(Adjustment::FallbackTransform {
                        configured: function.kind(),
                        fallback,
                    });
                    function = replacement;
                }
                None => {
                    return Err(CoreError::Projection {
                        projection: draft.name,
                        sender: sender_name,
                        receiver: state.name.clone(),
                        output: output.shape(),
                        expected,
                        reason: "transform output is not compatible with the receiver".into(),
                    })
                }
            }
        }
    }

    if draft.kind == ProjectionKind::Mapping {
        mapping::check_lengths(&draft.name, &sender_name, state, &function)?;
    }
    Ok(Plan {
        draft,
        sender,
        receiver,
        function,
    })
}

// ============================================================================
// Commit
// ============================================================================

fn commit(network: &mut Network, plan: Plan) -> Result<ProjectionId, CoreError> {
    let Plan {
        draft,
        sender,
        receiver,
        function,
    } = plan;
    let value = function.default_output()?;
    let name = network
        .registry
        .register(draft.kind.name(), draft.explicit_name.as_deref())?;

    let (sender, created_sender) = match sender {
        SenderState::Existing(id) => (id, None),
        SenderState::Pending { role, value } => {
            let id = network.insert_state(format!("{}.{}", name, role), role, None, value);
            (id, Some(id))
        }
    };

    let id = ProjectionId(network.projections.len());
    let from = network.attach(sender, id, Direction::Outgoing)?;
    let to = network.attach(receiver, id, Direction::Incoming)?;
    network.graph.add_edge(from, to, id);
    debug!(projection = %name, id = id.0, adjustments = draft.adjustments.len(), "committed projection");

    network.projections.push(Projection {
        name,
        kind: draft.kind,
        sender,
        receiver,
        params: draft.params,
        function,
        value,
        adjustments: draft.adjustments,
        created_sender,
    });
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_mechanisms(net: &mut Network, len: usize) -> (StateId, StateId) {
        let a = net
            .add_transfer_mechanism("A", Value::vector(vec![0.0; len]), Value::vector(vec![0.0; len]))
            .unwrap();
        let b = net
            .add_transfer_mechanism("B", Value::vector(vec![0.0; len]), Value::vector(vec![0.0; len]))
            .unwrap();
        (
            net.mechanism(a).unwrap().primary_output().unwrap(),
            net.mechanism(b).unwrap().primary_input().unwrap(),
        )
    }

    #[test]
    fn test_sender_param_beats_argument() {
        let mut net = Network::new();
        let (out, input) = two_mechanisms(&mut net, 1);
        let other = net.add_mechanism("C");
        let other_out = net.add_state(other, StateRole::Output, Value::vector(vec![0.0])).unwrap();

        let params = ParamSet::new().with(SENDER, EndpointRef::State(other_out));
        let id = make_projection(&mut net, ProjectionKind::Mapping, input.into(), Some(out.into()), Some(&params))
            .unwrap();
        assert_eq!(net.projection(id).unwrap().sender(), other_out);
    }

    #[test]
    fn test_invalid_sender_param_uses_valid_argument() {
        let mut net = Network::new();
        let (out, input) = two_mechanisms(&mut net, 1);
        let states_before = net.state_count();

        let params = ParamSet::new().with(SENDER, EndpointRef::State(StateId(999)));
        let id = make_projection(&mut net, ProjectionKind::Mapping, input.into(), Some(out.into()), Some(&params))
            .unwrap();
        let projection = net.projection(id).unwrap();
        assert_eq!(projection.sender(), out);
        assert!(projection.adjustments().is_empty());
        assert_eq!(projection.created_sender(), None);
        assert_eq!(net.state_count(), states_before);
    }

    #[test]
    fn test_default_sender_records_first_rejection() {
        let mut net = Network::new();
        let (_, input) = two_mechanisms(&mut net, 1);
        let params = ParamSet::new().with(SENDER, EndpointRef::State(StateId(999)));
        let id = make_projection(
            &mut net,
            ProjectionKind::Mapping,
            input.into(),
            Some(EndpointRef::State(input)),
            Some(&params),
        )
        .unwrap();
        let projection = net.projection(id).unwrap();
        assert_eq!(
            projection.adjustments().iter().filter(|a| matches!(a, Adjustment::DefaultSender { .. })).count(),
            1
        );
        assert!(matches!(
            projection.adjustments()[0],
            Adjustment::DefaultSender { rejected: EndpointRef::State(StateId(999)), .. }
        ));
        assert!(projection.created_sender().is_some());
    }

    #[test]
    fn test_invalid_argument_falls_back_to_default_sender() {
        let mut net = Network::new();
        let (_, input) = two_mechanisms(&mut net, 1);
        let id = make_projection(
            &mut net,
            ProjectionKind::Mapping,
            input.into(),
            Some(EndpointRef::State(input)),
            None,
        )
        .unwrap();
        let projection = net.projection(id).unwrap();
        assert!(matches!(projection.adjustments()[0], Adjustment::DefaultSender { .. }));
        let sender = net.state(projection.sender()).unwrap();
        assert_eq!(sender.role(), StateRole::Output);
        assert_eq!(sender.owner(), None);
        assert_eq!(sender.value(), &Value::vector(vec![1.0]));
    }

    #[test]
    fn test_invalid_sender_param_falls_back_to_default() {
        let net = Network::new();
        let mut draft = Draft {
            kind: ProjectionKind::Mapping,
            name: "Mapping-0".into(),
            explicit_name: None,
            params: ProjectionKind::Mapping.class_defaults(),
            adjustments: Vec::new(),
            verbose: false,
        };
        assert!(select_sender(&net, &mut draft, None).is_ok());
        draft.params.insert(SENDER, EndpointRef::Class(StateRole::Input));
        assert_eq!(
            select_sender(&net, &mut draft, None).unwrap(),
            EndpointRef::Class(StateRole::Output)
        );
        assert_eq!(draft.adjustments.len(), 1);
    }

    #[test]
    fn test_mismatched_declared_variable_is_reassigned() {
        let mut net = Network::new();
        let (out, input) = two_mechanisms(&mut net, 3);
        let id = make_projection(&mut net, ProjectionKind::Mapping, input.into(), Some(out.into()), None).unwrap();
        let projection = net.projection(id).unwrap();
        assert_eq!(projection.variable(), &Value::vector(vec![0.0; 3]));
        assert_eq!(
            projection.adjustments(),
            &[Adjustment::VariableReassigned {
                declared: Shape::Vector(1),
                sender: Shape::Vector(3),
            }]
        );
    }

    #[test]
    fn test_scalar_receiver_gets_raw_number() {
        let mut net = Network::new();
        let a = net
            .add_transfer_mechanism("A", Value::vector(vec![0.0]), Value::vector(vec![2.0]))
            .unwrap();
        let b = net
            .add_transfer_mechanism("B", Value::scalar(0.0), Value::scalar(0.0))
            .unwrap();
        let id = net.project(ProjectionKind::Mapping, b, Some(a.into()), None).unwrap();
        let projection = net.projection(id).unwrap();
        assert_eq!(projection.function().output_type(), OutputType::RawNumber);
        assert_eq!(net.execute_projection(id, None).unwrap(), Value::scalar(2.0));
    }

    #[test]
    fn test_nothing_registered_on_failure() {
        let mut net = Network::new();
        let a = net
            .add_transfer_mechanism("A", Value::vector(vec![0.0; 2]), Value::vector(vec![0.0; 2]))
            .unwrap();
        let b = net
            .add_transfer_mechanism("B", Value::vector(vec![0.0; 3]), Value::vector(vec![0.0; 3]))
            .unwrap();
        // identity needs equal lengths
        let err = net.project(ProjectionKind::Mapping, b, Some(a.into()), None).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(net.projections().count(), 0);
        assert_eq!(net.registry().count("Mapping"), 0);
        assert_eq!(net.state_count(), 4);
        for state in net.states.iter().flatten() {
            assert!(state.incoming().is_empty() && state.outgoing().is_empty());
        }
        assert_eq!(net.graph.edge_count(), 0);
    }
}
