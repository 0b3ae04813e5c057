//! # Projection Kinds
//!
//! | Kind | Receiver | Default transform | Default sender |
//! |------|----------|-------------------|----------------|
//! | Mapping | input state | LinearMatrix, `IdentityMatrix` | output state, value `[1]` |
//! | ControlSignal | parameter state | Linear, slope 1 | output state, value `[1]` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use conduit_core::{CoreError, EndpointRef, ParamSet, ParamValue, StateRole, ValidateParams, Value};
use conduit_functions::linear::SLOPE;
use conduit_functions::matrix::{IDENTITY_MATRIX, MATRIX};
use conduit_functions::UtilityKind;

/// Expected sender: an endpoint, or `Class(role)` for a fresh default state.
pub const SENDER: &str = "sender";
/// Value of a default sender state, and the projection's declared variable.
pub const SENDER_VALUE: &str = "sender_value";
/// Name of the transform kind.
pub const FUNCTION: &str = "function";
/// Instance overrides for the transform; unset means the kind's own defaults.
pub const FUNCTION_PARAMS: &str = "function_params";
/// Explicit registry name.
pub const NAME: &str = "name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectionKind {
    Mapping,
    ControlSignal,
}

impl ProjectionKind {
    pub const ALL: [ProjectionKind; 2] = [ProjectionKind::Mapping, ProjectionKind::ControlSignal];

    pub fn name(self) -> &'static str {
        match self {
            ProjectionKind::Mapping => "Mapping",
            ProjectionKind::ControlSignal => "ControlSignal",
        }
    }

    /// The role a receiver state must have.
    pub fn receiver_role(self) -> StateRole {
        match self {
            ProjectionKind::Mapping => StateRole::Input,
            ProjectionKind::ControlSignal => StateRole::Parameter,
        }
    }

    pub fn default_sender(self) -> EndpointRef {
        EndpointRef::Class(StateRole::Output)
    }

    /// The transform used when none is configured, and the fallback when the
    /// configured one cannot reach the receiver.
    pub fn default_function(self) -> (UtilityKind, ParamSet) {
        match self {
            ProjectionKind::Mapping => (
                UtilityKind::LinearMatrix,
                ParamSet::new().with(MATRIX, IDENTITY_MATRIX),
            ),
            ProjectionKind::ControlSignal => (UtilityKind::Linear, ParamSet::new().with(SLOPE, 1.0)),
        }
    }

    pub fn class_defaults(self) -> ParamSet {
        ParamSet::new()
            .with(SENDER, self.default_sender())
            .with(SENDER_VALUE, vec![1.0])
            .with(FUNCTION, self.default_function().0.name())
            .with_unset(FUNCTION_PARAMS)
            .with_unset(NAME)
    }
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProjectionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectionKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| CoreError::config("projection", format!("unknown projection kind '{}'", s)))
    }
}

/// Structural checks on a projection's own parameters.
pub(crate) struct KindValidator {
    pub(crate) kind: ProjectionKind,
}

impl ValidateParams for KindValidator {
    fn validate_structure(&self, params: &mut ParamSet) -> Result<(), CoreError> {
        let entity = self.kind.name();
        if params.get(SENDER).is_some() {
            params.endpoint(entity, SENDER)?;
        }
        if let Some(x) = params.get(SENDER_VALUE).and_then(ParamValue::as_number) {
            params.insert(SENDER_VALUE, vec![x]);
        }
        params.value(entity, SENDER_VALUE)?;
        params.keyword(entity, FUNCTION)?.parse::<UtilityKind>()?;
        if params.get(FUNCTION_PARAMS).is_some() {
            params.set(entity, FUNCTION_PARAMS)?;
        }
        if params.get(NAME).is_some() {
            params.keyword(entity, NAME)?;
        }
        Ok(())
    }
}

/// The transform kind and its instance overrides, as configured.
pub(crate) fn configured_function(
    kind: ProjectionKind,
    params: &ParamSet,
) -> Result<(UtilityKind, ParamSet), CoreError> {
    let entity = kind.name();
    let function: UtilityKind = params.keyword(entity, FUNCTION)?.parse()?;
    let function_params = match params.get(FUNCTION_PARAMS) {
        Some(_) => params.set(entity, FUNCTION_PARAMS)?.clone(),
        None => {
            let (default_kind, default_params) = kind.default_function();
            if function == default_kind {
                default_params
            } else {
                ParamSet::new()
            }
        }
    };
    Ok((function, function_params))
}

pub(crate) fn declared_variable(kind: ProjectionKind, params: &ParamSet) -> Result<Value, CoreError> {
    params.value(kind.name(), SENDER_VALUE).cloned()
}
