//! # Utility Kinds
//!
//! The closed set of transforms a projection (or mechanism) can bind.
//! Each kind knows its class defaults, its default variable, and how to
//! validate and compute:
//!
//! | Kind | Computes | Default variable |
//! |------|----------|------------------|
//! | Linear | `x * slope + intercept` | `[0]` |
//! | Exponential | `scale * exp(rate * x)` | `0` |
//! | Integrator | accumulate `[old, new]` | `[0, 0]` |
//! | Arithmetic | weighted SUM / PRODUCT of terms | `[2, 2]` |
//! | LinearMatrix | `x · M` | `[0]` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use conduit_core::{CoreError, ParamSet, Value};

use crate::{arithmetic, exponential, integrator, linear, matrix};

/// Parameter enabling [`crate::UtilityFunction::set_output_type`].
pub const OUTPUT_CONVERSION: &str = "output_conversion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UtilityKind {
    Linear,
    Exponential,
    Integrator,
    Arithmetic,
    LinearMatrix,
}

impl UtilityKind {
    pub const ALL: [UtilityKind; 5] = [
        UtilityKind::Linear,
        UtilityKind::Exponential,
        UtilityKind::Integrator,
        UtilityKind::Arithmetic,
        UtilityKind::LinearMatrix,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UtilityKind::Linear => "Linear",
            UtilityKind::Exponential => "Exponential",
            UtilityKind::Integrator => "Integrator",
            UtilityKind::Arithmetic => "Arithmetic",
            UtilityKind::LinearMatrix => "LinearMatrix",
        }
    }

    /// Class-level parameter defaults. Every kind declares `output_conversion`.
    pub fn class_defaults(self) -> ParamSet {
        match self {
            UtilityKind::Linear => linear::defaults(),
            UtilityKind::Exponential => exponential::defaults(),
            UtilityKind::Integrator => integrator::defaults(),
            UtilityKind::Arithmetic => arithmetic::defaults(),
            UtilityKind::LinearMatrix => matrix::defaults(),
        }
    }

    pub fn default_variable(self) -> Value {
        match self {
            UtilityKind::Linear => linear::default_variable(),
            UtilityKind::Exponential => exponential::default_variable(),
            UtilityKind::Integrator => integrator::default_variable(),
            UtilityKind::Arithmetic => arithmetic::default_variable(),
            UtilityKind::LinearMatrix => matrix::default_variable(),
        }
    }

    /// Check (and possibly normalize) a variable before it is used.
    pub(crate) fn validate_variable(self, entity: &str, variable: Value) -> Result<Value, CoreError> {
        match self {
            UtilityKind::Linear | UtilityKind::Exponential => Ok(variable),
            UtilityKind::Integrator => integrator::validate_variable(entity, variable),
            UtilityKind::Arithmetic => arithmetic::validate_variable(entity, variable),
            UtilityKind::LinearMatrix => matrix::validate_variable(entity, variable),
        }
    }

    pub(crate) fn validate_structure(self, entity: &str, params: &mut ParamSet) -> Result<(), CoreError> {
        params.flag(entity, OUTPUT_CONVERSION)?;
        match self {
            UtilityKind::Linear => linear::validate_structure(entity, params),
            UtilityKind::Exponential => exponential::validate_structure(entity, params),
            UtilityKind::Integrator => integrator::validate_structure(entity, params),
            UtilityKind::Arithmetic => arithmetic::validate_structure(entity, params),
            UtilityKind::LinearMatrix => matrix::validate_structure(entity, params),
        }
    }

    pub(crate) fn validate_semantics(
        self,
        entity: &str,
        variable: &Value,
        params: &ParamSet,
    ) -> Result<(), CoreError> {
        match self {
            UtilityKind::Arithmetic => arithmetic::validate_semantics(entity, variable, params),
            UtilityKind::LinearMatrix => matrix::validate_semantics(entity, variable, params),
            _ => Ok(()),
        }
    }

    /// The natural (uncoerced) output for a validated variable and parameter set.
    pub(crate) fn compute(self, entity: &str, variable: &Value, params: &ParamSet) -> Result<Value, CoreError> {
        match self {
            UtilityKind::Linear => linear::compute(entity, variable, params),
            UtilityKind::Exponential => exponential::compute(entity, variable, params),
            UtilityKind::Integrator => integrator::compute(entity, variable, params),
            UtilityKind::Arithmetic => arithmetic::compute(entity, variable, params),
            UtilityKind::LinearMatrix => matrix::compute(entity, variable, params),
        }
    }
}

impl fmt::Display for UtilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UtilityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UtilityKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| {
                CoreError::config(
                    "utility function",
                    format!("unknown function kind '{}'", s),
                )
            })
    }
}
