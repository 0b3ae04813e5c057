//! # Utility Function
//!
//! A [`UtilityKind`] bound to a variable, a three-tier parameter store and
//! a declared output type.
//!
//! Construction merges and validates the parameters, then runs one call on
//! the bound variable to record the natural output. Every later
//! [`execute`](UtilityFunction::execute) coerces its result to the declared
//! [`OutputType`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use conduit_core::compat::check_coercion;
use conduit_core::{coerce, CoreError, OutputType, ParamSet, ParamStore, ValidateParams, Value};

use crate::kind::{UtilityKind, OUTPUT_CONVERSION};
use crate::matrix;

/// Binds kind-specific validation to a concrete variable.
struct KindValidator<'a> {
    kind: UtilityKind,
    entity: &'a str,
    variable: &'a Value,
}

impl ValidateParams for KindValidator<'_> {
    fn validate_structure(&self, params: &mut ParamSet) -> Result<(), CoreError> {
        self.kind.validate_structure(self.entity, params)
    }

    fn validate_semantics(&self, params: &ParamSet) -> Result<(), CoreError> {
        self.kind.validate_semantics(self.entity, self.variable, params)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UtilityFunction {
    kind: UtilityKind,
    params: ParamStore,
    variable: Value,
    output_type: OutputType,
    natural_output: Value,
}

impl UtilityFunction {
    /// Build a function of `kind`, bound to `variable` (or the kind's default).
    pub fn new(kind: UtilityKind, variable: Option<Value>, params: Option<&ParamSet>) -> Result<Self, CoreError> {
        let entity = kind.name();
        let variable = kind.validate_variable(entity, variable.unwrap_or_else(|| kind.default_variable()))?;
        let hook = KindValidator {
            kind,
            entity,
            variable: &variable,
        };
        let params = ParamStore::new(entity, kind.class_defaults(), params, &hook)?;
        let natural_output = kind.compute(entity, &variable, params.instance_defaults())?;
        debug!(
            function = entity,
            variable = %variable.shape(),
            output = %natural_output.shape(),
            "instantiated utility function"
        );
        Ok(Self {
            kind,
            params,
            variable,
            output_type: OutputType::Natural,
            natural_output,
        })
    }

    pub fn kind(&self) -> UtilityKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        self.params.entity()
    }

    pub fn variable(&self) -> &Value {
        &self.variable
    }

    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    pub fn output_type(&self) -> OutputType {
        self.output_type
    }

    /// The uncoerced result of the construction-time call.
    pub fn natural_output(&self) -> &Value {
        &self.natural_output
    }

    /// The construction-time result under the declared output type.
    pub fn default_output(&self) -> Result<Value, CoreError> {
        coerce(&self.natural_output, self.output_type)
    }

    /// Whether [`set_output_type`](Self::set_output_type) may pick a non-natural mode.
    pub fn output_conversion(&self) -> Result<bool, CoreError> {
        self.params.instance_defaults().flag(self.name(), OUTPUT_CONVERSION)
    }

    /// The weight matrix of a LinearMatrix function; `None` for other kinds.
    pub fn matrix(&self) -> Result<Option<Vec<Vec<f64>>>, CoreError> {
        match self.kind {
            UtilityKind::LinearMatrix => {
                matrix::implement(self.name(), &self.variable, self.params.instance_defaults()).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn hook<'a>(&'a self, variable: &'a Value) -> KindValidator<'a> {
        KindValidator {
            kind: self.kind,
            entity: self.name(),
            variable,
        }
    }

    /// Run the transform on `variable` (or the bound one) under per-call overrides.
    pub fn execute(&self, variable: Option<&Value>, params: Option<&ParamSet>) -> Result<Value, CoreError> {
        let variable = match variable {
            Some(v) => self.kind.validate_variable(self.name(), v.clone())?,
            None => self.variable.clone(),
        };
        let current = self.params.current(params, &self.hook(&variable))?;
        let natural = self.kind.compute(self.name(), &variable, &current)?;
        coerce(&natural, self.output_type)
    }

    /// Declare how results are reshaped.
    ///
    /// Fails with a configuration error if the kind does not allow output
    /// conversion, and with a shape mismatch if the natural output cannot
    /// take the requested form.
    pub fn set_output_type(&mut self, mode: OutputType) -> Result<(), CoreError> {
        if mode != OutputType::Natural && !self.output_conversion()? {
            return Err(CoreError::config(
                self.name(),
                format!("output conversion to {} is not supported by this function", mode),
            ));
        }
        check_coercion(&self.natural_output.shape(), mode)?;
        self.output_type = mode;
        Ok(())
    }

    /// Replace instance defaults. Nothing changes if the new set is invalid
    /// or no longer fits the declared output type.
    pub fn assign_defaults(&mut self, overrides: &ParamSet) -> Result<(), CoreError> {
        let mut params = self.params.clone();
        params.assign_defaults(overrides, &self.hook(&self.variable))?;
        let natural_output = self.kind.compute(self.name(), &self.variable, params.instance_defaults())?;
        check_coercion(&natural_output.shape(), self.output_type)?;
        self.params = params;
        self.natural_output = natural_output;
        Ok(())
    }
}

/// Serializable description of a function, as read from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionConfig {
    pub kind: UtilityKind,
    #[serde(default)]
    pub params: ParamSet,
    #[serde(default)]
    pub variable: Option<Value>,
    #[serde(default)]
    pub output_type: OutputType,
}

impl FunctionConfig {
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::config("function config", format!("invalid JSON: {}", e)))
    }

    pub fn build(&self) -> Result<UtilityFunction, CoreError> {
        let mut function = UtilityFunction::new(self.kind, self.variable.clone(), Some(&self.params))?;
        function.set_output_type(self.output_type)?;
        Ok(function)
    }
}
