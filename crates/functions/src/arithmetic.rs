//! # Arithmetic
//!
//! Combines a list of terms elementwise. A vector variable is a list of
//! scalar terms; a matrix variable is a list of row terms.
//!
//! ```text
//!   SUM:     (Σ wᵢ·termᵢ) · scale + offset
//!   PRODUCT:  Π wᵢ·termᵢ
//! ```
//!
//! `scale` and `offset` are not applied on the PRODUCT path.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use conduit_core::{CoreError, ParamSet, ParamValue, Shape, Value};

use crate::kind::OUTPUT_CONVERSION;

pub const WEIGHTS: &str = "weights";
pub const OFFSET: &str = "offset";
pub const SCALE: &str = "scale";
pub const OPERATION: &str = "operation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Sum,
    Product,
}

impl Operation {
    pub fn keyword(self) -> &'static str {
        match self {
            Operation::Sum => "SUM",
            Operation::Product => "PRODUCT",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUM" => Ok(Operation::Sum),
            "PRODUCT" => Ok(Operation::Product),
            other => Err(format!("operation '{}' must be SUM or PRODUCT", other)),
        }
    }
}

pub(crate) fn defaults() -> ParamSet {
    ParamSet::new()
        .with_unset(WEIGHTS)
        .with(OFFSET, 0.0)
        .with(SCALE, 1.0)
        .with(OPERATION, Operation::Sum.keyword())
        .with(OUTPUT_CONVERSION, false)
}

pub(crate) fn default_variable() -> Value {
    Value::vector(vec![2.0, 2.0])
}

pub(crate) fn validate_variable(entity: &str, variable: Value) -> Result<Value, CoreError> {
    if let Shape::Ragged(rows) = variable.shape() {
        return Err(CoreError::config(
            entity,
            format!("terms must all have the same length, got rows of {:?}", rows),
        ));
    }
    Ok(variable)
}

fn operation(entity: &str, params: &ParamSet) -> Result<Operation, CoreError> {
    params
        .keyword(entity, OPERATION)?
        .parse()
        .map_err(|reason: String| CoreError::config(entity, reason))
}

fn weights(entity: &str, params: &ParamSet) -> Result<Option<Vec<f64>>, CoreError> {
    match params.get(WEIGHTS) {
        None => Ok(None),
        Some(ParamValue::Value(Value::Vector(w))) => Ok(Some(w.clone())),
        Some(other) => Err(CoreError::config(
            entity,
            format!("weights must be a list of numbers, got {:?}", other),
        )),
    }
}

pub(crate) fn validate_structure(entity: &str, params: &mut ParamSet) -> Result<(), CoreError> {
    // a bare number is a single weight
    if let Some(w) = params.get(WEIGHTS).and_then(ParamValue::as_number) {
        params.insert(WEIGHTS, vec![w]);
    }
    weights(entity, params)?;
    params.number(entity, OFFSET)?;
    params.number(entity, SCALE)?;
    operation(entity, params)?;
    Ok(())
}

pub(crate) fn validate_semantics(entity: &str, variable: &Value, params: &ParamSet) -> Result<(), CoreError> {
    if let Some(w) = weights(entity, params)? {
        let terms = variable.len();
        if w.len() != terms {
            return Err(CoreError::config(
                entity,
                format!(
                    "number of weights ({}) does not equal number of terms ({})",
                    w.len(),
                    terms
                ),
            ));
        }
    }
    Ok(())
}

fn terms(variable: &Value) -> Vec<Vec<f64>> {
    match variable {
        Value::Scalar(x) => vec![vec![*x]],
        Value::Vector(v) => v.iter().map(|&x| vec![x]).collect(),
        Value::Matrix(rows) => rows.clone(),
    }
}

pub(crate) fn compute(entity: &str, variable: &Value, params: &ParamSet) -> Result<Value, CoreError> {
    validate_semantics(entity, variable, params)?;
    let operation = operation(entity, params)?;
    let offset = params.number(entity, OFFSET)?;
    let scale = params.number(entity, SCALE)?;

    let mut terms = terms(variable);
    if let Some(w) = weights(entity, params)? {
        for (term, weight) in terms.iter_mut().zip(&w) {
            term.iter_mut().for_each(|x| *x *= weight);
        }
    }

    let width = match variable {
        Value::Matrix(rows) => rows.first().map_or(0, Vec::len),
        _ => 1,
    };
    let combined: Vec<f64> = match operation {
        Operation::Sum => terms
            .iter()
            .fold(vec![0.0; width], |acc, t| acc.iter().zip(t).map(|(a, b)| a + b).collect())
            .into_iter()
            .map(|x| x * scale + offset)
            .collect(),
        Operation::Product => terms
            .iter()
            .fold(vec![1.0; width], |acc, t| acc.iter().zip(t).map(|(a, b)| a * b).collect()),
    };

    Ok(match variable {
        Value::Matrix(_) => Value::Vector(combined),
        _ => Value::Scalar(combined[0]),
    })
}
