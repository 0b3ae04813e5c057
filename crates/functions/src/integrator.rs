//! # Integrator
//!
//! Accumulates a value from a two-part variable `[old, new]`:
//!
//! - `LINEAR`: `old + rate` (the rate is a fixed increment; `new` is ignored)
//! - `SCALED`: `old + rate * new`
//! - `TIME_AVERAGED`: `(1 - rate) * old + rate * new`
//!
//! The rate is not clamped. A variable with two equal-length rows integrates
//! each column independently.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use conduit_core::{CoreError, ParamSet, Shape, Value};

use crate::kind::OUTPUT_CONVERSION;

pub const RATE: &str = "rate";
pub const WEIGHTING: &str = "weighting";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weighting {
    Linear,
    Scaled,
    TimeAveraged,
}

impl Weighting {
    pub fn keyword(self) -> &'static str {
        match self {
            Weighting::Linear => "LINEAR",
            Weighting::Scaled => "SCALED",
            Weighting::TimeAveraged => "TIME_AVERAGED",
        }
    }

    fn apply(self, rate: f64, old: f64, new: f64) -> f64 {
        match self {
            Weighting::Linear => old + rate,
            Weighting::Scaled => old + rate * new,
            Weighting::TimeAveraged => (1.0 - rate) * old + rate * new,
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Weighting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LINEAR" => Ok(Weighting::Linear),
            "SCALED" => Ok(Weighting::Scaled),
            "TIME_AVERAGED" => Ok(Weighting::TimeAveraged),
            other => Err(format!(
                "weighting '{}' must be one of LINEAR, SCALED, TIME_AVERAGED",
                other
            )),
        }
    }
}

pub(crate) fn defaults() -> ParamSet {
    ParamSet::new()
        .with(RATE, 1.0)
        .with(WEIGHTING, Weighting::Linear.keyword())
        .with(OUTPUT_CONVERSION, false)
}

pub(crate) fn default_variable() -> Value {
    Value::vector(vec![0.0, 0.0])
}

pub(crate) fn validate_variable(entity: &str, variable: Value) -> Result<Value, CoreError> {
    match variable.shape() {
        Shape::Vector(2) | Shape::Matrix { rows: 2, .. } => Ok(variable),
        other => Err(CoreError::config(
            entity,
            format!("variable must hold exactly two items [old, new], got {}", other),
        )),
    }
}

fn weighting(entity: &str, params: &ParamSet) -> Result<Weighting, CoreError> {
    params
        .keyword(entity, WEIGHTING)?
        .parse()
        .map_err(|reason: String| CoreError::config(entity, reason))
}

pub(crate) fn validate_structure(entity: &str, params: &mut ParamSet) -> Result<(), CoreError> {
    params.number(entity, RATE)?;
    weighting(entity, params)?;
    Ok(())
}

pub(crate) fn compute(entity: &str, variable: &Value, params: &ParamSet) -> Result<Value, CoreError> {
    let rate = params.number(entity, RATE)?;
    let weighting = weighting(entity, params)?;
    match variable {
        Value::Vector(v) if v.len() == 2 => Ok(Value::Scalar(weighting.apply(rate, v[0], v[1]))),
        Value::Matrix(rows) if rows.len() == 2 => Ok(Value::Vector(
            rows[0]
                .iter()
                .zip(&rows[1])
                .map(|(&old, &new)| weighting.apply(rate, old, new))
                .collect(),
        )),
        other => Err(CoreError::config(
            entity,
            format!("variable must hold exactly two items [old, new], got {}", other.shape()),
        )),
    }
}
