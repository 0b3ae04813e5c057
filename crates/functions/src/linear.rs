//! Linear transfer: `variable * slope + intercept`, elementwise.

use conduit_core::{CoreError, ParamSet, Value};

use crate::kind::OUTPUT_CONVERSION;

pub const SLOPE: &str = "slope";
pub const INTERCEPT: &str = "intercept";

pub(crate) fn defaults() -> ParamSet {
    ParamSet::new()
        .with(SLOPE, 1.0)
        .with(INTERCEPT, 0.0)
        .with(OUTPUT_CONVERSION, true)
}

pub(crate) fn default_variable() -> Value {
    Value::vector(vec![0.0])
}

pub(crate) fn validate_structure(entity: &str, params: &mut ParamSet) -> Result<(), CoreError> {
    params.number(entity, SLOPE)?;
    params.number(entity, INTERCEPT)?;
    Ok(())
}

pub(crate) fn compute(entity: &str, variable: &Value, params: &ParamSet) -> Result<Value, CoreError> {
    let slope = params.number(entity, SLOPE)?;
    let intercept = params.number(entity, INTERCEPT)?;
    Ok(variable.map(|x| x * slope + intercept))
}
