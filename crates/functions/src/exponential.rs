//! Exponential transfer: `scale * exp(rate * variable)`, elementwise.

use conduit_core::{CoreError, ParamSet, Value};

use crate::kind::OUTPUT_CONVERSION;

pub const RATE: &str = "rate";
pub const SCALE: &str = "scale";

pub(crate) fn defaults() -> ParamSet {
    ParamSet::new()
        .with(RATE, 1.0)
        .with(SCALE, 1.0)
        .with(OUTPUT_CONVERSION, false)
}

pub(crate) fn default_variable() -> Value {
    Value::scalar(0.0)
}

pub(crate) fn validate_structure(entity: &str, params: &mut ParamSet) -> Result<(), CoreError> {
    params.number(entity, RATE)?;
    params.number(entity, SCALE)?;
    Ok(())
}

pub(crate) fn compute(entity: &str, variable: &Value, params: &ParamSet) -> Result<Value, CoreError> {
    let rate = params.number(entity, RATE)?;
    let scale = params.number(entity, SCALE)?;
    Ok(variable.map(|x| scale * (rate * x).exp()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_give_e_to_the_x() {
        let out = compute("Exponential", &Value::scalar(1.0), &defaults()).unwrap();
        assert!((out.as_single().unwrap() - std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn test_rate_and_scale() {
        let params = defaults().with(RATE, 0.0).with(SCALE, 3.0);
        let out = compute("Exponential", &Value::vector(vec![5.0, -2.0]), &params).unwrap();
        assert_eq!(out, Value::vector(vec![3.0, 3.0]));
    }
}
