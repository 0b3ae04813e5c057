//! # Utility Function Tests
//!
//! - Arithmetic weighting and weight-count validation
//! - Integrator weighting policies
//! - Scalar / length-1 output coercion
//! - LinearMatrix shape enforcement (1×1 up to 5×5)
//! - JSON configuration

use conduit_core::{CoreError, OutputType, ParamSet, Shape, Value};
use conduit_functions::arithmetic::{OFFSET, SCALE, WEIGHTS};
use conduit_functions::integrator::{RATE, WEIGHTING};
use conduit_functions::matrix::{MATRIX, RECEIVER};
use conduit_functions::{FunctionConfig, UtilityFunction, UtilityKind};
use proptest::prelude::*;

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_arithmetic_weighted_sum() {
    let terms = Value::vector(vec![2.0, 3.0, 4.0]);
    let params = ParamSet::new()
        .with(WEIGHTS, vec![1.0, 0.0, 1.0])
        .with(SCALE, 3.0)
        .with(OFFSET, -1.0);
    let f = UtilityFunction::new(UtilityKind::Arithmetic, Some(terms), Some(&params)).unwrap();
    // (2*1 + 3*0 + 4*1) * 3 - 1
    assert_eq!(f.execute(None, None).unwrap(), Value::scalar(17.0));
}

#[test]
fn test_arithmetic_mismatched_weights() {
    let terms = Value::vector(vec![2.0, 3.0, 4.0]);
    let params = ParamSet::new().with(WEIGHTS, vec![1.0, 0.0]);
    let err = UtilityFunction::new(UtilityKind::Arithmetic, Some(terms), Some(&params)).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("number of weights (2)"));
}

#[test]
fn test_arithmetic_call_weights_checked_against_call_variable() {
    let f = UtilityFunction::new(UtilityKind::Arithmetic, None, None).unwrap();
    let call = ParamSet::new().with(WEIGHTS, vec![1.0, 1.0]);
    let three = Value::vector(vec![1.0, 1.0, 1.0]);
    assert!(f.execute(Some(&three), Some(&call)).is_err());
    assert_eq!(f.execute(None, Some(&call)).unwrap(), Value::scalar(4.0));
}

// ============================================================================
// Integrator
// ============================================================================

fn integrate(weighting: &str) -> f64 {
    let params = ParamSet::new().with(RATE, 0.5).with(WEIGHTING, weighting);
    let f = UtilityFunction::new(
        UtilityKind::Integrator,
        Some(Value::vector(vec![10.0, 4.0])),
        Some(&params),
    )
    .unwrap();
    f.execute(None, None).unwrap().as_single().unwrap()
}

#[test]
fn test_integrator_policies() {
    assert_eq!(integrate("LINEAR"), 10.5);
    assert_eq!(integrate("SCALED"), 12.0);
    assert_eq!(integrate("TIME_AVERAGED"), 7.0);
}

#[test]
fn test_integrator_rejects_three_items() {
    let err = UtilityFunction::new(UtilityKind::Integrator, Some(Value::vector(vec![1.0, 2.0, 3.0])), None)
        .unwrap_err();
    assert!(err.is_configuration());
}

// ============================================================================
// Output coercion
// ============================================================================

#[test]
fn test_length_one_output_coerces_to_raw_number() {
    let mut f = UtilityFunction::new(UtilityKind::Linear, Some(Value::vector(vec![7.0])), None).unwrap();
    f.set_output_type(OutputType::RawNumber).unwrap();
    assert_eq!(f.execute(None, None).unwrap(), Value::scalar(7.0));
    assert_eq!(f.default_output().unwrap(), Value::scalar(7.0));
}

#[test]
fn test_raw_number_output_coerces_to_vector() {
    let mut f = UtilityFunction::new(UtilityKind::Linear, Some(Value::scalar(7.0)), None).unwrap();
    f.set_output_type(OutputType::Vector1D).unwrap();
    assert_eq!(f.execute(None, None).unwrap(), Value::vector(vec![7.0]));
}

#[test]
fn test_two_element_output_cannot_become_raw_number() {
    let mut f = UtilityFunction::new(UtilityKind::Linear, Some(Value::vector(vec![7.0, 8.0])), None).unwrap();
    let err = f.set_output_type(OutputType::RawNumber).unwrap_err();
    assert_eq!(
        err,
        CoreError::ShapeMismatch {
            context: "coercion to raw number".into(),
            expected: Shape::Scalar,
            got: Shape::Vector(2),
        }
    );
    assert_eq!(f.output_type(), OutputType::Natural);
}

// ============================================================================
// LinearMatrix
// ============================================================================

#[test]
fn test_call_matrix_override_is_scoped() {
    let f = UtilityFunction::new(UtilityKind::LinearMatrix, Some(Value::vector(vec![1.0, 2.0])), None)
        .unwrap();
    let call = ParamSet::new().with(MATRIX, 2.0);
    assert_eq!(f.execute(None, Some(&call)).unwrap(), Value::vector(vec![6.0, 6.0]));
    assert_eq!(f.execute(None, None).unwrap(), Value::vector(vec![1.0, 2.0]));
}

proptest! {
    #[test]
    fn matrix_shape_enforced(rows in 1usize..=5, cols in 1usize..=5,
                             sender in 1usize..=5, receiver in 1usize..=5) {
        prop_assume!(rows != sender || cols != receiver);
        let params = ParamSet::new()
            .with(MATRIX, vec![vec![1.0; cols]; rows])
            .with(RECEIVER, vec![0.0; receiver]);
        let built = UtilityFunction::new(
            UtilityKind::LinearMatrix,
            Some(Value::vector(vec![1.0; sender])),
            Some(&params),
        );
        prop_assert!(built.as_ref().is_err_and(|e| e.is_configuration()));
    }

    #[test]
    fn matching_matrix_accepted(rows in 1usize..=5, cols in 1usize..=5) {
        let params = ParamSet::new()
            .with(MATRIX, vec![vec![1.0; cols]; rows])
            .with(RECEIVER, vec![0.0; cols]);
        let f = UtilityFunction::new(
            UtilityKind::LinearMatrix,
            Some(Value::vector(vec![1.0; rows])),
            Some(&params),
        ).unwrap();
        prop_assert_eq!(f.natural_output(), &Value::vector(vec![rows as f64; cols]));
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_function_from_json() {
    let config = FunctionConfig::from_json(
        r#"{
            "kind": "Arithmetic",
            "params": {"weights": [1, 0, 1], "scale": 2, "offset": 1},
            "variable": [2, 3, 4]
        }"#,
    )
    .unwrap();
    let f = config.build().unwrap();
    assert_eq!(f.kind(), UtilityKind::Arithmetic);
    assert_eq!(f.natural_output(), &Value::scalar(13.0));
}

#[test]
fn test_unknown_kind_in_json() {
    assert!(FunctionConfig::from_json(r#"{"kind": "Sigmoid"}"#).is_err());
}
