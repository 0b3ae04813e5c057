//! # Value Compatibility
//!
//! Pure predicates and conversions deciding whether a produced value can
//! serve as (or be turned into) a value of a required shape.
//!
//! The conversions allowed by [`coerce`] are deliberately narrow:
//!
//! | Mode | Accepts |
//! |------|---------|
//! | `RawNumber` | scalar, length-1 vector, 1×1 matrix |
//! | `Vector1D` | scalar (wrapped), vector, single-row matrix |
//! | `Matrix2D` | scalar, vector, rectangular or ragged matrix |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::shape::Shape;
use crate::value::Value;

/// Declared policy for reshaping a function's natural output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputType {
    /// Return whatever the transform produces.
    #[default]
    Natural,
    /// Expose a single number.
    RawNumber,
    /// Force a flat sequence.
    Vector1D,
    /// Force a sequence of sequences.
    Matrix2D,
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputType::Natural => "natural",
            OutputType::RawNumber => "raw number",
            OutputType::Vector1D => "1-D vector",
            OutputType::Matrix2D => "2-D matrix",
        };
        f.write_str(name)
    }
}

/// Can `candidate` be used where `reference` is expected?
pub fn is_compatible(candidate: &Value, reference: &Value) -> bool {
    candidate.shape().is_compatible(&reference.shape())
}

/// Check, from its shape alone, that a value could be coerced to `mode`.
pub fn check_coercion(shape: &Shape, mode: OutputType) -> Result<(), CoreError> {
    let legal = match mode {
        OutputType::Natural | OutputType::Matrix2D => true,
        OutputType::RawNumber => shape.is_single(),
        OutputType::Vector1D => match shape {
            Shape::Scalar | Shape::Vector(_) => true,
            Shape::Matrix { rows, .. } => *rows == 1,
            Shape::Ragged(_) => false,
        },
    };
    if legal {
        Ok(())
    } else {
        Err(mismatch(format!("coercion to {}", mode), target_shape(shape, mode), shape.clone()))
    }
}

/// Convert `value` to the container demanded by `mode`.
pub fn coerce(value: &Value, mode: OutputType) -> Result<Value, CoreError> {
    check_coercion(&value.shape(), mode)?;
    let coerced = match (mode, value) {
        (OutputType::Natural, v) => v.clone(),
        (OutputType::RawNumber, v) => match v.as_single() {
            Some(x) => Value::Scalar(x),
            None => {
                return Err(mismatch("coercion to raw number", Shape::Scalar, v.shape()));
            }
        },
        (OutputType::Vector1D, Value::Scalar(x)) => Value::Vector(vec![*x]),
        (OutputType::Vector1D, Value::Vector(v)) => Value::Vector(v.clone()),
        (OutputType::Vector1D, Value::Matrix(rows)) => {
            Value::Vector(rows.first().cloned().unwrap_or_default())
        }
        (OutputType::Matrix2D, Value::Scalar(x)) => Value::Matrix(vec![vec![*x]]),
        (OutputType::Matrix2D, Value::Vector(v)) => Value::Matrix(vec![v.clone()]),
        (OutputType::Matrix2D, Value::Matrix(rows)) => Value::Matrix(rows.clone()),
    };
    Ok(coerced)
}

fn target_shape(shape: &Shape, mode: OutputType) -> Shape {
    match mode {
        OutputType::Natural => shape.clone(),
        OutputType::RawNumber => Shape::Scalar,
        OutputType::Vector1D => Shape::Vector(shape.numel()),
        OutputType::Matrix2D => Shape::Matrix {
            rows: 1,
            cols: shape.numel(),
        },
    }
}

fn mismatch(context: impl Into<String>, expected: Shape, got: Shape) -> CoreError {
    CoreError::ShapeMismatch {
        context: context.into(),
        expected,
        got,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_one_to_raw_number() {
        let v = coerce(&Value::vector(vec![7.0]), OutputType::RawNumber).unwrap();
        assert_eq!(v, Value::scalar(7.0));
    }

    #[test]
    fn test_raw_number_to_vector() {
        let v = coerce(&Value::scalar(7.0), OutputType::Vector1D).unwrap();
        assert_eq!(v, Value::vector(vec![7.0]));
    }

    #[test]
    fn test_two_elements_cannot_become_raw_number() {
        let err = coerce(&Value::vector(vec![7.0, 8.0]), OutputType::RawNumber).unwrap_err();
        match err {
            CoreError::ShapeMismatch { expected, got, .. } => {
                assert_eq!(expected, Shape::Scalar);
                assert_eq!(got, Shape::Vector(2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_multi_row_matrix_cannot_become_vector() {
        let m = Value::matrix(vec![vec![1.0], vec![2.0]]);
        assert!(coerce(&m, OutputType::Vector1D).is_err());
        let single_row = Value::matrix(vec![vec![1.0, 2.0]]);
        assert_eq!(
            coerce(&single_row, OutputType::Vector1D).unwrap(),
            Value::vector(vec![1.0, 2.0])
        );
    }

    #[test]
    fn test_anything_becomes_matrix() {
        assert_eq!(
            coerce(&Value::scalar(3.0), OutputType::Matrix2D).unwrap(),
            Value::matrix(vec![vec![3.0]])
        );
        assert_eq!(
            coerce(&Value::vector(vec![1.0, 2.0]), OutputType::Matrix2D).unwrap(),
            Value::matrix(vec![vec![1.0, 2.0]])
        );
    }

    #[test]
    fn test_compatibility_ignores_magnitude() {
        assert!(is_compatible(&Value::scalar(1e9), &Value::scalar(-3.0)));
        assert!(is_compatible(&Value::scalar(1.0), &Value::vector(vec![2.0])));
        assert!(!is_compatible(&Value::vector(vec![1.0, 2.0]), &Value::vector(vec![1.0])));
    }
}
