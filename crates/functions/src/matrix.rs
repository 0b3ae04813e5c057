//! # LinearMatrix
//!
//! Maps a sender vector to a receiver vector through a weight matrix:
//!
//! ```text
//!                      receiver elements (cols)
//!                        0      1      2
//!   sender       0    [0,0]  [0,1]  [0,2]
//!   elements     1    [1,0]  [1,1]  [1,2]
//!   (rows)
//!
//!   value[j] = Σᵢ variable[i] · matrix[i][j]
//! ```
//!
//! The `matrix` parameter is one of:
//! - an explicit matrix (rows = sender length, cols = receiver length),
//! - a filler number broadcast to a sender × receiver matrix,
//! - the keyword `IdentityMatrix` (sender and receiver lengths must agree).
//!
//! The `receiver` parameter is a template vector whose length sets the
//! column count; when unset the sender is used as the template.

use conduit_core::{CoreError, ParamSet, ParamValue, Shape, Value};

use crate::kind::OUTPUT_CONVERSION;

pub const MATRIX: &str = "matrix";
pub const RECEIVER: &str = "receiver";

/// Keyword selecting the identity matrix.
pub const IDENTITY_MATRIX: &str = "IdentityMatrix";

pub(crate) fn defaults() -> ParamSet {
    ParamSet::new()
        .with(MATRIX, IDENTITY_MATRIX)
        .with_unset(RECEIVER)
        .with(OUTPUT_CONVERSION, true)
}

pub(crate) fn default_variable() -> Value {
    Value::vector(vec![0.0])
}

pub(crate) fn validate_variable(entity: &str, variable: Value) -> Result<Value, CoreError> {
    match variable {
        Value::Scalar(x) => Ok(Value::Vector(vec![x])),
        Value::Vector(_) => Ok(variable),
        Value::Matrix(_) => Err(CoreError::config(
            entity,
            format!("variable must be a 1-D vector, got {}", variable.shape()),
        )),
    }
}

/// Matrix specification after structural validation.
#[derive(Debug, Clone, PartialEq)]
enum Spec<'a> {
    Identity,
    Filler(f64),
    Explicit(&'a Vec<Vec<f64>>),
}

fn spec<'a>(entity: &str, params: &'a ParamSet) -> Result<Spec<'a>, CoreError> {
    let invalid = |got: &dyn std::fmt::Debug| {
        CoreError::config(
            entity,
            format!(
                "matrix must be a matrix, a number, or the keyword '{}', got {:?}",
                IDENTITY_MATRIX, got
            ),
        )
    };
    match params.get(MATRIX) {
        Some(ParamValue::Keyword(k)) if k == IDENTITY_MATRIX => Ok(Spec::Identity),
        Some(ParamValue::Number(x)) | Some(ParamValue::Value(Value::Scalar(x))) => Ok(Spec::Filler(*x)),
        Some(ParamValue::Value(m @ Value::Matrix(rows))) => match m.shape() {
            Shape::Ragged(_) => Err(invalid(rows)),
            _ => Ok(Spec::Explicit(rows)),
        },
        Some(other) => Err(invalid(other)),
        None => Err(invalid(&"nothing")),
    }
}

fn receiver_len(entity: &str, variable: &Value, params: &ParamSet) -> Result<usize, CoreError> {
    match params.get(RECEIVER) {
        None => Ok(variable.len()),
        Some(ParamValue::Value(Value::Vector(v))) => Ok(v.len()),
        Some(other) => Err(CoreError::config(
            entity,
            format!("receiver must be a list of numbers, got {:?}", other),
        )),
    }
}

pub(crate) fn validate_structure(entity: &str, params: &mut ParamSet) -> Result<(), CoreError> {
    // a bare number (or scalar) receiver is a one-element template
    if let Some(x) = params.get(RECEIVER).and_then(ParamValue::as_number) {
        params.insert(RECEIVER, vec![x]);
    }
    if let Some(ParamValue::Value(Value::Matrix(_))) = params.get(RECEIVER) {
        return Err(CoreError::config(entity, "receiver must be a list of numbers, got a matrix"));
    }
    spec(entity, params)?;
    Ok(())
}

pub(crate) fn validate_semantics(entity: &str, variable: &Value, params: &ParamSet) -> Result<(), CoreError> {
    let sender_len = variable.len();
    let receiver_len = receiver_len(entity, variable, params)?;
    match spec(entity, params)? {
        Spec::Filler(_) => Ok(()),
        Spec::Identity if sender_len != receiver_len => Err(CoreError::config(
            entity,
            format!(
                "sender length ({}) must equal receiver length ({}) to use the identity matrix",
                sender_len, receiver_len
            ),
        )),
        Spec::Identity => Ok(()),
        Spec::Explicit(rows) => {
            let n_rows = rows.len();
            let n_cols = rows.first().map_or(0, Vec::len);
            if n_rows != sender_len {
                return Err(CoreError::config(
                    entity,
                    format!(
                        "the number of rows ({}) of the matrix does not equal the length ({}) of the sender vector",
                        n_rows, sender_len
                    ),
                ));
            }
            if n_cols != receiver_len {
                return Err(CoreError::config(
                    entity,
                    format!(
                        "the number of columns ({}) of the matrix does not equal the length ({}) of the receiver vector",
                        n_cols, receiver_len
                    ),
                ));
            }
            Ok(())
        }
    }
}

/// Build the weight matrix described by a validated parameter set.
pub fn implement(entity: &str, variable: &Value, params: &ParamSet) -> Result<Vec<Vec<f64>>, CoreError> {
    validate_semantics(entity, variable, params)?;
    let rows = variable.len();
    let cols = receiver_len(entity, variable, params)?;
    Ok(match spec(entity, params)? {
        Spec::Filler(x) => vec![vec![x; cols]; rows],
        Spec::Identity => (0..rows)
            .map(|i| (0..cols).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect(),
        Spec::Explicit(m) => m.clone(),
    })
}

pub(crate) fn compute(entity: &str, variable: &Value, params: &ParamSet) -> Result<Value, CoreError> {
    let matrix = implement(entity, variable, params)?;
    Ok(Value::Vector(dot(&variable.flatten(), &matrix)))
}

/// `v · M` for a row vector `v` and a rectangular matrix `M`.
pub(crate) fn dot(v: &[f64], matrix: &[Vec<f64>]) -> Vec<f64> {
    let cols = matrix.first().map_or(0, Vec::len);
    (0..cols)
        .map(|j| v.iter().zip(matrix).map(|(x, row)| x * row[j]).sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passes_through() {
        let v = Value::vector(vec![1.0, -2.0, 3.0]);
        let out = compute("LinearMatrix", &v, &defaults()).unwrap();
        assert_eq!(out, v);
    }

    #[test]
    fn test_filler_broadcasts() {
        let params = defaults()
            .with(MATRIX, 0.5)
            .with(RECEIVER, vec![0.0, 0.0, 0.0]);
        let m = implement("LinearMatrix", &Value::vector(vec![1.0, 1.0]), &params).unwrap();
        assert_eq!(m, vec![vec![0.5; 3]; 2]);
    }

    #[test]
    fn test_explicit_matrix_product() {
        // [1 2] · [[1 0 1]
        //          [0 1 1]] = [1 2 3]
        let params = defaults()
            .with(MATRIX, vec![vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 1.0]])
            .with(RECEIVER, vec![0.0; 3]);
        let out = compute("LinearMatrix", &Value::vector(vec![1.0, 2.0]), &params).unwrap();
        assert_eq!(out, Value::vector(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_identity_requires_equal_lengths() {
        let params = defaults().with(RECEIVER, vec![0.0; 3]);
        let err = validate_semantics("LinearMatrix", &Value::vector(vec![1.0, 2.0]), &params)
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unknown_keyword_rejected() {
        let mut params = defaults().with(MATRIX, "RandomMatrix");
        assert!(validate_structure("LinearMatrix", &mut params).is_err());
    }

    #[test]
    fn test_scalar_variable_becomes_vector() {
        let v = validate_variable("LinearMatrix", Value::scalar(4.0)).unwrap();
        assert_eq!(v, Value::vector(vec![4.0]));
    }
}
