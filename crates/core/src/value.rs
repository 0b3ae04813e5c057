//! # Values
//!
//! The semantic container of numbers that flows along projections: a single
//! number, a flat sequence, or a sequence of sequences.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shape::Shape;

/// A scalar, 1-D or 2-D container of `f64`.
///
/// Serialized untagged, so `5`, `[1, 2]` and `[[1], [2]]` all parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(f64),
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

impl Value {
    pub fn scalar(x: f64) -> Self {
        Value::Scalar(x)
    }

    pub fn vector(data: impl Into<Vec<f64>>) -> Self {
        Value::Vector(data.into())
    }

    pub fn matrix(rows: Vec<Vec<f64>>) -> Self {
        Value::Matrix(rows)
    }

    /// A value of the same shape with every element set to zero.
    pub fn zeros_like(&self) -> Self {
        self.map(|_| 0.0)
    }

    /// The container shape of this value.
    pub fn shape(&self) -> Shape {
        match self {
            Value::Scalar(_) => Shape::Scalar,
            Value::Vector(v) => Shape::Vector(v.len()),
            Value::Matrix(rows) => {
                let cols = rows.first().map_or(0, Vec::len);
                if rows.iter().all(|r| r.len() == cols) {
                    Shape::Matrix {
                        rows: rows.len(),
                        cols,
                    }
                } else {
                    Shape::Ragged(rows.iter().map(Vec::len).collect())
                }
            }
        }
    }

    /// Length of the outer dimension (a scalar counts as one).
    pub fn len(&self) -> usize {
        self.shape().outer_len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape().numel() == 0
    }

    /// The single number held by this value, in whatever container.
    pub fn as_single(&self) -> Option<f64> {
        match self {
            Value::Scalar(x) => Some(*x),
            Value::Vector(v) if v.len() == 1 => Some(v[0]),
            Value::Matrix(rows) if rows.len() == 1 && rows[0].len() == 1 => Some(rows[0][0]),
            _ => None,
        }
    }

    /// All elements in row-major order.
    pub fn flatten(&self) -> Vec<f64> {
        match self {
            Value::Scalar(x) => vec![*x],
            Value::Vector(v) => v.clone(),
            Value::Matrix(rows) => rows.iter().flatten().copied().collect(),
        }
    }

    /// Apply a function to each element, preserving the container.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Value {
        match self {
            Value::Scalar(x) => Value::Scalar(f(*x)),
            Value::Vector(v) => Value::Vector(v.iter().map(|&x| f(x)).collect()),
            Value::Matrix(rows) => Value::Matrix(
                rows.iter()
                    .map(|r| r.iter().map(|&x| f(x)).collect())
                    .collect(),
            ),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(v)
    }
}

impl From<Vec<Vec<f64>>> for Value {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        Value::Matrix(rows)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(x) => write!(f, "{}", x),
            Value::Vector(v) => write!(f, "{:?}", v),
            Value::Matrix(rows) => write!(f, "{:?}", rows),
        }
    }
}
