//! # Shapes
//!
//! A shape describes the container a value lives in: a single number, a flat
//! sequence, or a sequence of sequences. Shapes are what producers and
//! consumers agree on when a projection is wired; magnitudes never matter.
//!
//! Shapes are checked at runtime because networks are assembled dynamically
//! from parameter sets, not from types known at compile time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The container shape of a [`crate::Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// A single number (rank 0).
    Scalar,
    /// A flat sequence of `n` numbers.
    Vector(usize),
    /// A rectangular sequence of sequences.
    Matrix { rows: usize, cols: usize },
    /// A sequence of sequences whose rows differ in length.
    Ragged(Vec<usize>),
}

impl Shape {
    pub fn scalar() -> Self {
        Shape::Scalar
    }

    pub fn vector(len: usize) -> Self {
        Shape::Vector(len)
    }

    pub fn matrix(rows: usize, cols: usize) -> Self {
        Shape::Matrix { rows, cols }
    }

    /// Number of dimensions (rank).
    pub fn rank(&self) -> usize {
        match self {
            Shape::Scalar => 0,
            Shape::Vector(_) => 1,
            Shape::Matrix { .. } | Shape::Ragged(_) => 2,
        }
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        match self {
            Shape::Scalar => 1,
            Shape::Vector(n) => *n,
            Shape::Matrix { rows, cols } => rows * cols,
            Shape::Ragged(rows) => rows.iter().sum(),
        }
    }

    /// Length of the outer dimension; a scalar counts as one.
    pub fn outer_len(&self) -> usize {
        match self {
            Shape::Scalar => 1,
            Shape::Vector(n) => *n,
            Shape::Matrix { rows, .. } => *rows,
            Shape::Ragged(rows) => rows.len(),
        }
    }

    /// True when the shape holds exactly one number, in any container.
    pub fn is_single(&self) -> bool {
        self.numel() == 1 && !matches!(self, Shape::Ragged(_))
    }

    /// Check if a value of this shape can stand in for one of `other`'s shape.
    ///
    /// Equal shapes are compatible, and so are a scalar and a length-1 vector
    /// (in either direction). Nothing else is.
    pub fn is_compatible(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Scalar, Shape::Vector(1)) | (Shape::Vector(1), Shape::Scalar) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => write!(f, "f64[]"),
            Shape::Vector(n) => write!(f, "f64[{}]", n),
            Shape::Matrix { rows, cols } => write!(f, "f64[{}, {}]", rows, cols),
            Shape::Ragged(rows) => write!(
                f,
                "f64[ragged {}]",
                rows.iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join("/")
            ),
        }
    }
}
