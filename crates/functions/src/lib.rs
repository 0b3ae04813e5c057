//! # Functions - Parameterized Value Transforms
//!
//! The transforms a projection binds to carry a sender's value to its
//! receiver:
//!
//! - **Linear** / **Exponential**: elementwise transfer
//! - **Integrator**: accumulate `[old, new]` under a weighting policy
//! - **Arithmetic**: weighted SUM / PRODUCT of terms
//! - **LinearMatrix**: vector-matrix product with identity / filler / explicit weights
//!
//! Each kind declares its class defaults and validates its parameters
//! through the [`conduit_core::ValidateParams`] hook. A [`UtilityFunction`]
//! owns the parameter tiers and applies the declared output type.
//!
//! ```rust
//! use conduit_core::{ParamSet, Value};
//! use conduit_functions::{UtilityFunction, UtilityKind};
//!
//! let params = ParamSet::new().with("slope", 2.0);
//! let f = UtilityFunction::new(UtilityKind::Linear, None, Some(&params)).unwrap();
//! assert_eq!(f.execute(Some(&Value::vector(vec![3.0])), None).unwrap(), Value::vector(vec![6.0]));
//! ```

pub mod arithmetic;
pub mod exponential;
pub mod function;
pub mod integrator;
pub mod kind;
pub mod linear;
pub mod matrix;

pub use arithmetic::Operation;
pub use function::{FunctionConfig, UtilityFunction};
pub use integrator::Weighting;
pub use kind::{UtilityKind, OUTPUT_CONVERSION};
