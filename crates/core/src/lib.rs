//! # Core - Values, Shapes and Parameters
//!
//! The leaf layer every entity in a network passes through before it can run:
//!
//! - **Values and shapes**: scalar / 1-D / 2-D number containers
//! - **Compatibility**: whether a produced value can serve a consumer, and
//!   the narrow coercions allowed when it cannot
//! - **Parameters**: class defaults → instance defaults → per-call values,
//!   with a closed key set and a validation hook
//! - **Errors**: one taxonomy shared by the whole workspace
//! - **Registry / preferences**: explicit bookkeeping and verbosity
//!
//! ## Design Philosophy
//!
//! Wiring is checked before anything runs. A projection whose output cannot
//! reach its receiver is rejected at construction, never at execution time.

pub mod compat;
pub mod endpoint;
pub mod error;
pub mod params;
pub mod prefs;
pub mod registry;
pub mod shape;
pub mod value;

// Re-export key types at crate root for convenience
pub use compat::{coerce, is_compatible, OutputType};
pub use endpoint::{EndpointRef, MechanismId, ProcessId, StateId, StateRole};
pub use error::CoreError;
pub use params::{ParamSet, ParamStore, ParamValue, ValidateParams};
pub use prefs::Preferences;
pub use registry::Registry;
pub use shape::Shape;
pub use value::Value;
