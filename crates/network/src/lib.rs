//! # Network - Mechanisms, States and Projections
//!
//! A minimal arena of mechanisms and their states, plus the machinery that
//! wires projections between them:
//!
//! - **Network**: owns every entity; entities refer to each other by id
//! - **Wiring**: the staged pipeline that resolves a projection's sender and
//!   receiver, binds its transform and checks it against the receiver
//! - **Kinds**: Mapping (output → input) and ControlSignal (output → parameter)
//!
//! ```rust
//! use conduit_core::Value;
//! use conduit_network::{Network, ProjectionKind};
//!
//! let mut net = Network::new();
//! let a = net.add_transfer_mechanism("A", Value::vector(vec![0.0]), Value::vector(vec![5.0])).unwrap();
//! let b = net.add_transfer_mechanism("B", Value::vector(vec![0.0]), Value::vector(vec![0.0])).unwrap();
//! let p = net.project(ProjectionKind::Mapping, b, Some(a.into()), None).unwrap();
//! assert_eq!(net.execute_projection(p, None).unwrap(), Value::vector(vec![5.0]));
//! ```

pub mod kind;
mod mapping;
pub mod mechanism;
pub mod network;
pub mod projection;
pub mod state;
pub mod wiring;

pub use kind::ProjectionKind;
pub use mechanism::{Mechanism, Process};
pub use network::Network;
pub use projection::{Adjustment, Projection};
pub use state::{ProjectionId, State};
pub use wiring::make_projection;
