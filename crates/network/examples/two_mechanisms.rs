//! Two Mechanisms: Wiring a Mapping and a ControlSignal
//!
//! Run with: cargo run --example two_mechanisms
//!
//! This example demonstrates:
//! - Building mechanisms with input, output and parameter states
//! - A default Mapping (identity matrix) and an explicit weight matrix
//! - A ControlSignal whose output is coerced to a raw number
//! - What a failed wiring reports

use conduit_core::{CoreError, ParamSet, Preferences, StateRole, Value};
use conduit_network::kind::FUNCTION_PARAMS;
use conduit_network::{Network, ProjectionKind};

fn main() -> Result<(), CoreError> {
    println!("=== Two Mechanisms ===\n");

    let mut net = Network::with_preferences(Preferences::verbose());

    // -------------------------------------------------------------------------
    // Default Mapping
    // -------------------------------------------------------------------------
    println!("1. Default Mapping");
    println!("------------------");

    let a = net.add_transfer_mechanism("A", Value::vector(vec![0.0]), Value::vector(vec![0.0]))?;
    let b = net.add_transfer_mechanism("B", Value::vector(vec![0.0]), Value::vector(vec![0.0]))?;
    let ab = net.project(ProjectionKind::Mapping, b, Some(a.into()), None)?;

    let a_out = net.mechanism(a)?.primary_output().ok_or(CoreError::NotFound {
        what: "output state",
        index: a.0,
    })?;
    net.set_value(a_out, Value::vector(vec![5.0]))?;

    let projection = net.projection(ab)?;
    println!("{}: {} with matrix {:?}", projection.name(), projection.function().kind(), projection.function().matrix()?);
    println!("A.output = 5 → {}", net.execute_projection(ab, None)?);
    println!();

    // -------------------------------------------------------------------------
    // Explicit Matrix
    // -------------------------------------------------------------------------
    println!("2. Explicit Matrix (2 → 3)");
    println!("--------------------------");

    let c = net.add_transfer_mechanism("C", Value::vector(vec![0.0; 2]), Value::vector(vec![1.0, 2.0]))?;
    let d = net.add_transfer_mechanism("D", Value::vector(vec![0.0; 3]), Value::vector(vec![0.0; 3]))?;
    let weights = ParamSet::new().with(
        FUNCTION_PARAMS,
        ParamSet::new().with("matrix", vec![vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 1.0]]),
    );
    let cd = net.project(ProjectionKind::Mapping, d, Some(c.into()), Some(&weights))?;
    println!("[1, 2] → {}", net.update_projection(cd)?);
    for adjustment in net.projection(cd)?.adjustments() {
        println!("  adjusted: {}", adjustment);
    }
    println!();

    // -------------------------------------------------------------------------
    // ControlSignal
    // -------------------------------------------------------------------------
    println!("3. ControlSignal");
    println!("----------------");

    let gain = net.add_state(d, StateRole::Parameter, Value::scalar(1.0))?;
    let control = net.project(ProjectionKind::ControlSignal, d, Some(a.into()), None)?;
    let projection = net.projection(control)?;
    println!("{} → {} (receiver is state #{})", projection.name(), net.state(gain)?.name(), projection.receiver().0);
    println!("allocation = {}", net.execute_projection(control, None)?);
    println!();

    // -------------------------------------------------------------------------
    // Failure
    // -------------------------------------------------------------------------
    println!("4. A Wiring That Cannot Work");
    println!("----------------------------");

    match net.project(ProjectionKind::Mapping, d, Some(a.into()), None) {
        Ok(_) => println!("unexpectedly wired"),
        Err(e) => println!("Error: {}", e),
    }
    println!("projections still registered: {}", net.projections().count());
    net.validate()?;

    println!("\n=== Done ===");
    Ok(())
}
