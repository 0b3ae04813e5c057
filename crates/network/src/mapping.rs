//! Mapping-specific checks.
//!
//! A Mapping conveys a sender's output to a receiver's input unchanged or
//! through a fixed matrix; its weights are never adapted.

use conduit_core::CoreError;
use conduit_functions::UtilityFunction;

use crate::state::State;

/// The receiver must take exactly as many elements as the projection emits.
pub(crate) fn check_lengths(
    projection: &str,
    sender: &str,
    receiver: &State,
    function: &UtilityFunction,
) -> Result<(), CoreError> {
    let output = function.default_output()?;
    if output.len() != receiver.value.len() {
        return Err(CoreError::Projection {
            projection: projection.to_string(),
            sender: sender.to_string(),
            receiver: receiver.name.clone(),
            output: output.shape(),
            expected: receiver.value.shape(),
            reason: format!(
                "receiver length ({}) does not equal the projection output length ({})",
                receiver.value.len(),
                output.len()
            ),
        });
    }
    Ok(())
}
