//! Run-time preferences shared by everything a network builds.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Preferences consulted during construction and execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Report non-fatal auto-corrections (reassigned variables, coerced
    /// outputs, fallback transforms) as warnings.
    pub verbose: bool,
}

impl Preferences {
    pub fn verbose() -> Self {
        Self { verbose: true }
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::config("preferences", format!("invalid JSON: {}", e)))
    }
}
