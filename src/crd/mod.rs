//! Custom Resource Definitions observed by the test flow.
//!
//! - `DRPlacementControl`: per-application DR state, polled for convergence
//! - `DRPolicy`: the cluster pair used to pick failover and relocate targets

mod drpc;
mod drpolicy;

pub use drpc::*;
pub use drpolicy::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition describes one aspect of a resource's state at a point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition.
    pub r#type: String,
    /// Status of the condition ("True", "False", "Unknown").
    pub status: String,
    /// Machine-readable reason for the condition's last transition.
    #[serde(default)]
    pub reason: String,
    /// Human-readable message indicating details about last transition.
    #[serde(default)]
    pub message: String,
    /// Last time the condition transitioned from one status to another.
    #[serde(default)]
    pub last_transition_time: String,
    /// The generation of the resource this condition was observed for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    /// Create a condition with the current time as transition time.
    pub fn new(condition_type: &str, status: &str, reason: &str) -> Self {
        Self {
            r#type: condition_type.to_string(),
            status: status.to_string(),
            reason: reason.to_string(),
            message: String::new(),
            last_transition_time: jiff::Timestamp::now().to_string(),
            observed_generation: None,
        }
    }
}
