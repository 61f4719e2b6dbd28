//! Test fixtures and builder patterns for DRPlacementControl.

use dr_e2e::crd::{
    Condition, DRPlacementControl, DRPlacementControlSpec, DRPlacementControlStatus, DrState,
    ObjectReference, PlacementDecision, ProgressionStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Builder for DRPlacementControl test fixtures.
///
/// # Example
/// ```ignore
/// let drpc = DrpcBuilder::new("app")
///     .phase(DrState::Deployed)
///     .ready()
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct DrpcBuilder {
    name: String,
    decision: Option<String>,
    phase: Option<DrState>,
    progression: Option<ProgressionStatus>,
    conditions: Vec<Condition>,
    last_group_sync_time: Option<String>,
    with_status: bool,
}

impl DrpcBuilder {
    /// Create a builder for a DRPC without status.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decision: None,
            phase: None,
            progression: None,
            conditions: Vec::new(),
            last_group_sync_time: None,
            with_status: false,
        }
    }

    /// Set the cluster of the placement decision.
    pub fn decision(mut self, cluster: impl Into<String>) -> Self {
        self.decision = Some(cluster.into());
        self.with_status = true;
        self
    }

    pub fn phase(mut self, phase: DrState) -> Self {
        self.phase = Some(phase);
        self.with_status = true;
        self
    }

    pub fn progression(mut self, progression: ProgressionStatus) -> Self {
        self.progression = Some(progression);
        self.with_status = true;
        self
    }

    /// Add a condition; the first entry of a type wins on lookup.
    pub fn condition(mut self, condition_type: &str, status: &str) -> Self {
        self.conditions
            .push(Condition::new(condition_type, status, "Test"));
        self.with_status = true;
        self
    }

    pub fn last_group_sync_time(mut self, time: impl Into<String>) -> Self {
        self.last_group_sync_time = Some(time.into());
        self.with_status = true;
        self
    }

    /// Set every readiness signal.
    pub fn ready(self) -> Self {
        self.condition("Available", "True")
            .condition("PeerReady", "True")
            .progression(ProgressionStatus::Completed)
            .last_group_sync_time("2024-01-01T00:00:00Z")
    }

    pub fn build(self) -> DRPlacementControl {
        let mut drpc = DRPlacementControl::new(
            &self.name,
            DRPlacementControlSpec {
                placement_ref: ObjectReference {
                    kind: Some("Placement".to_string()),
                    name: self.name.clone(),
                    ..Default::default()
                },
                dr_policy_ref: ObjectReference {
                    name: "dr-policy".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        drpc.metadata = ObjectMeta {
            name: Some(self.name),
            namespace: Some("ramen-ops".to_string()),
            ..Default::default()
        };
        if self.with_status {
            drpc.status = Some(DRPlacementControlStatus {
                phase: self.phase,
                progression: self.progression,
                conditions: self.conditions,
                preferred_decision: self.decision.map(|cluster_name| PlacementDecision {
                    cluster_name,
                    cluster_namespace: String::new(),
                }),
                last_group_sync_time: self.last_group_sync_time,
                ..Default::default()
            });
        }
        drpc
    }
}
