//! DRPlacementControl Custom Resource Definition.
//!
//! Client-side view of the DR controller's DRPlacementControl (DRPC). Only the
//! fields the test flow writes or observes are modeled; unknown fields are
//! ignored on deserialization.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Condition;

/// DRPlacementControl protects one application across the clusters of a DRPolicy.
///
/// Example:
/// ```yaml
/// apiVersion: ramendr.openshift.io/v1alpha1
/// kind: DRPlacementControl
/// metadata:
///   name: disapp-deploy-rbd
///   namespace: ramen-ops
/// spec:
///   drPolicyRef:
///     name: dr-policy
///   placementRef:
///     kind: Placement
///     name: disapp-deploy-rbd
///   preferredCluster: dr1
///   pvcSelector:
///     matchLabels:
///       appname: busybox
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ramendr.openshift.io",
    version = "v1alpha1",
    kind = "DRPlacementControl",
    plural = "drplacementcontrols",
    shortname = "drpc",
    status = "DRPlacementControlStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct DRPlacementControlSpec {
    /// Placement that selects the cluster running the application.
    pub placement_ref: ObjectReference,

    /// DRPolicy pairing the two clusters.
    pub dr_policy_ref: ObjectReference,

    /// Cluster the application should run on when no action is requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_cluster: Option<String>,

    /// Cluster to fail over to when `action` is `Failover`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover_cluster: Option<String>,

    /// Requested DR action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<DrAction>,

    /// Selects the PVCs to protect.
    #[serde(default)]
    pub pvc_selector: LabelSelector,

    /// Namespaces protected for discovered applications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected_namespaces: Option<Vec<String>>,

    /// Kubernetes object protection for discovered applications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_object_protection: Option<KubeObjectProtectionSpec>,
}

/// Reference to another object by kind and name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Label selector limited to `matchLabels`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}

/// Kubernetes object protection settings.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeObjectProtectionSpec {
    /// Interval between captures, e.g. "1m".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_interval: Option<String>,
    /// Selects the objects to capture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_object_selector: Option<LabelSelector>,
}

/// DR action requested on a DRPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum DrAction {
    Failover,
    Relocate,
}

impl std::fmt::Display for DrAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrAction::Failover => write!(f, "Failover"),
            DrAction::Relocate => write!(f, "Relocate"),
        }
    }
}

/// Observed state of a DRPC. Written only by the DR controller.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DRPlacementControlStatus {
    /// Coarse lifecycle stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<DrState>,

    /// Progress of the operation in flight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progression: Option<ProgressionStatus>,

    /// Status conditions, e.g. Available and PeerReady.
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Cluster currently selected by the placement decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_decision: Option<PlacementDecision>,

    /// Time of the last successful group sync (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_group_sync_time: Option<String>,

    /// Time the current action started (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_start_time: Option<String>,
}

/// Cluster selected for the application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDecision {
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub cluster_namespace: String,
}

/// DRPC lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum DrState {
    WaitForUser,
    Initiating,
    Deploying,
    Deployed,
    FailingOver,
    FailedOver,
    Relocating,
    Relocated,
    Deleting,
    /// Any value this client does not know, including the empty string.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for DrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrState::WaitForUser => write!(f, "WaitForUser"),
            DrState::Initiating => write!(f, "Initiating"),
            DrState::Deploying => write!(f, "Deploying"),
            DrState::Deployed => write!(f, "Deployed"),
            DrState::FailingOver => write!(f, "FailingOver"),
            DrState::FailedOver => write!(f, "FailedOver"),
            DrState::Relocating => write!(f, "Relocating"),
            DrState::Relocated => write!(f, "Relocated"),
            DrState::Deleting => write!(f, "Deleting"),
            DrState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Fine-grained progression of the DRPC's current operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum ProgressionStatus {
    Completed,
    CreatingMW,
    UpdatingPlRule,
    WaitForReadiness,
    #[serde(rename = "Cleaning Up")]
    CleaningUp,
    WaitOnUserToCleanUp,
    CheckingFailoverPrerequisites,
    FailingOverToCluster,
    WaitForFencing,
    WaitForStorageMaintenanceActivation,
    PreparingFinalSync,
    ClearingPlacement,
    RunningFinalSync,
    FinalSyncComplete,
    EnsuringVolumesAreSecondary,
    WaitingForResourceRestore,
    UpdatedPlacement,
    EnsuringVolSyncSetup,
    SettingUpVolSyncDest,
    Deleting,
    Deleted,
    Paused,
    /// Any value this client does not know.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ProgressionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProgressionStatus::Completed => "Completed",
            ProgressionStatus::CreatingMW => "CreatingMW",
            ProgressionStatus::UpdatingPlRule => "UpdatingPlRule",
            ProgressionStatus::WaitForReadiness => "WaitForReadiness",
            ProgressionStatus::CleaningUp => "Cleaning Up",
            ProgressionStatus::WaitOnUserToCleanUp => "WaitOnUserToCleanUp",
            ProgressionStatus::CheckingFailoverPrerequisites => "CheckingFailoverPrerequisites",
            ProgressionStatus::FailingOverToCluster => "FailingOverToCluster",
            ProgressionStatus::WaitForFencing => "WaitForFencing",
            ProgressionStatus::WaitForStorageMaintenanceActivation => {
                "WaitForStorageMaintenanceActivation"
            }
            ProgressionStatus::PreparingFinalSync => "PreparingFinalSync",
            ProgressionStatus::ClearingPlacement => "ClearingPlacement",
            ProgressionStatus::RunningFinalSync => "RunningFinalSync",
            ProgressionStatus::FinalSyncComplete => "FinalSyncComplete",
            ProgressionStatus::EnsuringVolumesAreSecondary => "EnsuringVolumesAreSecondary",
            ProgressionStatus::WaitingForResourceRestore => "WaitingForResourceRestore",
            ProgressionStatus::UpdatedPlacement => "UpdatedPlacement",
            ProgressionStatus::EnsuringVolSyncSetup => "EnsuringVolSyncSetup",
            ProgressionStatus::SettingUpVolSyncDest => "SettingUpVolSyncDest",
            ProgressionStatus::Deleting => "Deleting",
            ProgressionStatus::Deleted => "Deleted",
            ProgressionStatus::Paused => "Paused",
            ProgressionStatus::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

impl DRPlacementControl {
    /// Cluster currently hosting the application.
    ///
    /// Prefers the placement decision reported in status and falls back to
    /// `spec.preferredCluster`.
    pub fn current_cluster(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.preferred_decision.as_ref())
            .map(|d| d.cluster_name.as_str())
            .filter(|name| !name.is_empty())
            .or(self.spec.preferred_cluster.as_deref())
    }
}
