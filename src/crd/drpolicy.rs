//! DRPolicy Custom Resource Definition.
//!
//! Cluster-scoped pairing of the two clusters a workload moves between.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// DRPolicy names the two DR clusters and the replication schedule.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ramendr.openshift.io",
    version = "v1alpha1",
    kind = "DRPolicy",
    plural = "drpolicies"
)]
#[serde(rename_all = "camelCase")]
pub struct DRPolicySpec {
    /// Managed cluster names. A valid policy has exactly two.
    #[serde(default)]
    pub dr_clusters: Vec<String>,

    /// Replication interval, e.g. "1m". Empty for synchronous policies.
    #[serde(default)]
    pub scheduling_interval: String,
}
