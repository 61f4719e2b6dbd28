//! Open Cluster Management resources.
//!
//! Simplified representations of the Placement, ManagedClusterSetBinding and
//! Channel CRDs, covering only the fields the suite sets. They are applied
//! as dynamic objects.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::GroupVersionKind;
use serde::{Deserialize, Serialize};

use super::common::standard_labels;

const CLUSTER_GROUP: &str = "cluster.open-cluster-management.io";
const APPS_GROUP: &str = "apps.open-cluster-management.io";

/// Annotation telling OCM to leave scheduling of a placement to ramen.
pub const SCHEDULING_DISABLE_ANNOTATION: &str =
    "cluster.open-cluster-management.io/experimental-scheduling-disable";

/// Placement kind.
pub fn placement_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk(CLUSTER_GROUP, "v1beta1", "Placement")
}

/// ManagedClusterSetBinding kind.
pub fn cluster_set_binding_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk(CLUSTER_GROUP, "v1beta2", "ManagedClusterSetBinding")
}

/// Channel kind.
pub fn channel_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk(APPS_GROUP, "v1", "Channel")
}

fn api_version(gvk: &GroupVersionKind) -> String {
    format!("{}/{}", gvk.group, gvk.version)
}

// ============================================================================
// Placement
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: PlacementSpec,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSpec {
    pub cluster_sets: Vec<String>,
    pub number_of_clusters: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicates: Vec<ClusterPredicate>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPredicate {
    pub required_cluster_selector: ClusterSelector,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSelector {
    pub label_selector: LabelSelector,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}

/// Label set by OCM on every ManagedCluster with its name.
const CLUSTER_NAME_LABEL: &str = "name";

/// Generate a placement pinned to `cluster` whose scheduling ramen takes
/// over once the DRPC exists.
pub fn generate_placement(name: &str, namespace: &str, cluster_set: &str, cluster: &str) -> Placement {
    let gvk = placement_gvk();
    let mut annotations = BTreeMap::new();
    annotations.insert(SCHEDULING_DISABLE_ANNOTATION.to_string(), "true".to_string());

    let mut match_labels = BTreeMap::new();
    match_labels.insert(CLUSTER_NAME_LABEL.to_string(), cluster.to_string());

    Placement {
        api_version: api_version(&gvk),
        kind: gvk.kind,
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(standard_labels()),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: PlacementSpec {
            cluster_sets: vec![cluster_set.to_string()],
            number_of_clusters: 1,
            predicates: vec![ClusterPredicate {
                required_cluster_selector: ClusterSelector {
                    label_selector: LabelSelector { match_labels },
                },
            }],
        },
    }
}

// ============================================================================
// ManagedClusterSetBinding
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSetBinding {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ManagedClusterSetBindingSpec,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSetBindingSpec {
    pub cluster_set: String,
}

/// Bind `cluster_set` into `namespace`. The binding must carry the set's name.
pub fn generate_cluster_set_binding(namespace: &str, cluster_set: &str) -> ManagedClusterSetBinding {
    let gvk = cluster_set_binding_gvk();
    ManagedClusterSetBinding {
        api_version: api_version(&gvk),
        kind: gvk.kind,
        metadata: ObjectMeta {
            name: Some(cluster_set.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(standard_labels()),
            ..Default::default()
        },
        spec: ManagedClusterSetBindingSpec {
            cluster_set: cluster_set.to_string(),
        },
    }
}

// ============================================================================
// Channel
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ChannelSpec,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSpec {
    #[serde(rename = "type")]
    pub channel_type: String,
    pub pathname: String,
}

/// Generate a git channel serving `url`.
pub fn generate_channel(name: &str, namespace: &str, url: &str) -> Channel {
    let gvk = channel_gvk();
    Channel {
        api_version: api_version(&gvk),
        kind: gvk.kind,
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(standard_labels()),
            ..Default::default()
        },
        spec: ChannelSpec {
            channel_type: "Git".to_string(),
            pathname: url.to_string(),
        },
    }
}
