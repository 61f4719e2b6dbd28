//! DR cluster pairing and failover target selection.

use std::future::Future;

use kube::{Api, Client, ResourceExt};
use tracing::debug;

use crate::crd::DRPolicy;
use crate::error::{Error, Result};
use crate::wait::ExecContext;

/// Named pair of exactly two DR clusters.
///
/// Order carries no priority; it only makes target selection deterministic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterPolicy {
    name: String,
    clusters: [String; 2],
}

impl ClusterPolicy {
    pub fn new(name: impl Into<String>, first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clusters: [first.into(), second.into()],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clusters(&self) -> &[String; 2] {
        &self.clusters
    }

    /// Whether `cluster` is one of the pair.
    pub fn contains(&self, cluster: &str) -> bool {
        self.clusters.iter().any(|c| c == cluster)
    }
}

impl TryFrom<&DRPolicy> for ClusterPolicy {
    type Error = Error;

    fn try_from(policy: &DRPolicy) -> Result<Self> {
        match policy.spec.dr_clusters.as_slice() {
            [first, second] => Ok(Self::new(policy.name_any(), first, second)),
            other => Err(Error::Policy(format!(
                "drpolicy {:?} must list exactly 2 clusters, found {}",
                policy.name_any(),
                other.len()
            ))),
        }
    }
}

/// Pick the cluster a workload moves to from `current`.
///
/// Selection is positional: the second entry when `current` is the first,
/// otherwise the first. A `current` outside the pair therefore yields the
/// first entry; callers that care check [`ClusterPolicy::contains`].
pub fn target_cluster<'a>(policy: &'a ClusterPolicy, current: &str) -> &'a str {
    let [first, second] = &policy.clusters;
    if current == first { second } else { first }
}

/// Looks up DR policies.
pub trait PolicyLookup: Send + Sync {
    fn get_policy(
        &self,
        ctx: &ExecContext,
        cluster: &str,
        name: &str,
    ) -> impl Future<Output = Result<ClusterPolicy>> + Send;
}

/// Reads DRPolicy resources from the hub.
#[derive(Clone)]
pub struct KubePolicyLookup {
    client: Client,
}

impl KubePolicyLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl PolicyLookup for KubePolicyLookup {
    async fn get_policy(&self, ctx: &ExecContext, cluster: &str, name: &str) -> Result<ClusterPolicy> {
        let api: Api<DRPolicy> = Api::all(self.client.clone());
        let policy = tokio::select! {
            biased;
            reason = ctx.done() => return Err(Error::Interrupted(reason)),
            result = api.get(name) => result?,
        };
        debug!(cluster = %cluster, policy = %name, clusters = ?policy.spec.dr_clusters, "Got drpolicy");

        ClusterPolicy::try_from(&policy)
    }
}
