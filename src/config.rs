//! Suite configuration.
//!
//! Loaded once from a YAML file before any scenario starts. Every problem
//! found here is fatal for the run.
//!
//! Example:
//! ```yaml
//! drPolicy: dr-policy
//! clusterSet: default
//! clusters:
//!   hub: {name: hub, kubeconfig: ~/.config/drenv/rdr/kubeconfigs/hub}
//!   c1: {name: dr1, kubeconfig: ~/.config/drenv/rdr/kubeconfigs/dr1}
//!   c2: {name: dr2, kubeconfig: ~/.config/drenv/rdr/kubeconfigs/dr2}
//! pvcSpecs:
//!   - name: rbd
//!     storageClassName: rook-ceph-block
//!     accessModes: [ReadWriteOnce]
//! tests:
//!   - workload: deploy
//!     deployer: disapp
//!     pvcSpec: rbd
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default scenario budget in seconds
pub const DEFAULT_SCENARIO_TIMEOUT_SECS: u64 = 1800;

/// Default delay between poll attempts in seconds
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 5;

/// Top-level suite configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Git repository served by the channel.
    #[serde(default)]
    pub repo: RepoConfig,

    /// DRPolicy protecting every scenario's workload.
    pub dr_policy: String,

    /// ManagedClusterSet the placements select from.
    #[serde(default = "default_cluster_set")]
    pub cluster_set: String,

    /// Hub and managed cluster access.
    pub clusters: ClustersConfig,

    /// Storage variants scenarios can reference.
    #[serde(default)]
    pub pvc_specs: Vec<PvcSpec>,

    /// Scenario matrix.
    #[serde(default)]
    pub tests: Vec<TestConfig>,

    #[serde(default)]
    pub namespaces: NamespacesConfig,

    #[serde(default)]
    pub channel: ChannelConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

fn default_cluster_set() -> String {
    "default".to_string()
}

/// Git repository settings.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoConfig {
    #[serde(default = "default_repo_url")]
    pub url: String,
    #[serde(default = "default_repo_branch")]
    pub branch: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            url: default_repo_url(),
            branch: default_repo_branch(),
        }
    }
}

fn default_repo_url() -> String {
    "https://github.com/RamenDR/ocm-ramen-samples.git".to_string()
}

fn default_repo_branch() -> String {
    "main".to_string()
}

/// The hub and the two managed clusters.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClustersConfig {
    pub hub: ClusterConfig,
    pub c1: ClusterConfig,
    pub c2: ClusterConfig,
}

/// Access to one cluster.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Cluster name as known to the hub (managed cluster name).
    pub name: String,
    /// Path to the kubeconfig file.
    pub kubeconfig: PathBuf,
    /// Context to use from the kubeconfig; its current context when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Storage variant for a workload's PVC.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PvcSpec {
    pub name: String,
    #[serde(default)]
    pub storage_class_name: String,
    #[serde(default)]
    pub access_modes: Vec<String>,
    #[serde(default = "default_pvc_size")]
    pub size: String,
}

fn default_pvc_size() -> String {
    "1Gi".to_string()
}

/// One scenario of the test matrix.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    pub workload: String,
    pub deployer: String,
    pub pvc_spec: String,
}

impl TestConfig {
    /// Scenario name: `{deployer}-{workload}-{pvcSpec}`.
    pub fn scenario_name(&self) -> String {
        format!("{}-{}-{}", self.deployer, self.workload, self.pvc_spec)
    }
}

/// Well-known namespaces on the hub.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespacesConfig {
    /// Namespace holding DRPCs and placements of discovered applications.
    #[serde(default = "default_ramen_ops")]
    pub ramen_ops: String,
}

impl Default for NamespacesConfig {
    fn default() -> Self {
        Self {
            ramen_ops: default_ramen_ops(),
        }
    }
}

fn default_ramen_ops() -> String {
    "ramen-ops".to_string()
}

/// Channel shared by all scenarios.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    #[serde(default = "default_channel_name")]
    pub name: String,
    #[serde(default = "default_channel_namespace")]
    pub namespace: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
            namespace: default_channel_namespace(),
        }
    }
}

fn default_channel_name() -> String {
    "ramen-gitops".to_string()
}

fn default_channel_namespace() -> String {
    "e2e-gitops".to_string()
}

/// Time budgets, in seconds.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutsConfig {
    /// Budget for one whole scenario.
    #[serde(default = "default_scenario_timeout")]
    pub scenario: u64,
    /// Delay between poll attempts.
    #[serde(default = "default_retry_interval")]
    pub retry_interval: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            scenario: default_scenario_timeout(),
            retry_interval: default_retry_interval(),
        }
    }
}

fn default_scenario_timeout() -> u64 {
    DEFAULT_SCENARIO_TIMEOUT_SECS
}

fn default_retry_interval() -> u64 {
    DEFAULT_RETRY_INTERVAL_SECS
}

impl TimeoutsConfig {
    pub fn scenario_timeout(&self) -> Duration {
        Duration::from_secs(self.scenario)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval)
    }
}

impl Config {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    /// Parse and validate configuration text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.tests.is_empty() {
            return Err(Error::Config(
                "no tests found in the configuration file".to_string(),
            ));
        }

        if self.timeouts.retry_interval == 0 {
            return Err(Error::Config("retryInterval must be positive".to_string()));
        }

        if self.timeouts.scenario == 0 {
            return Err(Error::Config("scenario timeout must be positive".to_string()));
        }

        if self.dr_policy.is_empty() {
            return Err(Error::Config("drPolicy is required".to_string()));
        }

        let mut names = BTreeSet::new();
        for test in &self.tests {
            self.pvc_spec(&test.pvc_spec)?;
            let name = test.scenario_name();
            if !names.insert(name.clone()) {
                return Err(Error::Config(format!("duplicate test {:?}", name)));
            }
        }

        Ok(())
    }

    /// Look up a PVC spec by name.
    pub fn pvc_spec(&self, name: &str) -> Result<&PvcSpec> {
        self.pvc_specs
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::unknown_pvc_spec(name))
    }
}
