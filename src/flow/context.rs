//! Scenario context: clusters, configuration and the pieces under test.

use std::fmt;
use std::sync::Arc;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use tracing::debug;

use crate::config::{ClusterConfig, ClustersConfig, Config, TestConfig};
use crate::deployers::{self, Deployer};
use crate::dr::actions;
use crate::error::{Error, Result};
use crate::wait::{ClusterScopedFetcher, ExecContext, KubeFetcher, Poller, TokioSleeper};
use crate::workloads::{self, Workload};

use super::sequencer::{Lifecycle, LifecycleStep};

/// A connected cluster.
#[derive(Clone)]
pub struct Cluster {
    pub name: String,
    pub client: Client,
}

impl Cluster {
    /// Connect using the cluster's kubeconfig file.
    pub async fn connect(config: &ClusterConfig) -> Result<Self> {
        let kubeconfig = Kubeconfig::read_from(&config.kubeconfig)?;
        let options = KubeConfigOptions {
            context: config.context.clone(),
            ..Default::default()
        };
        let client_config = kube::Config::from_custom_kubeconfig(kubeconfig, &options).await?;
        let client = Client::try_from(client_config)?;
        debug!(cluster = %config.name, kubeconfig = %config.kubeconfig.display(), "Connected to cluster");

        Ok(Self {
            name: config.name.clone(),
            client,
        })
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster").field("name", &self.name).finish()
    }
}

/// The hub and the two managed clusters.
#[derive(Clone, Debug)]
pub struct Env {
    pub hub: Cluster,
    pub c1: Cluster,
    pub c2: Cluster,
}

impl Env {
    pub async fn connect(config: &ClustersConfig) -> Result<Self> {
        Ok(Self {
            hub: Cluster::connect(&config.hub).await?,
            c1: Cluster::connect(&config.c1).await?,
            c2: Cluster::connect(&config.c2).await?,
        })
    }

    /// Look up a managed cluster by name.
    pub fn managed_cluster(&self, name: &str) -> Result<&Cluster> {
        [&self.c1, &self.c2]
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::Policy(format!("{:?} is not a managed cluster", name)))
    }
}

/// Check that a deployer and workload can run together.
pub fn validate_scenario(deployer: &dyn Deployer, workload: &dyn Workload) -> Result<()> {
    if !deployer.supports(workload) {
        return Err(Error::Validation(format!(
            "deployer {:?} does not support workload {:?}",
            deployer.kind(),
            workload.kind()
        )));
    }

    let pvc_spec = workload.pvc_spec();
    if pvc_spec.storage_class_name.is_empty() {
        return Err(Error::Validation(format!(
            "pvcSpec {:?} has no storageClassName",
            pvc_spec.name
        )));
    }
    if pvc_spec.access_modes.is_empty() {
        return Err(Error::Validation(format!(
            "pvcSpec {:?} has no accessModes",
            pvc_spec.name
        )));
    }

    Ok(())
}

/// Everything one scenario needs.
pub struct TestContext {
    name: String,
    workload: Box<dyn Workload>,
    deployer: Box<dyn Deployer>,
    env: Arc<Env>,
    config: Arc<Config>,
    exec: ExecContext,
}

impl TestContext {
    /// Build the context for a test entry.
    ///
    /// Unknown workload, deployer or PVC spec kinds are fatal for the run.
    pub fn new(test: &TestConfig, env: Arc<Env>, config: Arc<Config>) -> Result<Self> {
        let pvc_spec = config.pvc_spec(&test.pvc_spec)?.clone();
        let workload = workloads::new(&test.workload, pvc_spec)?;
        let deployer = deployers::new(&test.deployer)?;

        Ok(Self {
            name: test.scenario_name(),
            workload,
            deployer,
            env,
            config,
            exec: ExecContext::new(),
        })
    }

    /// Scenario name, also used for the DRPC and placement.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run under `exec` instead of the default unbounded context.
    pub fn with_exec(mut self, exec: ExecContext) -> Self {
        self.exec = exec;
        self
    }

    pub fn exec(&self) -> &ExecContext {
        &self.exec
    }

    pub fn workload(&self) -> &dyn Workload {
        self.workload.as_ref()
    }

    pub fn deployer(&self) -> &dyn Deployer {
        self.deployer.as_ref()
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Namespace of the application on the managed clusters.
    pub fn app_namespace(&self) -> String {
        format!("e2e-{}", self.name)
    }

    /// Hub namespace holding the DRPC and placement.
    pub fn management_namespace(&self) -> String {
        self.config.namespaces.ramen_ops.clone()
    }

    /// Poller for namespaced resources on `cluster`.
    pub fn poller<K>(&self, cluster: &Cluster) -> Poller<KubeFetcher<K>> {
        Poller::new(
            KubeFetcher::new(cluster.client.clone()),
            TokioSleeper,
            self.config.timeouts.retry_interval(),
            &cluster.name,
        )
    }

    /// Poller for cluster-scoped resources on `cluster`.
    pub fn cluster_poller<K>(&self, cluster: &Cluster) -> Poller<ClusterScopedFetcher<K>> {
        Poller::new(
            ClusterScopedFetcher::new(cluster.client.clone()),
            TokioSleeper,
            self.config.timeouts.retry_interval(),
            &cluster.name,
        )
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("name", &self.name)
            .field("workload", &self.workload.kind())
            .field("deployer", &self.deployer.kind())
            .finish()
    }
}

impl Lifecycle for TestContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn exec(&self) -> &ExecContext {
        &self.exec
    }

    fn validate(&self) -> Result<()> {
        validate_scenario(self.deployer(), self.workload())
    }

    async fn run_step(&self, step: LifecycleStep) -> Result<()> {
        match step {
            LifecycleStep::Deploy => self.deployer.deploy(self).await,
            LifecycleStep::Enable => actions::enable(self).await,
            LifecycleStep::Failover => actions::failover(self).await,
            LifecycleStep::Relocate => actions::relocate(self).await,
            LifecycleStep::Disable => actions::disable(self).await,
            LifecycleStep::Undeploy => self.deployer.undeploy(self).await,
        }
    }
}
