//! Applications protected by the scenarios.

pub mod deployment;

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::PersistentVolumeClaim;

use crate::config::PvcSpec;
use crate::error::{Error, Result};

pub use deployment::DeploymentWorkload;

/// Objects making up a workload in one namespace.
#[derive(Clone, Debug, Default)]
pub struct WorkloadResources {
    pub pvcs: Vec<PersistentVolumeClaim>,
    pub deployments: Vec<Deployment>,
}

/// An application with persistent data.
pub trait Workload: Send + Sync + fmt::Debug {
    /// Kind name used in the configuration.
    fn kind(&self) -> &str;

    /// Storage variant of the workload's PVCs.
    fn pvc_spec(&self) -> &PvcSpec;

    /// Labels selecting the workload's PVCs and pods.
    fn selector_labels(&self) -> BTreeMap<String, String>;

    /// Objects to create in `namespace`.
    fn resources(&self, namespace: &str) -> WorkloadResources;
}

/// Create a workload by kind.
pub fn new(kind: &str, pvc_spec: PvcSpec) -> Result<Box<dyn Workload>> {
    match kind {
        deployment::KIND => Ok(Box::new(DeploymentWorkload::new(pvc_spec))),
        other => Err(Error::unknown_workload(other)),
    }
}

/// Check whether all desired replicas of a deployment are ready.
pub fn deployment_ready(deployment: &Deployment) -> bool {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    let ready = deployment
        .status
        .as_ref()
        .and_then(|s| s.ready_replicas)
        .unwrap_or(0);
    ready >= desired
}

/// Render a deployment's replica counts for diagnostics.
pub fn describe_deployment(deployment: &Deployment) -> String {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .unwrap_or(1);
    let status = deployment.status.as_ref();
    format!(
        "replicas: {}, ready: {}, available: {}",
        desired,
        status.and_then(|s| s.ready_replicas).unwrap_or(0),
        status.and_then(|s| s.available_replicas).unwrap_or(0)
    )
}
