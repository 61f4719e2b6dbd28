//! Ways of getting a workload onto the managed clusters.

pub mod discovered;

use std::fmt;

use futures::future::BoxFuture;

use crate::error::{Error, Result};
use crate::flow::{Cluster, TestContext};
use crate::workloads::Workload;

pub use discovered::DiscoveredApp;

/// Deploys and removes a scenario's workload.
pub trait Deployer: Send + Sync + fmt::Debug {
    /// Kind name used in the configuration.
    fn kind(&self) -> &str;

    /// Whether this deployer can handle `workload`.
    fn supports(&self, workload: &dyn Workload) -> bool;

    /// Deploy the workload on the primary cluster and wait until it is healthy.
    fn deploy<'a>(&'a self, ctx: &'a TestContext) -> BoxFuture<'a, Result<()>>;

    /// Remove the workload from all managed clusters and wait until it is gone.
    fn undeploy<'a>(&'a self, ctx: &'a TestContext) -> BoxFuture<'a, Result<()>>;

    /// Remove the workload from `cluster` after it moved away from it.
    fn cleanup<'a>(&'a self, ctx: &'a TestContext, cluster: &'a Cluster) -> BoxFuture<'a, Result<()>>;
}

/// Create a deployer by kind.
pub fn new(kind: &str) -> Result<Box<dyn Deployer>> {
    match kind {
        discovered::KIND => Ok(Box::new(DiscoveredApp)),
        other => Err(Error::unknown_deployer(other)),
    }
}
