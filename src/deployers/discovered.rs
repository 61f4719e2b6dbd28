//! Discovered applications: workloads created directly on a managed cluster,
//! outside any OCM subscription, and protected by namespace.

use futures::FutureExt;
use futures::future::BoxFuture;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, PersistentVolumeClaim};
use tracing::info;

use crate::error::Result;
use crate::flow::{Cluster, TestContext};
use crate::resources::common::{apply, delete, delete_namespace, ensure_namespace};
use crate::wait::WaitTarget;
use crate::workloads::{Workload, deployment, describe_deployment, deployment_ready};

use super::Deployer;

/// Deployer kind selecting this implementation.
pub const KIND: &str = "disapp";

#[derive(Clone, Copy, Debug, Default)]
pub struct DiscoveredApp;

impl DiscoveredApp {
    async fn deploy_app(&self, ctx: &TestContext) -> Result<()> {
        let cluster = &ctx.env().c1;
        let namespace = ctx.app_namespace();
        let resources = ctx.workload().resources(&namespace);

        ensure_namespace(&cluster.client, &namespace).await?;
        for pvc in &resources.pvcs {
            apply(&cluster.client, &namespace, pvc).await?;
        }
        for d in &resources.deployments {
            apply(&cluster.client, &namespace, d).await?;
        }

        let poller = ctx.poller::<Deployment>(cluster);
        for d in &resources.deployments {
            let name = d.metadata.name.as_deref().unwrap_or_default();
            poller
                .wait_for::<Deployment, _, _>(
                    ctx.exec(),
                    WaitTarget::new("deployment", &namespace, name),
                    deployment_ready,
                    describe_deployment,
                )
                .await?;
        }

        info!(
            namespace = %namespace,
            cluster = %cluster.name,
            workload = %ctx.workload().kind(),
            "Deployed discovered application"
        );
        Ok(())
    }

    async fn undeploy_app(&self, ctx: &TestContext) -> Result<()> {
        let namespace = ctx.app_namespace();
        let env = ctx.env();

        for cluster in [&env.c1, &env.c2] {
            delete_namespace(&cluster.client, &namespace).await?;
        }
        for cluster in [&env.c1, &env.c2] {
            ctx.cluster_poller::<Namespace>(cluster)
                .wait_deleted::<Namespace>(ctx.exec(), WaitTarget::new("namespace", "", &namespace))
                .await?;
        }

        info!(namespace = %namespace, "Undeployed discovered application");
        Ok(())
    }

    /// Delete the workload's objects but keep the namespace, which stays
    /// protected by the DRPC.
    async fn cleanup_app(&self, ctx: &TestContext, cluster: &Cluster) -> Result<()> {
        let namespace = ctx.app_namespace();
        let resources = ctx.workload().resources(&namespace);

        let deployments: Vec<&str> = resources
            .deployments
            .iter()
            .filter_map(|d| d.metadata.name.as_deref())
            .collect();
        let pvcs: Vec<&str> = resources
            .pvcs
            .iter()
            .filter_map(|p| p.metadata.name.as_deref())
            .collect();

        for name in &deployments {
            delete::<Deployment>(&cluster.client, &namespace, name).await?;
        }
        for name in &pvcs {
            delete::<PersistentVolumeClaim>(&cluster.client, &namespace, name).await?;
        }

        let deployment_poller = ctx.poller::<Deployment>(cluster);
        for name in &deployments {
            deployment_poller
                .wait_deleted::<Deployment>(ctx.exec(), WaitTarget::new("deployment", &namespace, name))
                .await?;
        }
        let pvc_poller = ctx.poller::<PersistentVolumeClaim>(cluster);
        for name in &pvcs {
            pvc_poller
                .wait_deleted::<PersistentVolumeClaim>(ctx.exec(), WaitTarget::new("pvc", &namespace, name))
                .await?;
        }

        info!(namespace = %namespace, cluster = %cluster.name, "Cleaned up discovered application");
        Ok(())
    }
}

impl Deployer for DiscoveredApp {
    fn kind(&self) -> &str {
        KIND
    }

    fn supports(&self, workload: &dyn Workload) -> bool {
        workload.kind() == deployment::KIND
    }

    fn deploy<'a>(&'a self, ctx: &'a TestContext) -> BoxFuture<'a, Result<()>> {
        self.deploy_app(ctx).boxed()
    }

    fn undeploy<'a>(&'a self, ctx: &'a TestContext) -> BoxFuture<'a, Result<()>> {
        self.undeploy_app(ctx).boxed()
    }

    fn cleanup<'a>(&'a self, ctx: &'a TestContext, cluster: &'a Cluster) -> BoxFuture<'a, Result<()>> {
        self.cleanup_app(ctx, cluster).boxed()
    }
}
