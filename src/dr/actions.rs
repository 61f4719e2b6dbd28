//! DR actions driven from the hub: enable protection, fail over, relocate
//! and disable protection.

use std::collections::BTreeMap;
use std::future::Future;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Patch, PatchParams};
use kube::Api;
use serde_json::json;
use tracing::{info, warn};

use crate::crd::{
    DRPlacementControl, DRPlacementControlSpec, DrAction, DrState, KubeObjectProtectionSpec,
    LabelSelector, ObjectReference, ProgressionStatus,
};
use crate::error::{Error, Result};
use crate::flow::TestContext;
use crate::resources::common::{
    FIELD_MANAGER, apply, apply_dynamic, delete, delete_dynamic, standard_labels,
};
use crate::resources::ocm::{
    cluster_set_binding_gvk, generate_cluster_set_binding, generate_placement, placement_gvk,
};
use crate::wait::{ExecContext, KubeFetcher, Poller, ResourceFetcher, Sleeper, WaitTarget};

use super::policy::{ClusterPolicy, KubePolicyLookup, PolicyLookup, target_cluster};

/// Interval between kube object captures of discovered applications.
const CAPTURE_INTERVAL: &str = "1m";

/// Inputs of a new DRPC.
#[derive(Clone, Debug)]
pub struct DrpcTemplate<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub placement: &'a str,
    pub dr_policy: &'a str,
    pub preferred_cluster: &'a str,
    /// Application namespace protected on the managed clusters.
    pub protected_namespace: &'a str,
    pub pvc_labels: BTreeMap<String, String>,
}

/// Generate a DRPC protecting the application on `preferred_cluster`.
pub fn generate_drpc(template: &DrpcTemplate<'_>) -> DRPlacementControl {
    let selector = LabelSelector {
        match_labels: template.pvc_labels.clone(),
    };

    let mut drpc = DRPlacementControl::new(
        template.name,
        DRPlacementControlSpec {
            placement_ref: ObjectReference {
                kind: Some("Placement".to_string()),
                name: template.placement.to_string(),
                ..Default::default()
            },
            dr_policy_ref: ObjectReference {
                name: template.dr_policy.to_string(),
                ..Default::default()
            },
            preferred_cluster: Some(template.preferred_cluster.to_string()),
            pvc_selector: selector.clone(),
            protected_namespaces: Some(vec![template.protected_namespace.to_string()]),
            kube_object_protection: Some(KubeObjectProtectionSpec {
                capture_interval: Some(CAPTURE_INTERVAL.to_string()),
                kube_object_selector: Some(selector),
            }),
            ..Default::default()
        },
    );
    drpc.metadata = ObjectMeta {
        name: Some(template.name.to_string()),
        namespace: Some(template.namespace.to_string()),
        labels: Some(standard_labels()),
        ..Default::default()
    };
    drpc
}

/// Body of the merge patch requesting `action` towards `cluster`.
pub fn action_patch(action: DrAction, cluster: &str) -> serde_json::Value {
    match action {
        DrAction::Failover => json!({
            "spec": {
                "action": action,
                "failoverCluster": cluster,
            }
        }),
        DrAction::Relocate => json!({
            "spec": {
                "action": action,
                "preferredCluster": cluster,
            }
        }),
    }
}

/// Protect the deployed application with a DRPC and wait until it is ready.
pub async fn enable(ctx: &TestContext) -> Result<()> {
    let hub = &ctx.env().hub;
    let cluster = &ctx.env().c1;
    let name = ctx.name();
    let namespace = ctx.management_namespace();
    let app_namespace = ctx.app_namespace();
    let cluster_set = &ctx.config().cluster_set;

    let binding = generate_cluster_set_binding(&namespace, cluster_set);
    apply_dynamic(
        &hub.client,
        &cluster_set_binding_gvk(),
        Some(&namespace),
        cluster_set,
        &binding,
    )
    .await?;

    let placement = generate_placement(name, &namespace, cluster_set, &cluster.name);
    apply_dynamic(&hub.client, &placement_gvk(), Some(&namespace), name, &placement).await?;

    let drpc = generate_drpc(&DrpcTemplate {
        name,
        namespace: &namespace,
        placement: name,
        dr_policy: &ctx.config().dr_policy,
        preferred_cluster: &cluster.name,
        protected_namespace: &app_namespace,
        pvc_labels: ctx.workload().selector_labels(),
    });
    apply(&hub.client, &namespace, &drpc).await?;
    info!(namespace = %namespace, name = %name, cluster = %cluster.name, "Created drpc");

    ctx.poller::<DRPlacementControl>(hub)
        .wait_drpc_ready(ctx.exec(), &namespace, name)
        .await?;

    info!(namespace = %namespace, name = %name, "Workload protected");
    Ok(())
}

/// Fail the application over to the other cluster of the policy.
pub async fn failover(ctx: &TestContext) -> Result<()> {
    move_app(ctx, DrAction::Failover).await
}

/// Relocate the application to the other cluster of the policy.
pub async fn relocate(ctx: &TestContext) -> Result<()> {
    move_app(ctx, DrAction::Relocate).await
}

/// Phase a DRPC reports once `action` completed.
pub fn completed_phase(action: DrAction) -> DrState {
    match action {
        DrAction::Failover => DrState::FailedOver,
        DrAction::Relocate => DrState::Relocated,
    }
}

/// DRPC reads and action requests on the hub.
pub trait DrpcClient: ResourceFetcher<DRPlacementControl> {
    /// Ask the DR controller to run `action` towards `cluster`.
    fn request_action(
        &self,
        namespace: &str,
        name: &str,
        action: DrAction,
        cluster: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl DrpcClient for KubeFetcher<DRPlacementControl> {
    async fn request_action(
        &self,
        namespace: &str,
        name: &str,
        action: DrAction,
        cluster: &str,
    ) -> Result<()> {
        let api: Api<DRPlacementControl> = Api::namespaced(self.client().clone(), namespace);
        api.patch(
            name,
            &PatchParams::apply(FIELD_MANAGER),
            &Patch::Merge(&action_patch(action, cluster)),
        )
        .await?;
        Ok(())
    }
}

/// A failover or relocate of one DRPC.
#[derive(Clone, Copy, Debug)]
pub struct ActionRequest<'a> {
    pub action: DrAction,
    pub namespace: &'a str,
    pub name: &'a str,
    pub dr_policy: &'a str,
}

/// Move the application to the other cluster of its DR policy.
///
/// Once the DR controller waits for cleanup, `cleanup` is called with the
/// cluster the application left. The move completes when the DRPC reports
/// the action's final phase and is ready again. Returns the new cluster.
pub async fn move_workload<D, S, P, C, Fut>(
    ctx: &ExecContext,
    hub: &Poller<D, S>,
    policies: &P,
    request: ActionRequest<'_>,
    cleanup: C,
) -> Result<String>
where
    D: DrpcClient,
    S: Sleeper,
    P: PolicyLookup,
    C: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let ActionRequest {
        action,
        namespace,
        name,
        dr_policy,
    } = request;

    let drpc = hub
        .fetcher()
        .get(ctx, namespace, name)
        .await
        .map_err(|source| Error::Fetch {
            target: WaitTarget::new("drpc", namespace, name).to_string(),
            source,
        })?;
    let current = drpc
        .current_cluster()
        .ok_or_else(|| Error::MissingField("drpc status.preferredDecision.clusterName".to_string()))?
        .to_string();

    let policy = policies.get_policy(ctx, hub.cluster(), dr_policy).await?;
    let target = select_target(&policy, &current).to_string();

    info!(
        namespace = %namespace,
        name = %name,
        action = %action,
        from = %current,
        to = %target,
        "Starting action"
    );
    hub.fetcher()
        .request_action(namespace, name, action, &target)
        .await?;

    hub.wait_drpc_progression(ctx, namespace, name, ProgressionStatus::WaitOnUserToCleanUp)
        .await?;
    cleanup(current).await?;

    hub.wait_drpc_phase(ctx, namespace, name, completed_phase(action))
        .await?;
    hub.wait_drpc_ready(ctx, namespace, name).await?;

    info!(namespace = %namespace, name = %name, action = %action, cluster = %target, "Action completed");
    Ok(target)
}

async fn move_app(ctx: &TestContext, action: DrAction) -> Result<()> {
    let hub = &ctx.env().hub;
    let namespace = ctx.management_namespace();
    let request = ActionRequest {
        action,
        namespace: &namespace,
        name: ctx.name(),
        dr_policy: &ctx.config().dr_policy,
    };

    move_workload(
        ctx.exec(),
        &ctx.poller::<DRPlacementControl>(hub),
        &KubePolicyLookup::new(hub.client.clone()),
        request,
        |left: String| async move {
            let cluster = ctx.env().managed_cluster(&left)?;
            ctx.deployer().cleanup(ctx, cluster).await
        },
    )
    .await?;
    Ok(())
}

/// Target for the next action. A current cluster outside the policy is
/// logged; selection still falls back to the policy's first cluster.
fn select_target<'a>(policy: &'a ClusterPolicy, current: &str) -> &'a str {
    if !policy.contains(current) {
        warn!(
            policy = %policy.name(),
            cluster = %current,
            "Current cluster is not in the drpolicy"
        );
    }
    target_cluster(policy, current)
}

/// Remove protection and wait until the DRPC is gone.
pub async fn disable(ctx: &TestContext) -> Result<()> {
    let hub = &ctx.env().hub;
    let name = ctx.name();
    let namespace = ctx.management_namespace();

    delete::<DRPlacementControl>(&hub.client, &namespace, name).await?;
    info!(namespace = %namespace, name = %name, "Deleted drpc");

    delete_dynamic(&hub.client, &placement_gvk(), Some(&namespace), name).await?;
    info!(namespace = %namespace, name = %name, "Deleted placement");

    ctx.poller::<DRPlacementControl>(hub)
        .wait_drpc_deleted(ctx.exec(), &namespace, name)
        .await?;

    info!(namespace = %namespace, name = %name, "Workload unprotected");
    Ok(())
}
