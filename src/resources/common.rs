//! Server-side apply and idempotent delete helpers.

use std::collections::BTreeMap;
use std::fmt::Debug;

use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{ApiResource, DeleteParams, DynamicObject, GroupVersionKind, Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "dr-e2e";

/// Label marking every object created by the suite
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Standard labels applied to suite-created resources
pub fn standard_labels() -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(MANAGED_BY_LABEL.to_string(), FIELD_MANAGER.to_string());
    labels
}

/// Apply a typed namespaced resource.
pub async fn apply<K>(client: &Client, namespace: &str, resource: &K) -> Result<K>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
    <K as Resource>::DynamicType: Default,
{
    let name = resource
        .meta()
        .name
        .clone()
        .ok_or_else(|| Error::MissingField("metadata.name".to_string()))?;
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let applied = api
        .patch(
            &name,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(resource),
        )
        .await?;
    debug!(namespace = %namespace, name = %name, kind = %K::kind(&Default::default()), "Applied resource");
    Ok(applied)
}

/// Apply an object of a kind with no typed bindings.
///
/// `namespace` is `None` for cluster-scoped kinds.
pub async fn apply_dynamic<T: Serialize>(
    client: &Client,
    gvk: &GroupVersionKind,
    namespace: Option<&str>,
    name: &str,
    object: &T,
) -> Result<()> {
    let api = dynamic_api(client, gvk, namespace);
    let value = serde_json::to_value(object)?;
    api.patch(
        name,
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(&value),
    )
    .await?;
    debug!(namespace = ?namespace, name = %name, kind = %gvk.kind, "Applied resource");
    Ok(())
}

/// Delete a typed namespaced resource. Returns `false` if it did not exist.
pub async fn delete<K>(client: &Client, namespace: &str, name: &str) -> Result<bool>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
    <K as Resource>::DynamicType: Default,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    ignore_missing(api.delete(name, &DeleteParams::default()).await.map(|_| ()))
}

/// Delete an object of a kind with no typed bindings. Returns `false` if it
/// did not exist.
pub async fn delete_dynamic(
    client: &Client,
    gvk: &GroupVersionKind,
    namespace: Option<&str>,
    name: &str,
) -> Result<bool> {
    let api = dynamic_api(client, gvk, namespace);
    ignore_missing(api.delete(name, &DeleteParams::default()).await.map(|_| ()))
}

/// Create a namespace if it does not exist yet.
pub async fn ensure_namespace(client: &Client, name: &str) -> Result<()> {
    let namespace = Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(standard_labels()),
            ..Default::default()
        },
        ..Default::default()
    };
    let api: Api<Namespace> = Api::all(client.clone());
    api.patch(
        name,
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(&namespace),
    )
    .await?;
    debug!(namespace = %name, "Ensured namespace");
    Ok(())
}

/// Start deleting a namespace. Returns `false` if it did not exist.
pub async fn delete_namespace(client: &Client, name: &str) -> Result<bool> {
    let api: Api<Namespace> = Api::all(client.clone());
    ignore_missing(api.delete(name, &DeleteParams::default()).await.map(|_| ()))
}

fn dynamic_api(
    client: &Client,
    gvk: &GroupVersionKind,
    namespace: Option<&str>,
) -> Api<DynamicObject> {
    let ar = ApiResource::from_gvk(gvk);
    match namespace {
        Some(ns) => Api::namespaced_with(client.clone(), ns, &ar),
        None => Api::all_with(client.clone(), &ar),
    }
}

/// Map a 404 from a delete call to `Ok(false)`.
fn ignore_missing(result: std::result::Result<(), kube::Error>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(false),
        Err(e) => Err(e.into()),
    }
}
