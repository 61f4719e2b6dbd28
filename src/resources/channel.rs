//! Git channel shared by all scenarios on the hub.

use kube::Client;
use tracing::info;

use crate::config::{ChannelConfig, RepoConfig};
use crate::error::Result;

use super::common::{apply_dynamic, delete_dynamic, delete_namespace, ensure_namespace};
use super::ocm::{channel_gvk, generate_channel};

/// Create the channel and its namespace. Safe to call repeatedly.
pub async fn ensure(client: &Client, channel: &ChannelConfig, repo: &RepoConfig) -> Result<()> {
    ensure_namespace(client, &channel.namespace).await?;

    let object = generate_channel(&channel.name, &channel.namespace, &repo.url);
    apply_dynamic(
        client,
        &channel_gvk(),
        Some(&channel.namespace),
        &channel.name,
        &object,
    )
    .await?;

    info!(
        name = %channel.name,
        namespace = %channel.namespace,
        url = %repo.url,
        "Created channel"
    );
    Ok(())
}

/// Delete the channel and its namespace. Missing objects are not an error.
pub async fn ensure_deleted(client: &Client, channel: &ChannelConfig) -> Result<()> {
    let channel_deleted = delete_dynamic(
        client,
        &channel_gvk(),
        Some(&channel.namespace),
        &channel.name,
    )
    .await?;
    let namespace_deleted = delete_namespace(client, &channel.namespace).await?;

    info!(
        name = %channel.name,
        namespace = %channel.namespace,
        channel_deleted,
        namespace_deleted,
        "Deleted channel"
    );
    Ok(())
}
