//! Retrieval of remote resources with not-found classification.

use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;

use kube::core::{ClusterResourceScope, NamespaceResourceScope};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;

use super::context::ExecContext;
use super::sleeper::SleepError;

/// Failure to fetch a resource.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The resource does not exist.
    #[error("not found")]
    NotFound,

    /// Any other failure; treated as transient by the poller.
    #[error("{0}")]
    Api(String),

    /// The context ended while the request was in flight.
    #[error("request interrupted: {0}")]
    Interrupted(SleepError),
}

impl From<kube::Error> for FetchError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(e) if e.code == 404 => FetchError::NotFound,
            other => FetchError::Api(other.to_string()),
        }
    }
}

/// Retrieves the current state of a named resource.
pub trait ResourceFetcher<K>: Send + Sync {
    /// Fetch `namespace/name`. Cluster-scoped fetchers ignore `namespace`.
    fn get(
        &self,
        ctx: &ExecContext,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<K, FetchError>> + Send;
}

/// Run an API request, giving up as soon as `ctx` ends.
async fn interruptible<T, Fut>(ctx: &ExecContext, request: Fut) -> Result<T, FetchError>
where
    Fut: Future<Output = Result<T, kube::Error>>,
{
    tokio::select! {
        biased;
        reason = ctx.done() => Err(FetchError::Interrupted(reason)),
        result = request => Ok(result?),
    }
}

/// Fetcher for namespaced resources of kind `K`.
pub struct KubeFetcher<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeFetcher<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl<K> Clone for KubeFetcher<K> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl<K> ResourceFetcher<K> for KubeFetcher<K>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug + Send,
    <K as Resource>::DynamicType: Default,
{
    async fn get(&self, ctx: &ExecContext, namespace: &str, name: &str) -> Result<K, FetchError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        interruptible(ctx, api.get(name)).await
    }
}

/// Fetcher for cluster-scoped resources of kind `K`.
pub struct ClusterScopedFetcher<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> ClusterScopedFetcher<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }
}

impl<K> Clone for ClusterScopedFetcher<K> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl<K> ResourceFetcher<K> for ClusterScopedFetcher<K>
where
    K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + Debug + Send,
    <K as Resource>::DynamicType: Default,
{
    async fn get(&self, ctx: &ExecContext, _namespace: &str, name: &str) -> Result<K, FetchError> {
        let api: Api<K> = Api::all(self.client.clone());
        interruptible(ctx, api.get(name)).await
    }
}
