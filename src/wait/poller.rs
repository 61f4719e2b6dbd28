//! Generic poll loop and its DRPC specializations.
//!
//! Every wait follows the same shape: fetch, evaluate, then succeed, retry
//! after `interval`, or abort. The only way out of a pending wait is the
//! execution context: when the sleep between attempts reports cancellation
//! or deadline expiry, the wait fails with the last observation attached.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::crd::{DRPlacementControl, DrState, ProgressionStatus};

use super::conditions::{DrpcCondition, DrpcSnapshot, Verdict};
use super::context::ExecContext;
use super::fetcher::{FetchError, ResourceFetcher};
use super::sleeper::{SleepError, Sleeper, TokioSleeper};

/// Error type for wait operations.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// The context ended before the condition was met.
    #[error("{target} not reached in cluster {cluster:?} ({observed}): {source}")]
    NotConverged {
        target: String,
        cluster: String,
        observed: String,
        #[source]
        source: SleepError,
    },

    /// The resource disappeared while waiting for a state it can no longer reach.
    #[error("{target} cannot be reached in cluster {cluster:?}: resource not found")]
    Vanished { target: String, cluster: String },
}

impl WaitError {
    /// Check if the wait ended because the context was cancelled or expired
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::NotConverged { .. })
    }
}

/// What one attempt saw when the condition did not hold yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Observation {
    /// A snapshot of the resource, rendered for diagnostics.
    Snapshot(String),
    /// The fetch failed with a transient error.
    FetchFailed(String),
}

/// Result of one poll attempt.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Done(T),
    Retry(Observation),
    Abort(WaitError),
}

/// Run `attempt` until it is done or aborts, sleeping `interval` between
/// attempts under `ctx`.
///
/// On cancellation or deadline the error carries the last snapshot seen, or
/// the last fetch error if no snapshot was ever obtained.
pub async fn retry_until<S, A, Fut, T>(
    ctx: &ExecContext,
    sleeper: &S,
    interval: Duration,
    target: &str,
    cluster: &str,
    mut attempt: A,
) -> Result<T, WaitError>
where
    S: Sleeper,
    A: FnMut() -> Fut,
    Fut: Future<Output = RetryOutcome<T>>,
{
    let mut last_snapshot: Option<String> = None;
    let mut last_error: Option<String> = None;

    loop {
        match attempt().await {
            RetryOutcome::Done(value) => return Ok(value),
            RetryOutcome::Abort(err) => return Err(err),
            RetryOutcome::Retry(Observation::Snapshot(s)) => last_snapshot = Some(s),
            RetryOutcome::Retry(Observation::FetchFailed(e)) => last_error = Some(e),
        }

        if let Err(source) = sleeper.sleep(ctx, interval).await {
            let observed = match (last_snapshot, last_error) {
                (Some(snapshot), _) => format!("last observed {}", snapshot),
                (None, Some(err)) => format!("last fetch error: {}", err),
                (None, None) => "nothing observed".to_string(),
            };
            return Err(WaitError::NotConverged {
                target: target.to_string(),
                cluster: cluster.to_string(),
                observed,
                source,
            });
        }
    }
}

/// Identifies the resource a wait is about.
#[derive(Clone, Copy, Debug)]
pub struct WaitTarget<'a> {
    pub kind: &'a str,
    pub namespace: &'a str,
    pub name: &'a str,
}

impl<'a> WaitTarget<'a> {
    pub fn new(kind: &'a str, namespace: &'a str, name: &'a str) -> Self {
        Self {
            kind,
            namespace,
            name,
        }
    }
}

impl fmt::Display for WaitTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{} {:?}", self.kind, self.name)
        } else {
            write!(f, "{} \"{}/{}\"", self.kind, self.namespace, self.name)
        }
    }
}

/// Polls one cluster through a fetcher.
pub struct Poller<F, S = TokioSleeper> {
    fetcher: F,
    sleeper: S,
    interval: Duration,
    cluster: String,
}

impl<F, S: Sleeper> Poller<F, S> {
    pub fn new(fetcher: F, sleeper: S, interval: Duration, cluster: impl Into<String>) -> Self {
        Self {
            fetcher,
            sleeper,
            interval,
            cluster: cluster.into(),
        }
    }

    /// Name of the polled cluster.
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// The fetcher used for every attempt.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Wait until `predicate` holds for the resource.
    ///
    /// Transient fetch errors are retried. A missing resource aborts the wait.
    /// `describe` renders a snapshot for the timeout error.
    pub async fn wait_for<K, P, D>(
        &self,
        ctx: &ExecContext,
        target: WaitTarget<'_>,
        predicate: P,
        describe: D,
    ) -> Result<K, WaitError>
    where
        F: ResourceFetcher<K>,
        P: Fn(&K) -> bool,
        D: Fn(&K) -> String,
    {
        let label = format!("{} condition", target);
        let label = label.as_str();
        let cluster = self.cluster.as_str();
        let predicate = &predicate;
        let describe = &describe;

        debug!(cluster = %cluster, "Waiting until {}", label);

        retry_until(ctx, &self.sleeper, self.interval, label, cluster, || async move {
            match self.fetcher.get(ctx, target.namespace, target.name).await {
                Ok(resource) if predicate(&resource) => {
                    debug!(cluster = %cluster, "{} met", label);
                    RetryOutcome::Done(resource)
                }
                Ok(resource) => RetryOutcome::Retry(Observation::Snapshot(describe(&resource))),
                Err(FetchError::NotFound) => RetryOutcome::Abort(WaitError::Vanished {
                    target: label.to_string(),
                    cluster: cluster.to_string(),
                }),
                Err(err) => {
                    debug!(cluster = %cluster, error = %err, "Failed to get {}", target);
                    RetryOutcome::Retry(Observation::FetchFailed(err.to_string()))
                }
            }
        })
        .await
    }

    /// Wait until fetching the resource reports not-found.
    pub async fn wait_deleted<K>(
        &self,
        ctx: &ExecContext,
        target: WaitTarget<'_>,
    ) -> Result<(), WaitError>
    where
        F: ResourceFetcher<K>,
    {
        let label = format!("{} deleted", target);
        let label = label.as_str();
        let cluster = self.cluster.as_str();

        debug!(cluster = %cluster, "Waiting until {}", label);

        retry_until(ctx, &self.sleeper, self.interval, label, cluster, || async move {
            match self.fetcher.get(ctx, target.namespace, target.name).await {
                Err(FetchError::NotFound) => {
                    debug!(cluster = %cluster, "{}", label);
                    RetryOutcome::Done(())
                }
                Ok(_) => RetryOutcome::Retry(Observation::Snapshot("still exists".to_string())),
                Err(err) => {
                    debug!(cluster = %cluster, error = %err, "Failed to get {}", target);
                    RetryOutcome::Retry(Observation::FetchFailed(err.to_string()))
                }
            }
        })
        .await
    }
}

impl<F, S> Poller<F, S>
where
    F: ResourceFetcher<DRPlacementControl>,
    S: Sleeper,
{
    /// Wait until a DRPC satisfies `condition`.
    pub async fn wait_drpc(
        &self,
        ctx: &ExecContext,
        namespace: &str,
        name: &str,
        condition: DrpcCondition,
    ) -> Result<(), WaitError> {
        let target = WaitTarget::new("drpc", namespace, name);
        let label = format!("{} {}", target, condition);
        let label = label.as_str();
        let cluster = self.cluster.as_str();

        debug!(cluster = %cluster, "Waiting until {}", label);

        retry_until(ctx, &self.sleeper, self.interval, label, cluster, || async move {
            let fetched = self.fetcher.get(ctx, namespace, name).await;
            let (verdict, snapshot) = match &fetched {
                Ok(drpc) => {
                    let snapshot = DrpcSnapshot::from(drpc);
                    (condition.evaluate(Ok(&snapshot)), Some(snapshot))
                }
                Err(err) => (condition.evaluate(Err(err)), None),
            };

            match (verdict, snapshot, fetched) {
                (Verdict::Met, _, _) => {
                    debug!(cluster = %cluster, "{} reached", label);
                    RetryOutcome::Done(())
                }
                (Verdict::Vanished, _, _) => RetryOutcome::Abort(WaitError::Vanished {
                    target: label.to_string(),
                    cluster: cluster.to_string(),
                }),
                (Verdict::Pending, Some(snapshot), _) => {
                    RetryOutcome::Retry(Observation::Snapshot(snapshot.to_string()))
                }
                (Verdict::Pending, None, Err(err)) => {
                    debug!(cluster = %cluster, error = %err, "Failed to get {}", target);
                    RetryOutcome::Retry(Observation::FetchFailed(err.to_string()))
                }
                (Verdict::Pending, None, Ok(_)) => {
                    RetryOutcome::Retry(Observation::Snapshot("no status".to_string()))
                }
            }
        })
        .await
    }

    /// Wait until the DRPC is ready (see [`super::conditions::is_ready`]).
    pub async fn wait_drpc_ready(
        &self,
        ctx: &ExecContext,
        namespace: &str,
        name: &str,
    ) -> Result<(), WaitError> {
        self.wait_drpc(ctx, namespace, name, DrpcCondition::Ready)
            .await
    }

    /// Wait until the DRPC reaches `phase`.
    pub async fn wait_drpc_phase(
        &self,
        ctx: &ExecContext,
        namespace: &str,
        name: &str,
        phase: DrState,
    ) -> Result<(), WaitError> {
        self.wait_drpc(ctx, namespace, name, DrpcCondition::Phase(phase))
            .await
    }

    /// Wait until the DRPC reaches `progression`.
    pub async fn wait_drpc_progression(
        &self,
        ctx: &ExecContext,
        namespace: &str,
        name: &str,
        progression: ProgressionStatus,
    ) -> Result<(), WaitError> {
        self.wait_drpc(ctx, namespace, name, DrpcCondition::Progression(progression))
            .await
    }

    /// Wait until the DRPC no longer exists.
    pub async fn wait_drpc_deleted(
        &self,
        ctx: &ExecContext,
        namespace: &str,
        name: &str,
    ) -> Result<(), WaitError> {
        self.wait_drpc(ctx, namespace, name, DrpcCondition::Deleted)
            .await
    }
}
