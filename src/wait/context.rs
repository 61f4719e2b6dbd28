//! Cancellable execution context threaded through every wait.
//!
//! An `ExecContext` couples a cancellation token with an optional deadline.
//! Child contexts are cancelled with their parent and never outlive its
//! deadline.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::sleeper::SleepError;

/// Cancellation and deadline shared by all waits of one scenario.
#[derive(Clone, Debug, Default)]
pub struct ExecContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ExecContext {
    /// Create a root context without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Derive a context cancelled together with this one.
    ///
    /// The child's deadline is the earlier of the parent's deadline and
    /// `now + timeout`.
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let own = timeout.map(|t| Instant::now() + t);
        let deadline = match (self.deadline, own) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context was cancelled explicitly.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Completes when the context is cancelled or its deadline passes.
    pub async fn done(&self) -> SleepError {
        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => SleepError::Cancelled,
            _ = expiry => SleepError::DeadlineExceeded,
        }
    }
}
