//! Cancellable delay between poll attempts.

use std::future::Future;
use std::time::Duration;

use super::context::ExecContext;

/// Why a sleep ended early.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SleepError {
    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// A timed delay that honors an execution context.
///
/// Implementations return an error exactly when the context is cancelled or
/// its deadline passes before `duration` elapses.
pub trait Sleeper: Send + Sync {
    fn sleep(
        &self,
        ctx: &ExecContext,
        duration: Duration,
    ) -> impl Future<Output = Result<(), SleepError>> + Send;
}

/// Sleeper backed by the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, ctx: &ExecContext, duration: Duration) -> Result<(), SleepError> {
        if ctx.is_cancelled() {
            return Err(SleepError::Cancelled);
        }
        if ctx.is_expired() {
            return Err(SleepError::DeadlineExceeded);
        }

        tokio::select! {
            biased;
            reason = ctx.done() => Err(reason),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
