//! Condition polling.
//!
//! - `context`: cancellable, deadline-bearing execution context
//! - `sleeper`: cancellable delay between attempts
//! - `fetcher`: resource retrieval with not-found classification
//! - `conditions`: pure status predicates (ready, phase, progression, deleted)
//! - `poller`: the retry loop and its DRPC specializations

pub mod conditions;
pub mod context;
pub mod fetcher;
pub mod poller;
pub mod sleeper;

pub use conditions::{
    ConditionSet, ConditionStatus, ConditionType, DrpcCondition, DrpcSnapshot, Verdict,
};
pub use context::ExecContext;
pub use fetcher::{ClusterScopedFetcher, FetchError, KubeFetcher, ResourceFetcher};
pub use poller::{Observation, Poller, RetryOutcome, WaitError, WaitTarget, retry_until};
pub use sleeper::{SleepError, Sleeper, TokioSleeper};
