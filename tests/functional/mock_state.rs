//! In-memory doubles for the poller and the sequencer.
//!
//! - `ScriptedFetcher` replays a fixed list of fetch outcomes, repeating the
//!   last one once the script is exhausted. It records requested actions.
//! - `StaticPolicy` answers policy lookups with a fixed cluster pair.
//! - `CountingSleeper` returns immediately and fails once a sleep budget is
//!   spent, standing in for a context deadline.
//! - `MockLifecycle` records which steps ran and fails on request.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use dr_e2e::crd::{DRPlacementControl, DrAction};
use dr_e2e::dr::actions::DrpcClient;
use dr_e2e::dr::{ClusterPolicy, PolicyLookup};
use dr_e2e::error::{Error, Result};
use dr_e2e::flow::{Lifecycle, LifecycleStep};
use dr_e2e::wait::{ExecContext, FetchError, ResourceFetcher, SleepError, Sleeper};

/// One scripted fetch outcome.
#[derive(Clone, Debug)]
pub enum Fetch {
    Found(DRPlacementControl),
    NotFound,
    Error(String),
}

/// Fetcher replaying scripted outcomes.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Fetch>>,
    last: Mutex<Option<Fetch>>,
    calls: AtomicU32,
    requested: Mutex<Vec<(DrAction, String)>>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Fetch>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicU32::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Number of fetches so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Actions requested so far, with their target cluster.
    pub fn requested(&self) -> Vec<(DrAction, String)> {
        self.requested.lock().unwrap().clone()
    }

    fn next(&self) -> Fetch {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        match script.pop_front() {
            Some(fetch) => {
                *last = Some(fetch.clone());
                fetch
            }
            None => last
                .clone()
                .expect("scripted fetcher called with an empty script"),
        }
    }
}

impl ResourceFetcher<DRPlacementControl> for ScriptedFetcher {
    async fn get(
        &self,
        _ctx: &ExecContext,
        _namespace: &str,
        _name: &str,
    ) -> std::result::Result<DRPlacementControl, FetchError> {
        match self.next() {
            Fetch::Found(drpc) => Ok(drpc),
            Fetch::NotFound => Err(FetchError::NotFound),
            Fetch::Error(message) => Err(FetchError::Api(message)),
        }
    }
}

impl DrpcClient for ScriptedFetcher {
    async fn request_action(
        &self,
        _namespace: &str,
        _name: &str,
        action: DrAction,
        cluster: &str,
    ) -> Result<()> {
        self.requested
            .lock()
            .unwrap()
            .push((action, cluster.to_string()));
        Ok(())
    }
}

/// Policy lookup knowing a single policy.
pub struct StaticPolicy(pub ClusterPolicy);

impl PolicyLookup for StaticPolicy {
    async fn get_policy(&self, _ctx: &ExecContext, _cluster: &str, name: &str) -> Result<ClusterPolicy> {
        if name == self.0.name() {
            Ok(self.0.clone())
        } else {
            Err(Error::Policy(format!("drpolicy {:?} not found", name)))
        }
    }
}

/// Sleeper that never waits and fails after `budget` sleeps.
pub struct CountingSleeper {
    budget: u32,
    error: SleepError,
    sleeps: AtomicU32,
}

impl CountingSleeper {
    /// Fail with a deadline error after `budget` sleeps.
    pub fn deadline_after(budget: u32) -> Self {
        Self {
            budget,
            error: SleepError::DeadlineExceeded,
            sleeps: AtomicU32::new(0),
        }
    }

    /// Fail with a cancellation error after `budget` sleeps.
    pub fn cancelled_after(budget: u32) -> Self {
        Self {
            budget,
            error: SleepError::Cancelled,
            sleeps: AtomicU32::new(0),
        }
    }
}

impl Sleeper for CountingSleeper {
    async fn sleep(&self, _ctx: &ExecContext, _duration: Duration) -> std::result::Result<(), SleepError> {
        if self.sleeps.fetch_add(1, Ordering::SeqCst) >= self.budget {
            Err(self.error)
        } else {
            Ok(())
        }
    }
}

/// Lifecycle recording executed steps.
pub struct MockLifecycle {
    name: String,
    exec: ExecContext,
    invalid: Option<String>,
    fail_at: Option<LifecycleStep>,
    panic_at: Option<LifecycleStep>,
    delay: Duration,
    executed: Mutex<Vec<LifecycleStep>>,
}

impl MockLifecycle {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            exec: ExecContext::new(),
            invalid: None,
            fail_at: None,
            panic_at: None,
            delay: Duration::ZERO,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Fail validation with `reason`.
    pub fn invalid(mut self, reason: &str) -> Self {
        self.invalid = Some(reason.to_string());
        self
    }

    /// Fail when `step` runs.
    pub fn failing_at(mut self, step: LifecycleStep) -> Self {
        self.fail_at = Some(step);
        self
    }

    /// Panic when `step` runs.
    pub fn panicking_at(mut self, step: LifecycleStep) -> Self {
        self.panic_at = Some(step);
        self
    }

    /// Make every step take `delay` of (tokio) time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_exec(mut self, exec: ExecContext) -> Self {
        self.exec = exec;
        self
    }

    pub fn executed(&self) -> Vec<LifecycleStep> {
        self.executed.lock().unwrap().clone()
    }
}

impl Lifecycle for MockLifecycle {
    fn name(&self) -> &str {
        &self.name
    }

    fn exec(&self) -> &ExecContext {
        &self.exec
    }

    fn validate(&self) -> Result<()> {
        match &self.invalid {
            Some(reason) => Err(Error::Validation(reason.clone())),
            None => Ok(()),
        }
    }

    async fn run_step(&self, step: LifecycleStep) -> Result<()> {
        self.executed.lock().unwrap().push(step);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panic_at == Some(step) {
            panic!("{} panicked", step);
        }
        if self.fail_at == Some(step) {
            return Err(Error::Policy(format!("{} failed", step)));
        }
        Ok(())
    }
}
