//! Ordered execution of a scenario's lifecycle steps.
//!
//! A scenario first passes a validation gate, then runs Deploy, Enable,
//! Failover, Relocate, Disable and Undeploy in that order. The first failing
//! step ends the scenario; nothing is rolled back.
//!
//! Progress is tracked by a small state machine so that every outcome is the
//! result of an explicit transition.

use std::fmt;
use std::future::Future;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::wait::{ExecContext, SleepError};

use super::report::{ScenarioOutcome, ScenarioReport, StepReport};

/// One step of the DR lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum LifecycleStep {
    Deploy,
    Enable,
    Failover,
    Relocate,
    Disable,
    Undeploy,
}

impl LifecycleStep {
    /// All steps in execution order.
    pub const ALL: [LifecycleStep; 6] = [
        LifecycleStep::Deploy,
        LifecycleStep::Enable,
        LifecycleStep::Failover,
        LifecycleStep::Relocate,
        LifecycleStep::Disable,
        LifecycleStep::Undeploy,
    ];

    /// The step after this one, `None` after Undeploy.
    pub fn next(self) -> Option<Self> {
        match self {
            LifecycleStep::Deploy => Some(LifecycleStep::Enable),
            LifecycleStep::Enable => Some(LifecycleStep::Failover),
            LifecycleStep::Failover => Some(LifecycleStep::Relocate),
            LifecycleStep::Relocate => Some(LifecycleStep::Disable),
            LifecycleStep::Disable => Some(LifecycleStep::Undeploy),
            LifecycleStep::Undeploy => None,
        }
    }
}

impl fmt::Display for LifecycleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleStep::Deploy => write!(f, "Deploy"),
            LifecycleStep::Enable => write!(f, "Enable"),
            LifecycleStep::Failover => write!(f, "Failover"),
            LifecycleStep::Relocate => write!(f, "Relocate"),
            LifecycleStep::Disable => write!(f, "Disable"),
            LifecycleStep::Undeploy => write!(f, "Undeploy"),
        }
    }
}

/// Something that can be driven through the lifecycle.
pub trait Lifecycle: Send + Sync {
    /// Scenario name.
    fn name(&self) -> &str;

    /// Cancellation and deadline of the scenario.
    fn exec(&self) -> &ExecContext;

    /// Check preconditions. An error skips the scenario.
    fn validate(&self) -> Result<()>;

    /// Run one step to completion.
    fn run_step(&self, step: LifecycleStep) -> impl Future<Output = Result<()>> + Send;
}

/// Scenario progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerState {
    /// Not validated yet
    Pending,
    /// Executing a step
    Running(LifecycleStep),
    /// All steps succeeded
    Completed,
    /// A step failed
    Failed(LifecycleStep),
    /// Validation failed
    Skipped,
}

impl SequencerState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SequencerState::Completed | SequencerState::Failed(_) | SequencerState::Skipped
        )
    }
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencerState::Pending => write!(f, "Pending"),
            SequencerState::Running(step) => write!(f, "Running({})", step),
            SequencerState::Completed => write!(f, "Completed"),
            SequencerState::Failed(step) => write!(f, "Failed({})", step),
            SequencerState::Skipped => write!(f, "Skipped"),
        }
    }
}

/// Events driving the sequencer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerEvent {
    ValidationPassed,
    ValidationFailed,
    StepSucceeded,
    StepFailed,
}

impl fmt::Display for SequencerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencerEvent::ValidationPassed => write!(f, "ValidationPassed"),
            SequencerEvent::ValidationFailed => write!(f, "ValidationFailed"),
            SequencerEvent::StepSucceeded => write!(f, "StepSucceeded"),
            SequencerEvent::StepFailed => write!(f, "StepFailed"),
        }
    }
}

/// Result of applying an event.
#[derive(Debug, PartialEq, Eq)]
pub enum TransitionResult {
    Success {
        from: SequencerState,
        to: SequencerState,
    },
    InvalidTransition {
        current: SequencerState,
        event: SequencerEvent,
    },
}

/// Compute the state following `current` on `event`.
pub fn transition(current: SequencerState, event: SequencerEvent) -> TransitionResult {
    let to = match (current, event) {
        (SequencerState::Pending, SequencerEvent::ValidationPassed) => {
            SequencerState::Running(LifecycleStep::Deploy)
        }
        (SequencerState::Pending, SequencerEvent::ValidationFailed) => SequencerState::Skipped,
        (SequencerState::Running(step), SequencerEvent::StepSucceeded) => match step.next() {
            Some(next) => SequencerState::Running(next),
            None => SequencerState::Completed,
        },
        (SequencerState::Running(step), SequencerEvent::StepFailed) => SequencerState::Failed(step),
        _ => return TransitionResult::InvalidTransition { current, event },
    };
    TransitionResult::Success { from: current, to }
}

/// Why a step was not started.
fn interrupted(ctx: &ExecContext) -> Option<SleepError> {
    if ctx.is_cancelled() {
        Some(SleepError::Cancelled)
    } else if ctx.is_expired() {
        Some(SleepError::DeadlineExceeded)
    } else {
        None
    }
}

/// Drives a [`Lifecycle`] through all steps.
#[derive(Debug)]
pub struct Sequencer {
    state: SequencerState,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            state: SequencerState::Pending,
        }
    }

    /// Current state.
    pub fn state(&self) -> SequencerState {
        self.state
    }

    fn apply(&mut self, event: SequencerEvent) {
        match transition(self.state, event) {
            TransitionResult::Success { to, .. } => self.state = to,
            TransitionResult::InvalidTransition { current, event } => {
                // Only reachable through a bug in run(); keep the state.
                error!(state = %current, event = %event, "Invalid sequencer transition");
            }
        }
    }

    /// Run the scenario and report every step that executed.
    ///
    /// A step is not started once the scenario's context is cancelled or
    /// expired; it fails with the interruption instead.
    pub async fn run<L: Lifecycle>(&mut self, lifecycle: &L) -> ScenarioReport {
        let mut report = ScenarioReport::new(lifecycle.name());
        let started = Instant::now();

        if let Err(e) = lifecycle.validate() {
            warn!(scenario = %lifecycle.name(), reason = %e, "Skipping scenario");
            self.apply(SequencerEvent::ValidationFailed);
            report.finish(
                ScenarioOutcome::Skipped {
                    reason: e.to_string(),
                },
                started.elapsed(),
            );
            return report;
        }
        self.apply(SequencerEvent::ValidationPassed);

        while let SequencerState::Running(step) = self.state() {
            let step_started = Instant::now();
            info!(scenario = %lifecycle.name(), step = %step, "Starting step");

            let result = match interrupted(lifecycle.exec()) {
                Some(reason) => Err(Error::Interrupted(reason)),
                None => lifecycle.run_step(step).await,
            };

            match result {
                Ok(()) => {
                    info!(
                        scenario = %lifecycle.name(),
                        step = %step,
                        elapsed_secs = step_started.elapsed().as_secs_f64(),
                        "Step passed"
                    );
                    report.steps.push(StepReport::passed(step, step_started.elapsed()));
                    self.apply(SequencerEvent::StepSucceeded);
                }
                Err(e) => {
                    error!(scenario = %lifecycle.name(), step = %step, error = %e, "Step failed");
                    report
                        .steps
                        .push(StepReport::failed(step, step_started.elapsed(), e.to_string()));
                    self.apply(SequencerEvent::StepFailed);
                }
            }
        }

        let outcome = match self.state() {
            SequencerState::Failed(step) => ScenarioOutcome::Failed {
                step,
                error: report
                    .steps
                    .last()
                    .and_then(|s| s.error.clone())
                    .unwrap_or_default(),
            },
            _ => ScenarioOutcome::Passed,
        };
        report.finish(outcome, started.elapsed());
        report
    }
}
