//! Scenario execution.
//!
//! A scenario pairs a workload with a deployer and a PVC spec, then walks the
//! DR lifecycle: Deploy, Enable, Failover, Relocate, Disable, Undeploy.

pub mod context;
pub mod report;
pub mod sequencer;

pub use context::{Cluster, Env, TestContext, validate_scenario};
pub use report::{ScenarioOutcome, ScenarioReport, StepReport, StepStatus, SuiteReport};
pub use sequencer::{
    Lifecycle, LifecycleStep, Sequencer, SequencerEvent, SequencerState, TransitionResult,
    transition,
};
