//! Lifecycle ordering, fail-fast and skip behavior.

use std::time::Duration;

use dr_e2e::flow::{LifecycleStep, ScenarioOutcome, Sequencer, SequencerState, StepStatus};
use dr_e2e::runner::run_scenarios;
use dr_e2e::wait::ExecContext;

use crate::mock_state::MockLifecycle;

#[tokio::test]
async fn test_all_steps_run_in_order() {
    let lifecycle = MockLifecycle::new("disapp-deploy-rbd");
    let mut sequencer = Sequencer::new();

    let report = sequencer.run(&lifecycle).await;

    assert_eq!(report.outcome, ScenarioOutcome::Passed);
    assert_eq!(lifecycle.executed(), LifecycleStep::ALL);
    assert_eq!(report.executed_steps(), LifecycleStep::ALL);
    assert!(report.steps.iter().all(|s| s.status == StepStatus::Passed));
    assert_eq!(sequencer.state(), SequencerState::Completed);
}

#[tokio::test]
async fn test_enable_failure_stops_the_scenario() {
    let lifecycle = MockLifecycle::new("disapp-deploy-rbd").failing_at(LifecycleStep::Enable);
    let mut sequencer = Sequencer::new();

    let report = sequencer.run(&lifecycle).await;

    assert_eq!(
        lifecycle.executed(),
        vec![LifecycleStep::Deploy, LifecycleStep::Enable]
    );
    assert_eq!(report.steps.len(), 2);
    assert_eq!(report.steps[0].status, StepStatus::Passed);
    assert_eq!(report.steps[1].status, StepStatus::Failed);
    assert!(matches!(
        &report.outcome,
        ScenarioOutcome::Failed { step: LifecycleStep::Enable, error } if error.contains("Enable failed")
    ));
    assert_eq!(sequencer.state(), SequencerState::Failed(LifecycleStep::Enable));
}

#[tokio::test]
async fn test_undeploy_failure_is_reported() {
    let lifecycle = MockLifecycle::new("s").failing_at(LifecycleStep::Undeploy);
    let report = Sequencer::new().run(&lifecycle).await;

    assert_eq!(lifecycle.executed(), LifecycleStep::ALL);
    assert!(report.outcome.is_failure());
}

#[tokio::test]
async fn test_validation_failure_skips_every_step() {
    let lifecycle = MockLifecycle::new("disapp-vm-rbd").invalid("deployer does not support workload");
    let mut sequencer = Sequencer::new();

    let report = sequencer.run(&lifecycle).await;

    assert!(lifecycle.executed().is_empty());
    assert!(report.steps.is_empty());
    assert_eq!(report.outcome.label(), "SKIP");
    assert!(!report.outcome.is_failure());
    assert_eq!(sequencer.state(), SequencerState::Skipped);
}

#[tokio::test]
async fn test_cancelled_context_stops_before_next_step() {
    let exec = ExecContext::new();
    exec.cancel();
    let lifecycle = MockLifecycle::new("s").with_exec(exec);

    let report = Sequencer::new().run(&lifecycle).await;

    assert!(lifecycle.executed().is_empty());
    assert!(matches!(
        &report.outcome,
        ScenarioOutcome::Failed { step: LifecycleStep::Deploy, error } if error.contains("context cancelled")
    ));
}

#[tokio::test(start_paused = true)]
async fn test_expired_context_fails_pending_step() {
    let exec = ExecContext::with_timeout(Duration::from_secs(15));
    let lifecycle = MockLifecycle::new("s")
        .with_delay(Duration::from_secs(10))
        .with_exec(exec);

    let report = Sequencer::new().run(&lifecycle).await;

    // Deploy and Enable start before the deadline; Failover does not.
    assert_eq!(
        lifecycle.executed(),
        vec![LifecycleStep::Deploy, LifecycleStep::Enable]
    );
    assert!(matches!(
        &report.outcome,
        ScenarioOutcome::Failed { step: LifecycleStep::Failover, error } if error.contains("deadline exceeded")
    ));
}

#[tokio::test(start_paused = true)]
async fn test_scenarios_run_concurrently() {
    let scenarios = vec![
        MockLifecycle::new("a").with_delay(Duration::from_secs(10)),
        MockLifecycle::new("b")
            .with_delay(Duration::from_secs(10))
            .failing_at(LifecycleStep::Failover),
        MockLifecycle::new("c").invalid("unsupported"),
    ];

    let started = tokio::time::Instant::now();
    let mut reports = run_scenarios(scenarios).await;
    reports.sort_by(|x, y| x.name.cmp(&y.name));

    // Six steps of 10s for "a"; run serially with "b" this would take 90s.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(60), "{:?}", elapsed);
    assert!(elapsed < Duration::from_secs(61), "{:?}", elapsed);

    let labels: Vec<&str> = reports.iter().map(|r| r.outcome.label()).collect();
    assert_eq!(labels, vec!["PASS", "FAIL", "SKIP"]);
    assert_eq!(reports[1].steps.len(), 3);
}

#[tokio::test]
async fn test_one_failure_does_not_stop_siblings() {
    let scenarios = vec![
        MockLifecycle::new("broken").failing_at(LifecycleStep::Deploy),
        MockLifecycle::new("healthy"),
    ];

    let reports = run_scenarios(scenarios).await;
    let healthy = reports.iter().find(|r| r.name == "healthy").unwrap();
    assert_eq!(healthy.outcome, ScenarioOutcome::Passed);
    assert_eq!(healthy.steps.len(), 6);
}

#[tokio::test]
async fn test_crash_is_reported_for_scenarios_sharing_a_name() {
    let scenarios = vec![
        MockLifecycle::new("disapp-deploy-rbd"),
        MockLifecycle::new("disapp-deploy-rbd").panicking_at(LifecycleStep::Enable),
    ];

    let reports = run_scenarios(scenarios).await;

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.name == "disapp-deploy-rbd"));
    let crashed: Vec<_> = reports
        .iter()
        .filter(|r| matches!(r.outcome, ScenarioOutcome::Crashed { .. }))
        .collect();
    assert_eq!(crashed.len(), 1);
    assert_eq!(crashed[0].outcome.label(), "FAIL");
    assert!(crashed[0].outcome.is_failure());
    assert!(
        reports
            .iter()
            .any(|r| r.outcome == ScenarioOutcome::Passed)
    );
}
