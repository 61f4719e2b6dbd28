//! Suite runner.
//!
//! Builds every scenario up front, sets up the shared channel, runs all
//! scenarios concurrently and tears the channel down again, whatever the
//! scenarios' outcome.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span};

use crate::config::Config;
use crate::deployers;
use crate::error::Result;
use crate::flow::{Env, Lifecycle, ScenarioReport, Sequencer, SuiteReport, TestContext};
use crate::resources::channel;
use crate::wait::ExecContext;
use crate::workloads;

/// Check that the test matrix is well formed and names known kinds.
///
/// Runs before any cluster is touched; every error is fatal.
pub fn check_tests(config: &Config) -> Result<()> {
    config.validate()?;

    for test in &config.tests {
        let pvc_spec = config.pvc_spec(&test.pvc_spec)?;
        workloads::new(&test.workload, pvc_spec.clone())?;
        deployers::new(&test.deployer)?;
    }
    Ok(())
}

/// Run the whole suite against the configured clusters.
///
/// Returns an error only for problems that prevent the suite from starting.
/// Scenario failures are reported in the returned [`SuiteReport`].
pub async fn run(config: Arc<Config>, root: &ExecContext) -> Result<SuiteReport> {
    check_tests(&config)?;

    let env = Arc::new(Env::connect(&config.clusters).await?);
    let contexts = config
        .tests
        .iter()
        .map(|test| TestContext::new(test, env.clone(), config.clone()))
        .collect::<Result<Vec<_>>>()?;

    let mut report = SuiteReport::new();

    channel::ensure(&env.hub.client, &config.channel, &config.repo).await?;

    let timeout = config.timeouts.scenario_timeout();
    let scenarios = contexts
        .into_iter()
        .map(|ctx| ctx.with_exec(root.child(Some(timeout))))
        .collect();
    report.scenarios = run_scenarios(scenarios).await;

    if let Err(e) = channel::ensure_deleted(&env.hub.client, &config.channel).await {
        error!(error = %e, "Failed to delete channel");
        report
            .errors
            .push(format!("failed to delete channel: {}", e));
    }

    report.finish();
    info!(
        passed = report.count("PASS"),
        failed = report.count("FAIL"),
        skipped = report.count("SKIP"),
        "Suite finished"
    );
    Ok(report)
}

/// Run scenarios concurrently, each inside its own span.
///
/// A scenario whose task dies without a report is reported as crashed.
pub async fn run_scenarios<L>(scenarios: Vec<L>) -> Vec<ScenarioReport>
where
    L: Lifecycle + 'static,
{
    let mut pending = HashMap::new();
    let mut tasks = JoinSet::new();

    for scenario in scenarios {
        let name = scenario.name().to_string();
        let span = info_span!("scenario", name = %name);
        let handle = tasks.spawn(
            async move {
                let report = Sequencer::new().run(&scenario).await;
                info!(result = report.outcome.label(), "Scenario finished");
                report
            }
            .instrument(span),
        );
        pending.insert(handle.id(), name);
    }

    let mut reports = Vec::with_capacity(pending.len());

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, report)) => {
                pending.remove(&id);
                reports.push(report);
            }
            Err(e) => {
                let name = pending
                    .remove(&e.id())
                    .unwrap_or_else(|| "unknown".to_string());
                error!(scenario = %name, error = %e, "Scenario task failed");
                reports.push(ScenarioReport::crashed(name, e.to_string()));
            }
        }
    }

    for name in pending.into_values() {
        reports.push(ScenarioReport::crashed(
            name,
            "scenario task ended without a report".to_string(),
        ));
    }

    reports
}
