//! Scenario and suite results.

use std::fmt;
use std::time::Duration;

use jiff::Timestamp;
use serde::Serialize;

use super::sequencer::LifecycleStep;

/// Result of one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Passed,
    Failed,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub step: LifecycleStep,
    pub status: StepStatus,
    pub elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    pub fn passed(step: LifecycleStep, elapsed: Duration) -> Self {
        Self {
            step,
            status: StepStatus::Passed,
            elapsed_secs: elapsed.as_secs_f64(),
            error: None,
        }
    }

    pub fn failed(step: LifecycleStep, elapsed: Duration, error: String) -> Self {
        Self {
            step,
            status: StepStatus::Failed,
            elapsed_secs: elapsed.as_secs_f64(),
            error: Some(error),
        }
    }
}

/// How a scenario ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum ScenarioOutcome {
    Passed,
    Failed { step: LifecycleStep, error: String },
    Skipped { reason: String },
    /// The scenario task ended without reporting (panic or abort).
    Crashed { reason: String },
}

impl ScenarioOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioOutcome::Passed => "PASS",
            ScenarioOutcome::Failed { .. } | ScenarioOutcome::Crashed { .. } => "FAIL",
            ScenarioOutcome::Skipped { .. } => "SKIP",
        }
    }

    /// Whether the suite fails because of this outcome
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ScenarioOutcome::Failed { .. } | ScenarioOutcome::Crashed { .. }
        )
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub name: String,
    pub started_at: Timestamp,
    pub elapsed_secs: f64,
    pub outcome: ScenarioOutcome,
    pub steps: Vec<StepReport>,
}

impl ScenarioReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started_at: Timestamp::now(),
            elapsed_secs: 0.0,
            outcome: ScenarioOutcome::Passed,
            steps: Vec::new(),
        }
    }

    /// Report for a scenario whose task never returned a report.
    pub fn crashed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut report = Self::new(name);
        report.outcome = ScenarioOutcome::Crashed {
            reason: reason.into(),
        };
        report
    }

    pub fn finish(&mut self, outcome: ScenarioOutcome, elapsed: Duration) {
        self.outcome = outcome;
        self.elapsed_secs = elapsed.as_secs_f64();
    }

    /// Steps that ran, in order.
    pub fn executed_steps(&self) -> Vec<LifecycleStep> {
        self.steps.iter().map(|s| s.step).collect()
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "--- {}: {} ({:.2}s)",
            self.outcome.label(),
            self.name,
            self.elapsed_secs
        )?;
        match &self.outcome {
            ScenarioOutcome::Skipped { reason } => write!(f, "\n    Skip test: {}", reason)?,
            ScenarioOutcome::Crashed { reason } => write!(f, "\n    {}", reason)?,
            _ => {}
        }
        for step in &self.steps {
            let label = match step.status {
                StepStatus::Passed => "PASS",
                StepStatus::Failed => "FAIL",
            };
            write!(
                f,
                "\n    --- {}: {}/{} ({:.2}s)",
                label, self.name, step.step, step.elapsed_secs
            )?;
            if let Some(error) = &step.error {
                write!(f, "\n        {}", error)?;
            }
        }
        Ok(())
    }
}

/// Results of a whole run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub started_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
    pub scenarios: Vec<ScenarioReport>,
    /// Suite-level problem outside any scenario, such as channel cleanup.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl Default for SuiteReport {
    fn default() -> Self {
        Self::new()
    }
}

impl SuiteReport {
    pub fn new() -> Self {
        Self {
            started_at: Timestamp::now(),
            finished_at: None,
            scenarios: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.scenarios.sort_by(|a, b| a.name.cmp(&b.name));
        self.finished_at = Some(Timestamp::now());
    }

    /// No scenario failed and no suite-level error occurred. Skips do not
    /// fail the run.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && !self.scenarios.iter().any(|s| s.outcome.is_failure())
    }

    pub fn count(&self, label: &str) -> usize {
        self.scenarios
            .iter()
            .filter(|s| s.outcome.label() == label)
            .count()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for scenario in &self.scenarios {
            writeln!(f, "{}", scenario)?;
        }
        for error in &self.errors {
            writeln!(f, "ERROR: {}", error)?;
        }
        write!(
            f,
            "{} ({} passed, {} failed, {} skipped)",
            if self.is_success() { "PASS" } else { "FAIL" },
            self.count("PASS"),
            self.count("FAIL"),
            self.count("SKIP")
        )
    }
}
