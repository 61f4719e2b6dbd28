//! Failover and relocate against a scripted hub.

use std::sync::Mutex;
use std::time::Duration;

use dr_e2e::Error;
use dr_e2e::crd::{DrAction, DrState, ProgressionStatus};
use dr_e2e::dr::ClusterPolicy;
use dr_e2e::dr::actions::{ActionRequest, move_workload};
use dr_e2e::wait::{ExecContext, Poller, WaitError};

use crate::fixtures::DrpcBuilder;
use crate::mock_state::{CountingSleeper, Fetch, ScriptedFetcher, StaticPolicy};

const NAME: &str = "disapp-deploy-rbd";

fn hub(script: Vec<Fetch>) -> Poller<ScriptedFetcher, CountingSleeper> {
    Poller::new(
        ScriptedFetcher::new(script),
        CountingSleeper::deadline_after(10),
        Duration::from_secs(5),
        "hub",
    )
}

fn policy() -> StaticPolicy {
    StaticPolicy(ClusterPolicy::new("dr-policy", "dr1", "dr2"))
}

fn request(action: DrAction) -> ActionRequest<'static> {
    ActionRequest {
        action,
        namespace: "ramen-ops",
        name: NAME,
        dr_policy: "dr-policy",
    }
}

fn found(builder: DrpcBuilder) -> Fetch {
    Fetch::Found(builder.build())
}

#[tokio::test]
async fn test_failover_waits_for_cleanup_then_phase_then_ready() {
    let hub = hub(vec![
        found(DrpcBuilder::new(NAME).decision("dr1").phase(DrState::Deployed)),
        found(DrpcBuilder::new(NAME).progression(ProgressionStatus::FailingOverToCluster)),
        found(DrpcBuilder::new(NAME).progression(ProgressionStatus::WaitOnUserToCleanUp)),
        found(
            DrpcBuilder::new(NAME)
                .phase(DrState::FailedOver)
                .progression(ProgressionStatus::CleaningUp),
        ),
        found(DrpcBuilder::new(NAME).phase(DrState::FailedOver).ready()),
    ]);
    let cleaned = Mutex::new(Vec::new());

    let target = move_workload(
        &ExecContext::new(),
        &hub,
        &policy(),
        request(DrAction::Failover),
        |left: String| {
            // Cleanup runs right after the controller asked for it.
            cleaned.lock().unwrap().push((left, hub.fetcher().calls()));
            async { Ok::<(), Error>(()) }
        },
    )
    .await
    .unwrap();

    assert_eq!(target, "dr2");
    assert_eq!(
        hub.fetcher().requested(),
        vec![(DrAction::Failover, "dr2".to_string())]
    );
    assert_eq!(*cleaned.lock().unwrap(), vec![("dr1".to_string(), 3)]);
    assert_eq!(hub.fetcher().calls(), 5);
}

#[tokio::test]
async fn test_relocate_cleanup_failure_stops_the_action() {
    let hub = hub(vec![
        found(
            DrpcBuilder::new(NAME)
                .decision("dr2")
                .phase(DrState::FailedOver)
                .progression(ProgressionStatus::WaitOnUserToCleanUp),
        ),
    ]);
    let cleaned = Mutex::new(Vec::new());

    let err = move_workload(
        &ExecContext::new(),
        &hub,
        &policy(),
        request(DrAction::Relocate),
        |left: String| {
            cleaned.lock().unwrap().push(left);
            async { Err::<(), Error>(Error::Validation("cleanup failed".to_string())) }
        },
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("cleanup failed"));
    assert_eq!(*cleaned.lock().unwrap(), vec!["dr2".to_string()]);
    assert_eq!(
        hub.fetcher().requested(),
        vec![(DrAction::Relocate, "dr1".to_string())]
    );
    // The initial read and one progression check; no phase or ready wait.
    assert_eq!(hub.fetcher().calls(), 2);
}

#[tokio::test]
async fn test_missing_current_cluster_requests_nothing() {
    let hub = hub(vec![found(DrpcBuilder::new(NAME).phase(DrState::Deployed))]);

    let err = move_workload(
        &ExecContext::new(),
        &hub,
        &policy(),
        request(DrAction::Failover),
        |_left: String| async { Ok::<(), Error>(()) },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::MissingField(_)), "{}", err);
    assert!(hub.fetcher().requested().is_empty());
}

#[tokio::test]
async fn test_drpc_vanishing_before_cleanup_skips_cleanup() {
    let hub = hub(vec![
        found(DrpcBuilder::new(NAME).decision("dr1").phase(DrState::Deployed)),
        Fetch::NotFound,
    ]);
    let cleaned = Mutex::new(false);

    let err = move_workload(
        &ExecContext::new(),
        &hub,
        &policy(),
        request(DrAction::Failover),
        |_left: String| {
            *cleaned.lock().unwrap() = true;
            async { Ok::<(), Error>(()) }
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Wait(WaitError::Vanished { .. })), "{}", err);
    assert!(!*cleaned.lock().unwrap());
}

#[tokio::test]
async fn test_unknown_policy_fails_before_requesting() {
    let hub = hub(vec![found(DrpcBuilder::new(NAME).decision("dr1"))]);

    let err = move_workload(
        &ExecContext::new(),
        &hub,
        &policy(),
        ActionRequest {
            dr_policy: "other-policy",
            ..request(DrAction::Failover)
        },
        |_left: String| async { Ok::<(), Error>(()) },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Policy(_)), "{}", err);
    assert!(hub.fetcher().requested().is_empty());
}
