// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Property-based tests for dr-e2e.
//!
//! Uses proptest to generate random inputs and verify invariants.

use proptest::prelude::*;

use dr_e2e::crd::{Condition, ProgressionStatus};
use dr_e2e::dr::{ClusterPolicy, target_cluster};
use dr_e2e::flow::{LifecycleStep, SequencerEvent, SequencerState, TransitionResult, transition};
use dr_e2e::wait::conditions::is_ready;
use dr_e2e::wait::{ConditionSet, ConditionStatus, ConditionType, DrpcSnapshot};

/// Strategy for cluster names.
fn cluster_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,12}"
}

/// Strategy for condition status strings, including unexpected ones.
fn status_string() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("True".to_string()),
        Just("False".to_string()),
        Just("Unknown".to_string()),
        "[a-z]{0,5}",
    ]
}

fn any_progression() -> impl Strategy<Value = Option<ProgressionStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(ProgressionStatus::Completed)),
        Just(Some(ProgressionStatus::CleaningUp)),
        Just(Some(ProgressionStatus::WaitForReadiness)),
        Just(Some(ProgressionStatus::Unknown)),
    ]
}

fn any_event() -> impl Strategy<Value = SequencerEvent> {
    prop_oneof![
        Just(SequencerEvent::ValidationPassed),
        Just(SequencerEvent::ValidationFailed),
        Just(SequencerEvent::StepSucceeded),
        Just(SequencerEvent::StepFailed),
    ]
}

proptest! {
    /// The target of the target is the original cluster.
    #[test]
    fn target_selection_is_symmetric(
        (first, second) in (cluster_name(), cluster_name()).prop_filter("distinct", |(a, b)| a != b),
        pick_second in any::<bool>(),
    ) {
        let policy = ClusterPolicy::new("dr-policy", first.clone(), second.clone());
        let current = if pick_second { &second } else { &first };

        let target = target_cluster(&policy, current);
        prop_assert_ne!(target, current.as_str());
        prop_assert_eq!(target_cluster(&policy, target), current.as_str());
    }

    /// A cluster outside the pair selects the first entry.
    #[test]
    fn non_member_selects_first(
        first in cluster_name(),
        second in cluster_name(),
        other in "x[a-z0-9]{0,8}-other",
    ) {
        let policy = ClusterPolicy::new("dr-policy", first.clone(), second);
        prop_assume!(!policy.contains(&other));
        prop_assert_eq!(target_cluster(&policy, &other), first.as_str());
    }

    /// Readiness holds exactly when all four signals hold together.
    #[test]
    fn ready_iff_all_signals(
        available in status_string(),
        peer_ready in status_string(),
        progression in any_progression(),
        sync_time in prop::option::of(prop_oneof![Just(String::new()), Just("2024-01-01T00:00:00Z".to_string())]),
    ) {
        let expected = available == "True"
            && peer_ready == "True"
            && progression == Some(ProgressionStatus::Completed)
            && sync_time.as_deref().is_some_and(|t| !t.is_empty());

        let snapshot = DrpcSnapshot {
            conditions: ConditionSet::from_conditions(&[
                Condition::new("Available", &available, "Test"),
                Condition::new("PeerReady", &peer_ready, "Test"),
            ]),
            phase: None,
            progression,
            last_group_sync_time: sync_time,
        };
        prop_assert_eq!(is_ready(&snapshot), expected);
    }

    /// The first condition of a type wins over later duplicates.
    #[test]
    fn first_condition_wins(statuses in prop::collection::vec(status_string(), 1..6)) {
        let conditions: Vec<Condition> = statuses
            .iter()
            .map(|s| Condition::new("Available", s, "Test"))
            .collect();
        let set = ConditionSet::from_conditions(&conditions);

        prop_assert_eq!(
            set.status(&ConditionType::Available),
            Some(ConditionStatus::from(statuses[0].as_str()))
        );
    }

    /// No event sequence moves the sequencer out of a terminal state or
    /// skips a step.
    #[test]
    fn sequencer_never_skips_steps(events in prop::collection::vec(any_event(), 0..20)) {
        let mut state = SequencerState::Pending;
        let mut visited = Vec::new();

        for event in events {
            if let TransitionResult::Success { from, to } = transition(state, event) {
                prop_assert!(!from.is_terminal());
                if let SequencerState::Running(step) = to {
                    visited.push(step);
                }
                state = to;
            }
        }

        let expected: Vec<LifecycleStep> = LifecycleStep::ALL[..visited.len()].to_vec();
        prop_assert_eq!(visited, expected);
    }
}
