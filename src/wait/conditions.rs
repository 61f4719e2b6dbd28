//! Pure predicates over observed DRPC status.
//!
//! All status combination rules live here, decoupled from fetching and
//! retrying. A predicate only ever sees one snapshot, so signals observed in
//! different polls never combine into a positive verdict.

use std::collections::BTreeMap;
use std::fmt;

use crate::crd::{Condition, DRPlacementControl, DrState, ProgressionStatus};

use super::fetcher::FetchError;

/// Condition types the evaluator knows by name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConditionType {
    /// The application is available on the current cluster.
    Available,
    /// The peer cluster is ready to take over.
    PeerReady,
    /// Any other condition type, kept verbatim.
    Other(String),
}

impl From<&str> for ConditionType {
    fn from(s: &str) -> Self {
        match s {
            "Available" => ConditionType::Available,
            "PeerReady" => ConditionType::PeerReady,
            other => ConditionType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionType::Available => write!(f, "Available"),
            ConditionType::PeerReady => write!(f, "PeerReady"),
            ConditionType::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Tri-state condition status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl From<&str> for ConditionStatus {
    fn from(s: &str) -> Self {
        match s {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionStatus::True => write!(f, "True"),
            ConditionStatus::False => write!(f, "False"),
            ConditionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Condition statuses keyed by type.
///
/// Built from a condition list with first-entry-wins semantics. A type that
/// is absent is never satisfied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionSet(BTreeMap<ConditionType, ConditionStatus>);

impl ConditionSet {
    pub fn from_conditions(conditions: &[Condition]) -> Self {
        let mut map = BTreeMap::new();
        for condition in conditions {
            map.entry(ConditionType::from(condition.r#type.as_str()))
                .or_insert_with(|| ConditionStatus::from(condition.status.as_str()));
        }
        Self(map)
    }

    /// Status of `condition_type`, if present.
    pub fn status(&self, condition_type: &ConditionType) -> Option<ConditionStatus> {
        self.0.get(condition_type).copied()
    }

    /// Check if a condition type is present and true
    pub fn is_true(&self, condition_type: &ConditionType) -> bool {
        self.status(condition_type) == Some(ConditionStatus::True)
    }

    fn describe(&self, condition_type: &ConditionType) -> String {
        self.status(condition_type)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "<absent>".to_string())
    }
}

/// The fields of one DRPC observation that waits care about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrpcSnapshot {
    pub conditions: ConditionSet,
    pub phase: Option<DrState>,
    pub progression: Option<ProgressionStatus>,
    pub last_group_sync_time: Option<String>,
}

impl From<&DRPlacementControl> for DrpcSnapshot {
    fn from(drpc: &DRPlacementControl) -> Self {
        match &drpc.status {
            Some(status) => Self {
                conditions: ConditionSet::from_conditions(&status.conditions),
                phase: status.phase,
                progression: status.progression,
                last_group_sync_time: status.last_group_sync_time.clone(),
            },
            None => Self::default(),
        }
    }
}

impl DrpcSnapshot {
    fn has_group_sync_time(&self) -> bool {
        self.last_group_sync_time
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Display for DrpcSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opt = |v: Option<String>| v.unwrap_or_else(|| "<none>".to_string());
        write!(
            f,
            "phase: {}, progression: {}, Available: {}, PeerReady: {}, lastGroupSyncTime: {}",
            opt(self.phase.map(|p| p.to_string())),
            opt(self.progression.map(|p| p.to_string())),
            self.conditions.describe(&ConditionType::Available),
            self.conditions.describe(&ConditionType::PeerReady),
            opt(self.last_group_sync_time.clone().filter(|t| !t.is_empty())),
        )
    }
}

/// Available and PeerReady are true, progression is Completed and the last
/// group sync time is set, all in the same snapshot.
pub fn is_ready(snapshot: &DrpcSnapshot) -> bool {
    snapshot.conditions.is_true(&ConditionType::Available)
        && snapshot.conditions.is_true(&ConditionType::PeerReady)
        && snapshot.progression == Some(ProgressionStatus::Completed)
        && snapshot.has_group_sync_time()
}

/// Exact phase equality.
pub fn phase_equals(snapshot: &DrpcSnapshot, target: DrState) -> bool {
    snapshot.phase == Some(target)
}

/// Exact progression equality.
pub fn progression_equals(snapshot: &DrpcSnapshot, target: ProgressionStatus) -> bool {
    snapshot.progression == Some(target)
}

/// What a DRPC wait is waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrpcCondition {
    Ready,
    Phase(DrState),
    Progression(ProgressionStatus),
    Deleted,
}

impl fmt::Display for DrpcCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrpcCondition::Ready => write!(f, "ready"),
            DrpcCondition::Phase(p) => write!(f, "phase {:?}", p.to_string()),
            DrpcCondition::Progression(p) => write!(f, "progression {:?}", p.to_string()),
            DrpcCondition::Deleted => write!(f, "deleted"),
        }
    }
}

/// Verdict of evaluating one fetch outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The condition holds; stop waiting.
    Met,
    /// Not yet; retry after the interval.
    Pending,
    /// The resource is gone and can never satisfy the condition.
    Vanished,
}

impl DrpcCondition {
    /// Evaluate the outcome of one fetch.
    ///
    /// Fetch errors other than not-found are transient for every condition.
    /// An interrupted fetch stays pending; the following sleep ends the wait.
    /// Not-found satisfies `Deleted` and ends every other wait.
    pub fn evaluate(&self, fetched: Result<&DrpcSnapshot, &FetchError>) -> Verdict {
        match (self, fetched) {
            (DrpcCondition::Deleted, Err(FetchError::NotFound)) => Verdict::Met,
            (DrpcCondition::Deleted, _) => Verdict::Pending,
            (_, Err(FetchError::NotFound)) => Verdict::Vanished,
            (_, Err(FetchError::Api(_) | FetchError::Interrupted(_))) => Verdict::Pending,
            (condition, Ok(snapshot)) => {
                if condition.holds(snapshot) {
                    Verdict::Met
                } else {
                    Verdict::Pending
                }
            }
        }
    }

    fn holds(&self, snapshot: &DrpcSnapshot) -> bool {
        match self {
            DrpcCondition::Ready => is_ready(snapshot),
            DrpcCondition::Phase(target) => phase_equals(snapshot, *target),
            DrpcCondition::Progression(target) => progression_equals(snapshot, *target),
            DrpcCondition::Deleted => false,
        }
    }
}
