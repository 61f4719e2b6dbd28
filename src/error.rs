//! Error types for the test suite.
//!
//! Errors are classified by how the runner reacts to them: configuration
//! errors abort the run, validation errors skip a scenario, everything else
//! fails the step it happened in.

use thiserror::Error;

use crate::wait::{FetchError, SleepError, WaitError};

/// Error type for suite operations
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workload, deployer or PVC spec kind with no implementation
    #[error("Unknown {what} {kind:?}")]
    UnknownKind { what: &'static str, kind: String },

    /// Scenario preconditions are not met
    #[error("Validation error: {0}")]
    Validation(String),

    /// A wait did not converge
    #[error(transparent)]
    Wait(#[from] WaitError),

    /// The scenario context ended before a step could start
    #[error("Interrupted: {0}")]
    Interrupted(#[from] SleepError),

    /// A resource could not be read
    #[error("Failed to get {target}: {source}")]
    Fetch {
        target: String,
        #[source]
        source: FetchError,
    },

    /// DR policy is missing or malformed
    #[error("Policy error: {0}")]
    Policy(String),

    /// Missing required field in a remote resource
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Kubeconfig could not be loaded
    #[error("Kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),
}

impl Error {
    /// Create an unknown workload error
    pub fn unknown_workload(kind: impl Into<String>) -> Self {
        Self::UnknownKind {
            what: "workload",
            kind: kind.into(),
        }
    }

    /// Create an unknown deployer error
    pub fn unknown_deployer(kind: impl Into<String>) -> Self {
        Self::UnknownKind {
            what: "deployer",
            kind: kind.into(),
        }
    }

    /// Create an unknown PVC spec error
    pub fn unknown_pvc_spec(kind: impl Into<String>) -> Self {
        Self::UnknownKind {
            what: "pvcSpec",
            kind: kind.into(),
        }
    }

    /// Check if this error aborts the whole run before any scenario starts
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::UnknownKind { .. } | Error::Kubeconfig(_)
        )
    }

    /// Check if this error skips a scenario instead of failing it
    pub fn is_skip(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Result type alias for suite operations
pub type Result<T> = std::result::Result<T, Error>;
