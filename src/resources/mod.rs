//! Kubernetes objects created by the suite.
//!
//! | Resource | Cluster | Purpose |
//! |----------|---------|---------|
//! | Channel | hub | Git source shared by all scenarios |
//! | ManagedClusterSetBinding | hub | Makes the cluster set usable from ramen-ops |
//! | Placement | hub | Selects the cluster running a protected application |
//! | Namespace, PVC, Deployment | managed | The application itself |

pub mod channel;
pub mod common;
pub mod ocm;

pub use common::{FIELD_MANAGER, standard_labels};
