//! Disaster recovery operations on the hub.
//!
//! - `policy`: DR cluster pairs and failover target selection
//! - `actions`: enable, failover, relocate and disable

pub mod actions;
pub mod policy;

pub use policy::{ClusterPolicy, KubePolicyLookup, PolicyLookup, target_cluster};
