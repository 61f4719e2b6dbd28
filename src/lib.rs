//! dr-e2e library crate
//!
//! End-to-end validation of DR protection across a hub and two managed
//! clusters. Each scenario deploys a workload, protects it with a
//! DRPlacementControl, fails it over, relocates it back, removes protection
//! and undeploys it, polling the DRPC status between steps.

pub mod config;
pub mod crd;
pub mod deployers;
pub mod dr;
pub mod error;
pub mod flow;
pub mod resources;
pub mod runner;
pub mod wait;
pub mod workloads;

pub use config::Config;
pub use error::{Error, Result};
pub use flow::{ScenarioReport, SuiteReport};
pub use runner::run;
