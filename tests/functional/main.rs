// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Functional tests for the DRPC poller and the scenario sequencer.
//!
//! These tests run WITHOUT a Kubernetes cluster. Fetches are scripted and
//! sleeps are either counted or run on paused tokio time.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run specific test
//! cargo test --test functional test_enable_failure_stops_the_scenario
//! ```
//!
//! ## Test Categories
//!
//! - **Poller tests**: readiness, phase, progression and deletion waits,
//!   including timeout and cancellation reporting
//! - **Action tests**: failover and relocate ordering against a scripted hub
//! - **Sequencer tests**: step ordering, fail-fast, validation skips and
//!   concurrent scenarios

mod action_tests;
#[path = "../common/fixtures.rs"]
mod fixtures;
mod mock_state;
mod sequencer_tests;
