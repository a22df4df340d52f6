//! Test helper modules for qsync-sd integration tests
//!
//! Provides:
//! - MockOracle: scripted session oracle that records every call with its
//!   virtual timestamp
//! - setup helpers wiring a SessionSync to the mock

#![allow(dead_code)]

pub mod mock_oracle;

pub use mock_oracle::{failure, MockOracle, OracleCall, RecordedCall};

use std::sync::Arc;

use qsync_common::config::SyncTimings;
use qsync_sd::scheduler::Scheduler;
use qsync_sd::SessionSync;

/// SessionSync on the current (test) runtime with default timings
pub fn setup() -> (SessionSync, Arc<MockOracle>) {
    setup_with(SyncTimings::default())
}

pub fn setup_with(timings: SyncTimings) -> (SessionSync, Arc<MockOracle>) {
    let oracle = Arc::new(MockOracle::new());
    let sync = SessionSync::new(Scheduler::current(), oracle.clone(), timings);
    (sync, oracle)
}

/// Let virtual time run for `secs` seconds
pub async fn run_for(secs: u64) {
    tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
}
