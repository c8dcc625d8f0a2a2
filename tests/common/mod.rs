//! Common test utilities for the snapshelf CLI and library.
//!
//! - `cli`: CLI runner with output verification and fluent assertions
//! - `env`: Locked environment variable overrides
//! - `fixtures`: Temporary settings files and save directories
#![allow(dead_code)]


use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
