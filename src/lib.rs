//! Snapshelf library - screenshot capture with a bounded, observable history.
//!
//! This library exposes the core of the `snap` CLI for use in tests and by
//! other front ends.
//!
//! # Modules
//!
//! - `capture`: Single-frame capture over streaming and snapshot backends
//! - `history`: Newest-first history bounded at ten screenshots
//! - `permission`: Screen recording permission gate
//! - `app`: Controller tying capture, history and saving together
//! - `export`: PNG output and default file naming
//! - `error`: Error types with user-recoverable hints
//! - `output`: Output mode abstraction (robot/human)
//! - `config`: Configuration file handling
#![forbid(unsafe_code)]

pub mod app;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod logging;
pub mod output;
pub mod permission;
