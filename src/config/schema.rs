//! Settings schema.
//!
//! Every field has a default so an empty or partial file is valid.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default deadline for the first frame of a capture stream.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Which capture strategy to build at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Streaming when the platform supports it, otherwise whole-screen snapshot.
    #[default]
    Auto,
    /// Single frame from a capture stream.
    Stream,
    /// Legacy whole-screen snapshot.
    Snapshot,
    /// Scripted in-process backend producing synthetic frames.
    Mock,
}

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub capture: CaptureSettings,
    pub save: SaveSettings,
}

/// `[capture]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureSettings {
    pub backend: BackendKind,
    pub timeout_secs: u64,
    pub show_cursor: bool,
    pub exclude_own_windows: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            show_cursor: false,
            exclude_own_windows: true,
        }
    }
}

impl CaptureSettings {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[save]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaveSettings {
    /// Preferred quick-save directory; `~` is expanded on load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}
