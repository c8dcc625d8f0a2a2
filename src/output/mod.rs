//! Output mode abstraction for robot and human output.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::app::CaptureOutcome;
use crate::capture::ImageSummary;
use crate::cli::Cli;
use crate::config::Settings;
use crate::error::SnapError;
use crate::history::HistorySnapshot;

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// JSON output for agents and scripting.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human { quiet: bool },
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            if cli.no_color {
                console::set_colors_enabled(false);
                console::set_colors_enabled_stderr(false);
            }
            Self::Human { quiet: cli.quiet }
        }
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Arc<dyn Output> {
        match self {
            Self::Robot(format) => Arc::new(RobotOutput::new(format)),
            Self::Human { quiet } => Arc::new(HumanOutput::new(quiet)),
        }
    }
}

/// Settings as shown by `snap config`.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsReport<'a> {
    /// File the settings came from; `None` means built-in defaults.
    pub source: Option<String>,
    pub settings: &'a Settings,
    pub save_directory: String,
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode. Shared with
/// the shell's history watcher, hence `Send + Sync`.
pub trait Output: Send + Sync {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &SnapError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    // Capture and history
    fn capture_outcome(&self, outcome: &CaptureOutcome);
    fn saved(&self, image: &ImageSummary, path: &Path);
    fn history(&self, snapshot: &HistorySnapshot);

    // System
    fn permission_status(&self, permitted: bool);
    fn settings(&self, report: &SettingsReport<'_>);
    fn version_info(&self, version: &str, target: &str);
}
