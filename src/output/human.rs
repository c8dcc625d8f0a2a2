//! Human-friendly output implementation using console styling.

use std::path::Path;

use console::style;
use tracing::{debug, instrument, trace};

use crate::app::CaptureOutcome;
use crate::capture::ImageSummary;
use crate::error::SnapError;
use crate::history::HistorySnapshot;

use super::{Output, SettingsReport};

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    quiet: bool,
}

impl HumanOutput {
    #[instrument]
    pub fn new(quiet: bool) -> Self {
        debug!("Creating HumanOutput");
        Self { quiet }
    }
}

fn time_label(image: &ImageSummary) -> String {
    image.captured_at.format("%H:%M:%S").to_string()
}

impl Output for HumanOutput {
    fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {message}", style("[OK]").green().bold());
        }
    }

    #[instrument(skip(self))]
    fn error(&self, error: &SnapError) {
        debug!(
            error = %error,
            recoverable = error.is_user_recoverable(),
            "Outputting error"
        );
        eprintln!("{}: {error}", style("Error").red().bold());
        if let Some(suggestion) = error.suggestion() {
            trace!(suggestion, "Adding suggestion");
            eprintln!("{}: {suggestion}", style("Hint").yellow());
        }
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {message}", style("[WARN]").yellow().bold());
    }

    fn info(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    fn capture_outcome(&self, outcome: &CaptureOutcome) {
        match outcome {
            CaptureOutcome::Captured(image) => self.success(&format!(
                "Captured {}x{} at {}",
                image.width,
                image.height,
                time_label(image)
            )),
            CaptureOutcome::PermissionRequested => {
                self.warning("Screen recording is not permitted for this terminal.");
                self.info("Permission was requested; the privacy settings will open shortly.");
            }
        }
    }

    fn saved(&self, image: &ImageSummary, path: &Path) {
        self.success(&format!(
            "Saved {}x{} screenshot to {}",
            image.width,
            image.height,
            style(path.display()).cyan()
        ));
    }

    fn history(&self, snapshot: &HistorySnapshot) {
        if snapshot.is_empty() {
            println!("{}", style("No screenshots yet").dim());
            return;
        }
        println!("{}", style("HISTORY (newest first)").bold().underlined());
        for (index, item) in snapshot.items.iter().enumerate() {
            let summary = item.summary();
            println!(
                "  {}  {}x{}  {}  {}",
                style(format!("[{index}]")).green(),
                summary.width,
                summary.height,
                time_label(&summary),
                style(summary.id).dim()
            );
        }
    }

    fn permission_status(&self, permitted: bool) {
        if permitted {
            self.success("Screen recording permitted");
        } else {
            self.warning("Screen recording not permitted (run `snap permission request`)");
        }
    }

    fn settings(&self, report: &SettingsReport<'_>) {
        let capture = &report.settings.capture;
        println!(
            "{}: {}",
            style("Source").bold(),
            report.source.as_deref().unwrap_or("built-in defaults")
        );
        println!("{}: {:?}", style("Backend").bold(), capture.backend);
        println!("{}: {}s", style("Timeout").bold(), capture.timeout_secs);
        println!("{}: {}", style("Show cursor").bold(), capture.show_cursor);
        println!(
            "{}: {}",
            style("Exclude own windows").bold(),
            capture.exclude_own_windows
        );
        println!("{}: {}", style("Save directory").bold(), report.save_directory);
    }

    fn version_info(&self, version: &str, target: &str) {
        println!("snap {version}");
        println!("target: {target}");
    }
}
