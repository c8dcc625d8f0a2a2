//! Robot mode JSON output implementation.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::app::CaptureOutcome;
use crate::capture::ImageSummary;
use crate::error::SnapError;
use crate::history::HistorySnapshot;

use super::{Output, RobotFormat, SettingsReport};

/// JSON output implementation for agents and scripting.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    #[instrument]
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    fn render<T: Serialize + ?Sized>(&self, data: &T) -> String {
        let rendered = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        rendered.unwrap_or_else(|e| {
            serde_json::json!({ "error": true, "message": format!("serialization failed: {e}") })
                .to_string()
        })
    }

    /// Output any serializable data as JSON to stdout.
    #[instrument(skip(self, data), fields(format = ?self.format))]
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        let json = self.render(data);
        trace!(json_len = json.len(), "JSON serialized");
        println!("{json}");
    }

    /// Output JSON to stderr (errors).
    fn output_json_stderr<T: Serialize>(&self, data: &T) {
        let json = self.render(data);
        trace!(json_len = json.len(), "JSON error serialized");
        eprintln!("{json}");
    }
}

/// Error object written to stderr in robot mode.
pub fn error_json(error: &SnapError) -> serde_json::Value {
    serde_json::json!({
        "error": true,
        "message": error.to_string(),
        "suggestion": error.suggestion(),
        "recoverable": error.is_user_recoverable(),
    })
}

/// Rows of `snapshot`, numbered the way `save N` and `quick-save N` expect.
fn history_json(snapshot: &HistorySnapshot) -> serde_json::Value {
    let items: Vec<_> = snapshot
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::json!({
                "index": index,
                "id": item.id(),
                "width": item.width(),
                "height": item.height(),
                "captured_at": item.timestamp(),
            })
        })
        .collect();
    serde_json::json!({
        "revision": snapshot.revision,
        "count": items.len(),
        "items": items,
    })
}

impl Output for RobotOutput {
    fn success(&self, message: &str) {
        self.output_json(&serde_json::json!({
            "success": true,
            "message": message
        }));
    }

    fn error(&self, error: &SnapError) {
        debug!(error = %error, "Robot: error");
        self.output_json_stderr(&error_json(error));
    }

    fn warning(&self, message: &str) {
        self.output_json(&serde_json::json!({
            "warning": true,
            "message": message
        }));
    }

    fn info(&self, message: &str) {
        self.output_json(&serde_json::json!({
            "info": true,
            "message": message
        }));
    }

    fn capture_outcome(&self, outcome: &CaptureOutcome) {
        self.output_json(outcome);
    }

    fn saved(&self, image: &ImageSummary, path: &Path) {
        self.output_json(&serde_json::json!({
            "saved": true,
            "id": image.id,
            "width": image.width,
            "height": image.height,
            "captured_at": image.captured_at,
            "path": path.display().to_string(),
        }));
    }

    #[instrument(skip(self, snapshot), fields(count = snapshot.len()))]
    fn history(&self, snapshot: &HistorySnapshot) {
        self.output_json(&history_json(snapshot));
    }

    fn permission_status(&self, permitted: bool) {
        self.output_json(&serde_json::json!({ "permitted": permitted }));
    }

    fn settings(&self, report: &SettingsReport<'_>) {
        self.output_json(report);
    }

    fn version_info(&self, version: &str, target: &str) {
        self.output_json(&serde_json::json!({
            "version": version,
            "target": target,
        }));
    }
}
