//! Error types for screenshot capture and history operations.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// Terminal failure of a single capture attempt.
///
/// None of these are retried internally; the caller decides whether to try again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("No display available to capture")]
    NoDisplay,

    #[error("Capture stream failed: {0}")]
    StreamError(String),

    #[error("Capture stream failed to start: {0}")]
    StartFailed(String),

    #[error("No frame arrived within {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Capture was cancelled")]
    Cancelled,

    #[error("Capture backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Primary error type for snapshelf operations.
#[derive(Error, Debug)]
pub enum SnapError {
    // Capture errors
    #[error(transparent)]
    Capture(#[from] CaptureError),

    // History errors
    #[error("No screenshot at history position {index} (history holds {len})")]
    HistoryItemNotFound { index: usize, len: usize },

    #[error("No screenshot with id {0} in history")]
    HistoryIdNotFound(Uuid),

    #[error("History is empty")]
    HistoryEmpty,

    // Export errors
    #[error("PNG encoding failed: {0}")]
    ImageEncoding(String),

    #[error("Cannot create save directory '{path}': {reason}")]
    SaveDirectory { path: String, reason: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl SnapError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Capture(
                CaptureError::NoDisplay | CaptureError::Timeout(_) | CaptureError::StartFailed(_)
            ) | Self::HistoryItemNotFound { .. }
                | Self::HistoryIdNotFound(_)
                | Self::HistoryEmpty
                | Self::SaveDirectory { .. }
                | Self::ConfigNotFound { .. }
                | Self::ConfigInvalid(_)
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Capture(CaptureError::NoDisplay) => Some("Connect or wake a display, then retry"),
            Self::Capture(CaptureError::Timeout(_)) => Some("Retry the capture"),
            Self::Capture(CaptureError::StartFailed(_)) => {
                Some("Check screen recording permission: snap permission open")
            }
            Self::Capture(CaptureError::BackendUnavailable(_)) => {
                Some("Rebuild with --features native or use --backend mock")
            }
            Self::HistoryItemNotFound { .. } | Self::HistoryIdNotFound(_) | Self::HistoryEmpty => {
                Some("Run `list` to see available screenshots")
            }
            Self::ConfigNotFound { .. } => Some("Check --config or SNAPSHELF_CONFIG"),
            Self::ConfigParse(_) => Some("Fix the TOML syntax; `snap config --path` shows the file"),
            Self::ConfigInvalid(_) => Some("capture.timeout_secs must be at least 1"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using SnapError.
pub type Result<T> = std::result::Result<T, SnapError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| SnapError::Other(format!("{}: {e}", f().into())))
    }
}
