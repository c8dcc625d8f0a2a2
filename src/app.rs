//! Application controller.
//!
//! Owns the permission gate, the capturer, the history and the preferred
//! save directory, and is the single writer of the history. Presentation
//! layers call into it and observe the history through [`App::subscribe`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::capture::{
    CaptureOptions, CapturedImage, Cancellation, ImageSummary, ScreenCapturer, select_capturer,
};
use crate::config::{BackendKind, Settings};
use crate::error::{Result, SnapError};
use crate::export;
use crate::history::{HistorySnapshot, HistoryStore};
use crate::permission::{PermissionBackend, PermissionGate};

/// Pause between requesting permission and opening the privacy settings,
/// so the OS prompt gets a chance to appear first.
pub const REMEDIAL_PANEL_DELAY: Duration = Duration::from_millis(400);

/// Result of a capture request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// A screenshot was added to the front of the history.
    Captured(ImageSummary),
    /// Capture is not authorized. Permission was requested and the privacy
    /// settings will open shortly.
    PermissionRequested,
}

/// Reference to a history item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRef {
    /// Position, 0 being the newest.
    Index(usize),
    Id(Uuid),
}

impl From<usize> for HistoryRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<Uuid> for HistoryRef {
    fn from(id: Uuid) -> Self {
        Self::Id(id)
    }
}

pub struct App<P> {
    gate: PermissionGate<P>,
    capturer: Box<dyn ScreenCapturer>,
    history: HistoryStore,
    preferred_dir: Option<PathBuf>,
    remedial_delay: Duration,
}

impl<P: PermissionBackend + Clone + 'static> App<P> {
    pub fn new(permissions: P, capturer: Box<dyn ScreenCapturer>) -> Self {
        Self {
            gate: PermissionGate::new(permissions),
            capturer,
            history: HistoryStore::new(),
            preferred_dir: None,
            remedial_delay: REMEDIAL_PANEL_DELAY,
        }
    }

    /// Build from settings. `backend` overrides `capture.backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected capture backend is unavailable.
    pub fn from_settings(
        permissions: P,
        settings: &Settings,
        backend: Option<BackendKind>,
    ) -> Result<Self> {
        let kind = backend.unwrap_or(settings.capture.backend);
        let capturer = select_capturer(kind, CaptureOptions::from(&settings.capture))?;
        Ok(Self::new(permissions, capturer).with_save_directory(settings.save.directory.clone()))
    }

    #[must_use]
    pub fn with_save_directory(mut self, dir: Option<PathBuf>) -> Self {
        self.preferred_dir = dir;
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: HistoryStore) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub const fn with_remedial_delay(mut self, delay: Duration) -> Self {
        self.remedial_delay = delay;
        self
    }

    pub const fn gate(&self) -> &PermissionGate<P> {
        &self.gate
    }

    pub fn capturer_name(&self) -> &'static str {
        self.capturer.name()
    }

    // === Capture ===

    /// Capture one screenshot into the history.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::Capture`] if the capture fails. Missing
    /// permission is not an error; see [`CaptureOutcome::PermissionRequested`].
    pub async fn capture(&mut self) -> Result<CaptureOutcome> {
        self.capture_with(None).await
    }

    /// [`App::capture`] that can be cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::Capture`] if the capture fails or is cancelled.
    pub async fn capture_with(&mut self, cancel: Option<Cancellation>) -> Result<CaptureOutcome> {
        if !self.gate.is_permitted() {
            self.begin_remedial_flow();
            return Ok(CaptureOutcome::PermissionRequested);
        }

        debug!(capturer = self.capturer.name(), "Capturing screenshot");
        let image = self.capturer.capture_once(cancel).await?;
        let summary = image.summary();
        self.history.push(image);
        info!(id = %summary.id, width = summary.width, height = summary.height, "Screenshot captured");
        Ok(CaptureOutcome::Captured(summary))
    }

    fn begin_remedial_flow(&self) {
        info!("Screen recording not permitted");
        self.gate.request_permission();

        let gate = self.gate.clone();
        let delay = self.remedial_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            gate.open_system_privacy_panel();
        });
    }

    // === History ===

    pub const fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn subscribe(&self) -> watch::Receiver<HistorySnapshot> {
        self.history.subscribe()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Look up a history item.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::HistoryEmpty`], [`SnapError::HistoryItemNotFound`]
    /// or [`SnapError::HistoryIdNotFound`] if there is no such item.
    pub fn item(&self, item: impl Into<HistoryRef>) -> Result<&CapturedImage> {
        if self.history.is_empty() {
            return Err(SnapError::HistoryEmpty);
        }
        let len = self.history.len();
        match item.into() {
            HistoryRef::Index(index) => self
                .history
                .get(index)
                .ok_or(SnapError::HistoryItemNotFound { index, len }),
            HistoryRef::Id(id) => self.history.find(id).ok_or(SnapError::HistoryIdNotFound(id)),
        }
    }

    // === Saving ===

    pub fn preferred_save_directory(&self) -> Option<&Path> {
        self.preferred_dir.as_deref()
    }

    /// Where quick-saves go: the preferred directory, else the default.
    pub fn save_directory(&self) -> PathBuf {
        self.preferred_dir
            .clone()
            .unwrap_or_else(export::default_save_directory)
    }

    /// Make `dir` the preferred save directory, creating it.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::SaveDirectory`] if it cannot be created; the
    /// previous choice is kept.
    pub fn choose_save_folder(&mut self, dir: impl Into<PathBuf>) -> Result<()> {
        let dir = dir.into();
        export::ensure_directory(&dir)?;
        info!(path = %dir.display(), "Save folder chosen");
        self.preferred_dir = Some(dir);
        Ok(())
    }

    /// Write a history item to `path`, adding `.png` when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the item does not exist or the file cannot be
    /// written.
    pub fn save(&self, item: impl Into<HistoryRef>, path: &Path) -> Result<PathBuf> {
        let image = self.item(item)?;
        let path = export::with_png_extension(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            export::ensure_directory(parent)?;
        }
        export::write_png(image, &path)?;
        Ok(path)
    }

    /// Write a history item into the save directory under its default name.
    ///
    /// # Errors
    ///
    /// Returns an error if the item does not exist, the directory cannot be
    /// created, or the file cannot be written.
    pub fn quick_save(&self, item: impl Into<HistoryRef>) -> Result<PathBuf> {
        let image = self.item(item)?;
        export::save_to_directory(image, &self.save_directory())
    }
}
