//! Streaming capture backend interface.
//!
//! This is the shape of an OS screen-capture service: enumerate targets,
//! build a filter and a stream configuration, start a stream that calls a
//! [`FrameSink`] from its own execution context, and stop it.

use std::ops::ControlFlow;
use std::sync::Arc;

use serde::Serialize;

use super::frame::{FrameBuffer, PixelFormat};
use crate::error::CaptureError;

/// A display that can be captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayInfo {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
}

/// An on-screen window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowInfo {
    pub id: u32,
    pub owner_pid: u32,
    pub title: String,
}

/// Everything currently capturable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShareableContent {
    pub displays: Vec<DisplayInfo>,
    pub windows: Vec<WindowInfo>,
}

impl ShareableContent {
    /// The primary display, or the first one when none is flagged primary.
    pub fn primary_display(&self) -> Option<&DisplayInfo> {
        self.displays
            .iter()
            .find(|d| d.is_primary)
            .or_else(|| self.displays.first())
    }

    /// Windows owned by process `pid`.
    pub fn windows_owned_by(&self, pid: u32) -> Vec<WindowInfo> {
        self.windows
            .iter()
            .filter(|w| w.owner_pid == pid)
            .cloned()
            .collect()
    }
}

/// Region of a display in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRect {
    /// Non-empty and fully inside `display`.
    pub fn fits(&self, display: &DisplayInfo) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= display.width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= display.height)
    }
}

/// What to capture: one display minus some windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFilter {
    pub display: DisplayInfo,
    pub excluded_windows: Vec<WindowInfo>,
}

/// How to capture it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    pub shows_cursor: bool,
    pub source_rect: Option<CaptureRect>,
}

/// Receiver a backend calls from its delivery context.
pub trait FrameSink: Send + Sync {
    /// A frame arrived. `Break` means the sink has deregistered and must
    /// not be called again.
    fn on_frame(&self, frame: FrameBuffer) -> ControlFlow<()>;

    /// The stream failed.
    fn on_error(&self, reason: String);
}

/// A running stream.
pub trait StreamHandle: Send {
    /// Stop delivery and release the stream. Called exactly once.
    fn stop(&mut self);
}

/// OS streaming capture service.
pub trait StreamBackend: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &'static str;

    /// Whether streaming is actually available on this system.
    fn supports_streaming(&self) -> bool {
        true
    }

    /// Enumerate displays and windows.
    fn shareable_content(&self) -> Result<ShareableContent, CaptureError>;

    /// Start a stream. Frames and errors go to `sink`, possibly before this
    /// returns.
    fn start_stream(
        &self,
        filter: &ContentFilter,
        config: &StreamConfig,
        sink: Arc<dyn FrameSink>,
    ) -> Result<Box<dyn StreamHandle>, CaptureError>;
}
