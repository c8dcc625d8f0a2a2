//! Mock capture backend for unit testing and hardware-free runs.
//!
//! This module provides a scripted streaming backend that records every
//! call and supports assertions.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use snapshelf::capture::mock::{MockBackend, Operation, StreamScript};
//! use snapshelf::capture::{CaptureOptions, CaptureSession};
//!
//! let mock = MockBackend::new().with_script(StreamScript::FrameAfter(Duration::from_millis(50)));
//! let image = CaptureSession::new(&mock, CaptureOptions::default()).run(None).await?;
//!
//! assert_eq!(mock.stop_count(), 1);
//! mock.assert_contains(&Operation::FrameDelivered);
//! ```

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use image::RgbaImage;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::backend::{
    ContentFilter, DisplayInfo, FrameSink, ShareableContent, StreamBackend, StreamConfig,
    StreamHandle, WindowInfo,
};
use super::frame::{FrameBuffer, PixelFormat};
use super::snapshot::SnapshotSource;
use crate::error::CaptureError;

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ShareableContent,
    StartStream {
        display_id: u32,
        excluded_windows: Vec<u32>,
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        shows_cursor: bool,
    },
    /// A frame was handed to the sink.
    FrameDelivered,
    /// The sink answered `Break`; no more frames go to it.
    SinkDetached,
    ErrorDelivered(String),
    StopStream,
    Snapshot,
}

/// What a started stream does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamScript {
    /// One frame after the delay.
    FrameAfter(Duration),
    /// A frame every interval until the sink detaches or the stream stops.
    FramesEvery(Duration),
    /// A stream error after the delay.
    ErrorAfter(Duration, String),
    /// After the delay, a frame immediately followed by an error.
    FrameThenError(Duration),
    /// After the delay, two frames back to back, ignoring `Break`.
    DuplicateFrames(Duration),
    /// A frame delivered synchronously inside `start_stream`.
    FrameDuringStart,
    /// Nothing, ever.
    Silent,
    /// `start_stream` fails with this reason.
    FailStart(String),
}

#[derive(Debug, Default)]
struct Shared {
    operations: Mutex<Vec<Operation>>,
}

impl Shared {
    fn record(&self, op: Operation) {
        trace!(?op, "Recording operation");
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(op);
    }
}

/// Scripted capture backend.
///
/// Clones share the operation log, so a test can keep one handle while a
/// capturer owns another.
#[derive(Debug, Clone)]
pub struct MockBackend {
    content: ShareableContent,
    content_error: Option<CaptureError>,
    script: StreamScript,
    streaming: bool,
    shared: Arc<Shared>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// One small primary display, one window owned by this process, a
    /// frame after 10ms.
    #[must_use]
    pub fn new() -> Self {
        debug!("Creating mock capture backend");
        Self {
            content: ShareableContent {
                displays: vec![DisplayInfo {
                    id: 1,
                    width: 64,
                    height: 40,
                    is_primary: true,
                }],
                windows: vec![
                    WindowInfo {
                        id: 100,
                        owner_pid: std::process::id(),
                        title: "snapshelf".to_string(),
                    },
                    WindowInfo {
                        id: 200,
                        owner_pid: std::process::id().wrapping_add(1),
                        title: "Editor".to_string(),
                    },
                ],
            },
            content_error: None,
            script: StreamScript::FrameAfter(Duration::from_millis(10)),
            streaming: true,
            shared: Arc::default(),
        }
    }

    /// Backend used by `--backend mock`: a 320x200 display.
    #[must_use]
    pub fn demo() -> Self {
        Self::new().with_displays(vec![DisplayInfo {
            id: 1,
            width: 320,
            height: 200,
            is_primary: true,
        }])
    }

    // === Configuration ===

    #[must_use]
    pub fn with_script(mut self, script: StreamScript) -> Self {
        self.script = script;
        self
    }

    #[must_use]
    pub fn with_displays(mut self, displays: Vec<DisplayInfo>) -> Self {
        self.content.displays = displays;
        self
    }

    #[must_use]
    pub fn with_windows(mut self, windows: Vec<WindowInfo>) -> Self {
        self.content.windows = windows;
        self
    }

    #[must_use]
    pub fn without_displays(self) -> Self {
        self.with_displays(Vec::new())
    }

    /// Make content enumeration fail.
    #[must_use]
    pub fn with_content_error(mut self, error: CaptureError) -> Self {
        self.content_error = Some(error);
        self
    }

    /// Report that streaming is unsupported, so `Auto` picks snapshots.
    #[must_use]
    pub fn without_streaming(mut self) -> Self {
        self.streaming = false;
        self
    }

    // === Assertions ===

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.shared
            .operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded operations equal to `op`.
    #[must_use]
    pub fn count(&self, op: &Operation) -> usize {
        self.operations().iter().filter(|o| *o == op).count()
    }

    #[must_use]
    pub fn start_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|o| matches!(o, Operation::StartStream { .. }))
            .count()
    }

    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.count(&Operation::StopStream)
    }

    /// Assert specific operations were performed, in order.
    ///
    /// # Panics
    ///
    /// Panics if the operations don't match.
    pub fn assert_operations(&self, expected: &[Operation]) {
        let actual = self.operations();
        assert_eq!(
            actual, expected,
            "Operation mismatch.\nExpected: {expected:#?}\nActual: {actual:#?}",
        );
    }

    /// Assert a specific operation was performed at least once.
    ///
    /// # Panics
    ///
    /// Panics if the operation was not found.
    pub fn assert_contains(&self, expected: &Operation) {
        let ops = self.operations();
        assert!(
            ops.contains(expected),
            "Expected operation {expected:?} not found in: {ops:#?}",
        );
    }

    /// Assert every started stream was stopped exactly once.
    ///
    /// # Panics
    ///
    /// Panics on a leaked or double-stopped stream.
    pub fn assert_streams_released(&self) {
        assert_eq!(
            self.start_count(),
            self.stop_count(),
            "Stream start/stop mismatch: {:#?}",
            self.operations()
        );
    }

    /// Clear the operation log for fresh assertions.
    pub fn clear_operations(&self) {
        self.shared
            .operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    // === Internal Helpers ===

    fn record_op(&self, op: Operation) {
        self.shared.record(op);
    }
}

/// Synthetic BGRA frame: a horizontal gradient.
fn synthetic_frame(width: u32, height: u32) -> FrameBuffer {
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for _y in 0..height {
        for x in 0..width {
            let shade = u8::try_from(x * 255 / width.max(1)).unwrap_or(u8::MAX);
            data.extend_from_slice(&[shade, 0x80, 0xff - shade, 0xff]);
        }
    }
    FrameBuffer::packed(width, height, PixelFormat::Bgra8, data)
}

struct Delivery {
    shared: Arc<Shared>,
    sink: Arc<dyn FrameSink>,
    stopped: Arc<AtomicBool>,
    width: u32,
    height: u32,
}

impl Delivery {
    fn live(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    fn frame(&self) -> ControlFlow<()> {
        self.shared.record(Operation::FrameDelivered);
        let flow = self.sink.on_frame(synthetic_frame(self.width, self.height));
        if flow.is_break() {
            self.shared.record(Operation::SinkDetached);
        }
        flow
    }

    fn error(&self, reason: String) {
        self.shared.record(Operation::ErrorDelivered(reason.clone()));
        self.sink.on_error(reason);
    }

    async fn play(self, script: StreamScript) {
        match script {
            StreamScript::FrameAfter(delay) => {
                tokio::time::sleep(delay).await;
                if self.live() {
                    let _ = self.frame();
                }
            }
            StreamScript::FramesEvery(interval) => loop {
                tokio::time::sleep(interval).await;
                if !self.live() || self.frame().is_break() {
                    break;
                }
            },
            StreamScript::ErrorAfter(delay, reason) => {
                tokio::time::sleep(delay).await;
                if self.live() {
                    self.error(reason);
                }
            }
            StreamScript::FrameThenError(delay) => {
                tokio::time::sleep(delay).await;
                if self.live() {
                    let _ = self.frame();
                    self.error("stream interrupted".to_string());
                }
            }
            StreamScript::DuplicateFrames(delay) => {
                tokio::time::sleep(delay).await;
                if self.live() {
                    let _ = self.frame();
                    let _ = self.frame();
                }
            }
            StreamScript::FrameDuringStart | StreamScript::Silent | StreamScript::FailStart(_) => {}
        }
    }
}

/// Handle for a mock stream; stopping aborts its delivery task.
struct MockStream {
    shared: Arc<Shared>,
    stopped: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl StreamHandle for MockStream {
    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.shared.record(Operation::StopStream);
    }
}

impl StreamBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock-stream"
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }

    fn shareable_content(&self) -> Result<ShareableContent, CaptureError> {
        self.record_op(Operation::ShareableContent);
        if let Some(error) = &self.content_error {
            return Err(error.clone());
        }
        Ok(self.content.clone())
    }

    fn start_stream(
        &self,
        filter: &ContentFilter,
        config: &StreamConfig,
        sink: Arc<dyn FrameSink>,
    ) -> Result<Box<dyn StreamHandle>, CaptureError> {
        self.record_op(Operation::StartStream {
            display_id: filter.display.id,
            excluded_windows: filter.excluded_windows.iter().map(|w| w.id).collect(),
            width: config.width,
            height: config.height,
            pixel_format: config.pixel_format,
            shows_cursor: config.shows_cursor,
        });

        if let StreamScript::FailStart(reason) = &self.script {
            return Err(CaptureError::StartFailed(reason.clone()));
        }

        let stopped = Arc::new(AtomicBool::new(false));
        let delivery = Delivery {
            shared: Arc::clone(&self.shared),
            sink,
            stopped: Arc::clone(&stopped),
            width: config.width,
            height: config.height,
        };

        let task = match &self.script {
            StreamScript::FrameDuringStart => {
                let _ = delivery.frame();
                None
            }
            StreamScript::Silent => None,
            script => {
                let runtime = Handle::try_current().map_err(|_| {
                    CaptureError::StartFailed("mock stream needs a tokio runtime".to_string())
                })?;
                Some(runtime.spawn(delivery.play(script.clone())))
            }
        };

        Ok(Box::new(MockStream {
            shared: Arc::clone(&self.shared),
            stopped,
            task,
        }))
    }
}

impl SnapshotSource for MockBackend {
    fn name(&self) -> &'static str {
        "mock-snapshot"
    }

    fn snapshot_primary(&self) -> Result<RgbaImage, CaptureError> {
        self.record_op(Operation::Snapshot);
        if let Some(error) = &self.content_error {
            return Err(error.clone());
        }
        let display = self
            .content
            .primary_display()
            .ok_or(CaptureError::NoDisplay)?;
        synthetic_frame(display.width, display.height).to_rgba_image()
    }
}
