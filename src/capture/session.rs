//! Single-frame acquisition on top of a [`StreamBackend`].
//!
//! A session starts a stream, waits for whichever of frame, stream error,
//! timeout or cancellation comes first, stops the stream, and returns. The
//! first signal is chosen by a compare-and-swap on the session state word;
//! every later signal is dropped. Teardown runs once, in the awaiting task,
//! before the result is handed back.

use std::future::pending;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tracing::{debug, trace, warn};

use super::backend::{
    CaptureRect, ContentFilter, FrameSink, StreamBackend, StreamConfig, StreamHandle,
};
use super::frame::{CapturedImage, FrameBuffer, PixelFormat};
use super::{CaptureFuture, ScreenCapturer};
use crate::config::{CaptureSettings, DEFAULT_TIMEOUT_SECS};
use crate::error::CaptureError;

/// Per-capture knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Deadline for the first frame, armed when the stream starts.
    pub timeout: Duration,
    pub show_cursor: bool,
    /// Leave this process's own windows out of the capture.
    pub exclude_own_windows: bool,
    /// Capture only this region of the display.
    pub capture_rect: Option<CaptureRect>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            show_cursor: false,
            exclude_own_windows: true,
            capture_rect: None,
        }
    }
}

impl From<&CaptureSettings> for CaptureOptions {
    fn from(settings: &CaptureSettings) -> Self {
        Self {
            timeout: settings.timeout(),
            show_cursor: settings.show_cursor,
            exclude_own_windows: settings.exclude_own_windows,
            capture_rect: None,
        }
    }
}

/// Lifecycle of one capture attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Starting = 1,
    Streaming = 2,
    /// A frame won; teardown is pending.
    Delivering = 3,
    Done = 4,
}

impl SessionState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Starting,
            2 => Self::Streaming,
            3 => Self::Delivering,
            _ => Self::Done,
        }
    }

    /// A signal has already been accepted.
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Delivering | Self::Done)
    }
}

/// Sources racing to finish a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Frame,
    StreamError,
    StartFailed,
    Timeout,
    Cancelled,
}

type Outcome = Result<CapturedImage, CaptureError>;

/// One-shot completion guard shared between the session and its receiver.
#[derive(Debug)]
pub struct Completion {
    state: AtomicU8,
    slot: Mutex<Option<Outcome>>,
    ready: Notify,
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

impl Completion {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Idle as u8),
            slot: Mutex::new(None),
            ready: Notify::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move `from -> to` if still in `from`.
    fn advance(&self, from: SessionState, to: SessionState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Offer an outcome. Returns true for the one caller that wins; the
    /// outcome of every other caller is dropped.
    pub fn try_complete(&self, signal: Signal, outcome: Outcome) -> bool {
        let target = if outcome.is_ok() {
            SessionState::Delivering
        } else {
            SessionState::Done
        };

        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if SessionState::from_u8(current).is_settled() {
                trace!(?signal, "Discarding signal after completion");
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                target as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        debug!(?signal, from = ?SessionState::from_u8(current), to = ?target, "Capture signal accepted");
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
        self.ready.notify_one();
        true
    }

    /// Take the winning outcome, if it has been stored yet.
    pub fn take(&self) -> Option<Outcome> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn finish(&self) {
        self.state.store(SessionState::Done as u8, Ordering::Release);
    }
}

/// Receiver installed on the stream. Accepts one frame, then detaches.
struct FrameReceiver {
    completion: Arc<Completion>,
    detached: AtomicBool,
}

impl FrameSink for FrameReceiver {
    fn on_frame(&self, frame: FrameBuffer) -> ControlFlow<()> {
        // Detach first so a second frame can never signal.
        if self.detached.swap(true, Ordering::AcqRel) {
            trace!("Frame after detach ignored");
            return ControlFlow::Break(());
        }

        let outcome = frame.to_rgba_image().map(CapturedImage::new);
        let signal = if outcome.is_ok() {
            Signal::Frame
        } else {
            Signal::StreamError
        };
        self.completion.try_complete(signal, outcome);
        ControlFlow::Break(())
    }

    fn on_error(&self, reason: String) {
        warn!(%reason, "Capture stream reported an error");
        self.completion
            .try_complete(Signal::StreamError, Err(CaptureError::StreamError(reason)));
    }
}

/// Cancels an in-flight capture. Dropping it without firing cancels nothing.
#[derive(Debug)]
pub struct CancelTrigger {
    tx: watch::Sender<bool>,
}

impl CancelTrigger {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Cancellation input for a capture.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    pub fn new() -> (Self, CancelTrigger) {
        let (tx, rx) = watch::channel(false);
        (Self { rx }, CancelTrigger { tx })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the trigger fires; never if it is dropped unfired.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|fired| *fired).await.is_err() {
            pending::<()>().await;
        }
    }
}

async fn wait_cancelled(cancel: Option<&mut Cancellation>) {
    match cancel {
        Some(cancel) => cancel.cancelled().await,
        None => pending().await,
    }
}

/// One capture attempt against a backend.
pub struct CaptureSession<'b, B: StreamBackend + ?Sized> {
    backend: &'b B,
    options: CaptureOptions,
    completion: Arc<Completion>,
    stream: Option<Box<dyn StreamHandle>>,
}

impl<'b, B: StreamBackend + ?Sized> CaptureSession<'b, B> {
    pub fn new(backend: &'b B, options: CaptureOptions) -> Self {
        Self {
            backend,
            options,
            completion: Arc::new(Completion::new()),
            stream: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.completion.state()
    }

    /// Acquire one frame. The stream, if any was started, is stopped before
    /// this returns, whatever the outcome.
    pub async fn run(&mut self, cancel: Option<Cancellation>) -> Result<CapturedImage, CaptureError> {
        let result = self.acquire(cancel).await;
        self.teardown();
        self.completion.finish();

        match &result {
            Ok(image) => debug!(id = %image.id(), width = image.width(), height = image.height(), "Capture delivered"),
            Err(e) => debug!(error = %e, "Capture failed"),
        }
        result
    }

    async fn acquire(&mut self, mut cancel: Option<Cancellation>) -> Result<CapturedImage, CaptureError> {
        if !self.completion.advance(SessionState::Idle, SessionState::Starting) {
            return Err(CaptureError::StartFailed(
                "capture session already used".to_string(),
            ));
        }

        let content = self.backend.shareable_content()?;
        let display = content
            .primary_display()
            .cloned()
            .ok_or(CaptureError::NoDisplay)?;

        let excluded_windows = if self.options.exclude_own_windows {
            content.windows_owned_by(std::process::id())
        } else {
            Vec::new()
        };

        let (width, height) = match self.options.capture_rect {
            Some(rect) if rect.fits(&display) => (rect.width, rect.height),
            Some(rect) => {
                return Err(CaptureError::StartFailed(format!(
                    "capture rectangle {rect:?} outside {}x{} display",
                    display.width, display.height
                )));
            }
            None => (display.width, display.height),
        };

        let display_id = display.id;
        debug!(
            backend = self.backend.name(),
            display_id,
            width,
            height,
            excluded = excluded_windows.len(),
            "Starting capture stream"
        );

        let filter = ContentFilter {
            display,
            excluded_windows,
        };
        let config = StreamConfig {
            width,
            height,
            pixel_format: PixelFormat::Bgra8,
            shows_cursor: self.options.show_cursor,
            source_rect: self.options.capture_rect,
        };

        let receiver = Arc::new(FrameReceiver {
            completion: Arc::clone(&self.completion),
            detached: AtomicBool::new(false),
        });
        let sink: Arc<dyn FrameSink> = receiver;

        let timeout = self.options.timeout;
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        match self.backend.start_stream(&filter, &config, sink) {
            Ok(handle) => {
                self.stream = Some(handle);
                self.completion
                    .advance(SessionState::Starting, SessionState::Streaming);
            }
            Err(e) => {
                let e = match e {
                    CaptureError::StartFailed(_) => e,
                    other => CaptureError::StartFailed(other.to_string()),
                };
                self.completion.try_complete(Signal::StartFailed, Err(e));
            }
        }

        let mut timed_out = false;
        let mut cancelled = false;
        loop {
            if let Some(outcome) = self.completion.take() {
                return outcome;
            }

            tokio::select! {
                () = self.completion.ready.notified() => {}
                () = &mut deadline, if !timed_out => {
                    timed_out = true;
                    self.completion.try_complete(Signal::Timeout, Err(CaptureError::Timeout(timeout)));
                }
                () = wait_cancelled(cancel.as_mut()), if !cancelled => {
                    cancelled = true;
                    self.completion.try_complete(Signal::Cancelled, Err(CaptureError::Cancelled));
                }
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("Capture stream stopped");
        }
    }
}

/// [`ScreenCapturer`] that runs one [`CaptureSession`] per capture.
pub struct StreamingCapturer<B> {
    backend: B,
    options: CaptureOptions,
}

impl<B: StreamBackend> StreamingCapturer<B> {
    pub const fn new(backend: B, options: CaptureOptions) -> Self {
        Self { backend, options }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn options(&self) -> &CaptureOptions {
        &self.options
    }
}

impl<B: StreamBackend> ScreenCapturer for StreamingCapturer<B> {
    fn name(&self) -> &'static str {
        self.backend.name()
    }

    fn capture_once(&self, cancel: Option<Cancellation>) -> CaptureFuture<'_> {
        Box::pin(async move {
            CaptureSession::new(&self.backend, self.options.clone())
                .run(cancel)
                .await
        })
    }
}
