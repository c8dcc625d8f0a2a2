//! Screen capture.
//!
//! Callers see one interface, [`ScreenCapturer::capture_once`]. Behind it is
//! either a streaming session ([`StreamingCapturer`]) or a legacy whole-screen
//! snapshot ([`SnapshotCapturer`]); [`select_capturer`] picks one at startup.

mod backend;
mod frame;
pub mod mock;
#[cfg(feature = "native")]
pub mod native;
pub mod relay;
mod session;
mod snapshot;

pub use backend::{
    CaptureRect, ContentFilter, DisplayInfo, FrameSink, ShareableContent, StreamBackend,
    StreamConfig, StreamHandle, WindowInfo,
};
pub use frame::{CapturedImage, FrameBuffer, ImageSummary, PixelFormat};
pub use session::{
    CancelTrigger, Cancellation, CaptureOptions, CaptureSession, Completion, SessionState, Signal,
    StreamingCapturer,
};
pub use snapshot::{SnapshotCapturer, SnapshotSource};

use std::future::Future;
use std::pin::Pin;

use tracing::info;

use crate::config::BackendKind;
use crate::error::CaptureError;

/// Boxed capture future, so capturers can live behind `dyn`.
pub type CaptureFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CapturedImage, CaptureError>> + Send + 'a>>;

/// Produces one still image of the primary display per call.
pub trait ScreenCapturer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Capture once. Suspends without blocking a thread; resolves exactly
    /// once, after all capture resources are released.
    fn capture_once(&self, cancel: Option<Cancellation>) -> CaptureFuture<'_>;
}

/// Build the capturer for `kind` over a backend that offers both strategies.
///
/// `Auto` and `Mock` stream when the backend supports it and fall back to
/// snapshots.
pub fn capturer_for<B>(kind: BackendKind, backend: B, options: CaptureOptions) -> Box<dyn ScreenCapturer>
where
    B: StreamBackend + SnapshotSource,
{
    let streaming = match kind {
        BackendKind::Stream => true,
        BackendKind::Snapshot => false,
        BackendKind::Auto | BackendKind::Mock => backend.supports_streaming(),
    };

    if streaming {
        info!(backend = StreamBackend::name(&backend), "Using streaming capture");
        Box::new(StreamingCapturer::new(backend, options))
    } else {
        info!(backend = SnapshotSource::name(&backend), "Using snapshot capture");
        Box::new(SnapshotCapturer::new(backend, options.timeout))
    }
}

/// Pick the capture implementation for this process.
pub fn select_capturer(
    kind: BackendKind,
    options: CaptureOptions,
) -> Result<Box<dyn ScreenCapturer>, CaptureError> {
    if kind == BackendKind::Mock {
        return Ok(capturer_for(kind, mock::MockBackend::demo(), options));
    }
    native_capturer(kind, options)
}

#[cfg(feature = "native")]
fn native_capturer(
    kind: BackendKind,
    options: CaptureOptions,
) -> Result<Box<dyn ScreenCapturer>, CaptureError> {
    Ok(capturer_for(kind, native::XcapBackend, options))
}

#[cfg(not(feature = "native"))]
fn native_capturer(
    _kind: BackendKind,
    _options: CaptureOptions,
) -> Result<Box<dyn ScreenCapturer>, CaptureError> {
    Err(CaptureError::BackendUnavailable(
        "built without the `native` feature".to_string(),
    ))
}
