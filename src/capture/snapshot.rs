//! Whole-screen snapshot capture for systems without a streaming API.

use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use tracing::{debug, warn};

use super::frame::CapturedImage;
use super::session::Cancellation;
use super::{CaptureFuture, ScreenCapturer};
use crate::error::CaptureError;

/// Blocking "grab the primary display now" call.
pub trait SnapshotSource: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn snapshot_primary(&self) -> Result<RgbaImage, CaptureError>;
}

/// [`ScreenCapturer`] over a [`SnapshotSource`], run on the blocking pool
/// under the same deadline as a streaming capture.
pub struct SnapshotCapturer<S> {
    source: Arc<S>,
    timeout: Duration,
}

impl<S: SnapshotSource> SnapshotCapturer<S> {
    pub fn new(source: S, timeout: Duration) -> Self {
        Self {
            source: Arc::new(source),
            timeout,
        }
    }
}

impl<S: SnapshotSource> ScreenCapturer for SnapshotCapturer<S> {
    fn name(&self) -> &'static str {
        self.source.name()
    }

    fn capture_once(&self, cancel: Option<Cancellation>) -> CaptureFuture<'_> {
        Box::pin(async move {
            let source = Arc::clone(&self.source);
            let task = tokio::task::spawn_blocking(move || source.snapshot_primary());
            let mut cancel = cancel;

            // A blocking grab that loses the race keeps running to completion
            // on the pool; its result is dropped.
            let result = tokio::select! {
                joined = task => match joined {
                    Ok(result) => result.map(CapturedImage::new),
                    Err(e) => Err(CaptureError::StreamError(format!("snapshot task failed: {e}"))),
                },
                () = tokio::time::sleep(self.timeout) => {
                    warn!(timeout = ?self.timeout, "Snapshot timed out");
                    Err(CaptureError::Timeout(self.timeout))
                }
                () = async {
                    match cancel.as_mut() {
                        Some(c) => c.cancelled().await,
                        None => std::future::pending().await,
                    }
                } => Err(CaptureError::Cancelled),
            };

            if let Ok(image) = &result {
                debug!(id = %image.id(), "Snapshot captured");
            }
            result
        })
    }
}
