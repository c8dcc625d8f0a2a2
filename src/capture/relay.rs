//! Polling stream over a blocking grab function.
//!
//! A relay thread grabs on an interval and hands each image to the sink
//! until the sink detaches, a grab fails, or the stream is stopped.
//! [`Relay::stop`] joins the thread, so once it returns the sink and the
//! grab source have been dropped.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use image::RgbaImage;
use tracing::{debug, warn};

use super::backend::{FrameSink, StreamHandle};
use super::frame::{FrameBuffer, PixelFormat};
use crate::error::CaptureError;

/// Running relay thread.
pub struct Relay {
    stopped: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Relay {
    /// Start relaying.
    ///
    /// `open` runs on the relay thread and builds the grab function there,
    /// so the source it captures never has to cross threads.
    pub fn spawn<O, G>(
        name: &str,
        interval: Duration,
        open: O,
        sink: Arc<dyn FrameSink>,
    ) -> Result<Self, CaptureError>
    where
        O: FnOnce() -> Result<G, String> + Send + 'static,
        G: FnMut() -> Result<RgbaImage, String>,
    {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);

        let thread = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || relay_loop(&flag, interval, open, sink.as_ref()))
            .map_err(|e| CaptureError::StartFailed(format!("failed to spawn relay: {e}")))?;

        Ok(Self {
            stopped,
            thread: Some(thread),
        })
    }
}

fn relay_loop<O, G>(flag: &AtomicBool, interval: Duration, open: O, sink: &dyn FrameSink)
where
    O: FnOnce() -> Result<G, String>,
    G: FnMut() -> Result<RgbaImage, String>,
{
    let mut grab = match open() {
        Ok(grab) => grab,
        Err(reason) => {
            sink.on_error(reason);
            return;
        }
    };

    while !flag.load(Ordering::SeqCst) {
        match grab() {
            Ok(image) => {
                let (width, height) = image.dimensions();
                let frame = FrameBuffer::packed(width, height, PixelFormat::Rgba8, image.into_raw());
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                if let ControlFlow::Break(()) = sink.on_frame(frame) {
                    break;
                }
            }
            Err(reason) => {
                warn!(%reason, "Relay grab failed");
                sink.on_error(reason);
                break;
            }
        }
        std::thread::sleep(interval);
    }
    debug!("Relay exiting");
}

impl StreamHandle for Relay {
    /// Blocks until the relay thread exits: at most one grab plus one interval.
    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Relay thread panicked");
            }
        }
    }
}
