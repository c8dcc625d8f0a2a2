//! Native capture over the `xcap` crate.
//!
//! xcap offers blocking whole-monitor grabs. The streaming side is a
//! [`Relay`] grabbing the chosen monitor on an interval. Window
//! exclusion is logged but not applied; xcap grabs composite the whole
//! monitor.

use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use image::imageops;
use tracing::debug;
use xcap::{Monitor, Window};

use super::backend::{
    CaptureRect, ContentFilter, DisplayInfo, FrameSink, ShareableContent, StreamBackend,
    StreamConfig, StreamHandle, WindowInfo,
};
use super::relay::Relay;
use super::snapshot::SnapshotSource;
use crate::error::CaptureError;

/// Interval between relay grabs.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// System capture via xcap.
#[derive(Debug, Clone, Copy, Default)]
pub struct XcapBackend;

fn monitors() -> Result<Vec<Monitor>, CaptureError> {
    Monitor::all().map_err(|e| CaptureError::StreamError(format!("failed to enumerate monitors: {e}")))
}

fn display_info(monitor: &Monitor) -> Option<DisplayInfo> {
    Some(DisplayInfo {
        id: monitor.id().ok()?,
        width: monitor.width().ok()?,
        height: monitor.height().ok()?,
        is_primary: monitor.is_primary().unwrap_or(false),
    })
}

fn find_monitor(id: u32) -> Result<Monitor, CaptureError> {
    monitors()?
        .into_iter()
        .find(|m| m.id().ok() == Some(id))
        .ok_or(CaptureError::NoDisplay)
}

fn grab(monitor: &Monitor, rect: Option<CaptureRect>) -> Result<RgbaImage, String> {
    let image = monitor.capture_image().map_err(|e| e.to_string())?;
    Ok(match rect {
        Some(r) => imageops::crop_imm(&image, r.x, r.y, r.width, r.height).to_image(),
        None => image,
    })
}

impl StreamBackend for XcapBackend {
    fn name(&self) -> &'static str {
        "xcap-stream"
    }

    fn shareable_content(&self) -> Result<ShareableContent, CaptureError> {
        let displays = monitors()?.iter().filter_map(display_info).collect();
        let windows = Window::all()
            .map(|all| {
                all.iter()
                    .filter_map(|w| {
                        Some(WindowInfo {
                            id: w.id().ok()?,
                            owner_pid: w.pid().ok()?,
                            title: w.title().unwrap_or_default(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_else(|e| {
                debug!(error = %e, "Window enumeration unavailable");
                Vec::new()
            });
        Ok(ShareableContent { displays, windows })
    }

    fn start_stream(
        &self,
        filter: &ContentFilter,
        config: &StreamConfig,
        sink: Arc<dyn FrameSink>,
    ) -> Result<Box<dyn StreamHandle>, CaptureError> {
        let display_id = filter.display.id;
        find_monitor(display_id)?;
        if !filter.excluded_windows.is_empty() {
            debug!(
                count = filter.excluded_windows.len(),
                "Window exclusion not supported by xcap; capturing full monitor"
            );
        }
        if config.shows_cursor {
            debug!("Cursor capture not configurable with xcap");
        }

        let rect = config.source_rect;
        let relay = Relay::spawn(
            "snapshelf-relay",
            FRAME_INTERVAL,
            move || {
                // Monitor handles stay on the thread that uses them.
                let monitor = find_monitor(display_id).map_err(|e| e.to_string())?;
                Ok(move || grab(&monitor, rect))
            },
            sink,
        )?;
        Ok(Box::new(relay))
    }
}

impl SnapshotSource for XcapBackend {
    fn name(&self) -> &'static str {
        "xcap-snapshot"
    }

    fn snapshot_primary(&self) -> Result<RgbaImage, CaptureError> {
        let all = monitors()?;
        let primary = all
            .iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .or_else(|| all.first())
            .ok_or(CaptureError::NoDisplay)?;

        primary
            .capture_image()
            .map_err(|e| CaptureError::StreamError(format!("screen capture failed: {e}")))
    }
}
