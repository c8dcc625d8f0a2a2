//! Captured frames and the images they become.

use std::sync::Arc;

use chrono::{DateTime, Local};
use image::RgbaImage;
use serde::Serialize;
use uuid::Uuid;

use crate::error::CaptureError;

/// Pixel layouts a stream can be configured for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PixelFormat {
    /// 32-bit, byte order B, G, R, A.
    #[default]
    Bgra8,
    /// 32-bit, byte order R, G, B, A.
    Rgba8,
}

/// Raw frame as delivered by a streaming backend.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    /// Row stride in bytes; may exceed `width * 4` when rows are padded.
    pub bytes_per_row: usize,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Tightly packed frame (`bytes_per_row == width * 4`).
    pub fn packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            bytes_per_row: width as usize * 4,
            format,
            data,
        }
    }

    /// Convert to an RGBA still image.
    pub fn to_rgba_image(&self) -> Result<RgbaImage, CaptureError> {
        let row_len = self.width as usize * 4;
        let height = self.height as usize;

        if self.width == 0 || self.height == 0 {
            return Err(malformed(format!("{}x{} frame", self.width, self.height)));
        }
        if self.bytes_per_row < row_len {
            return Err(malformed(format!(
                "stride {} shorter than row of {row_len} bytes",
                self.bytes_per_row
            )));
        }
        let needed = self.bytes_per_row * (height - 1) + row_len;
        if self.data.len() < needed {
            return Err(malformed(format!(
                "{} bytes for {}x{} at stride {}",
                self.data.len(),
                self.width,
                self.height,
                self.bytes_per_row
            )));
        }

        let mut rgba = Vec::with_capacity(row_len * height);
        for row in self.data.chunks(self.bytes_per_row).take(height) {
            let row = &row[..row_len];
            match self.format {
                PixelFormat::Rgba8 => rgba.extend_from_slice(row),
                PixelFormat::Bgra8 => {
                    for px in row.chunks_exact(4) {
                        rgba.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
                    }
                }
            }
        }

        RgbaImage::from_raw(self.width, self.height, rgba)
            .ok_or_else(|| malformed("pixel count mismatch".to_string()))
    }
}

fn malformed(detail: String) -> CaptureError {
    CaptureError::StreamError(format!("malformed frame: {detail}"))
}

/// One screenshot in the history.
///
/// The id is generated here and nowhere else. Clones share the pixel buffer.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    id: Uuid,
    pixels: Arc<RgbaImage>,
    captured_at: DateTime<Local>,
}

impl CapturedImage {
    /// Wrap freshly captured pixels, stamped now.
    pub fn new(pixels: RgbaImage) -> Self {
        Self::captured_at(pixels, Local::now())
    }

    /// Wrap pixels with an explicit capture time.
    pub fn captured_at(pixels: RgbaImage, captured_at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pixels: Arc::new(pixels),
            captured_at,
        }
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub const fn timestamp(&self) -> DateTime<Local> {
        self.captured_at
    }

    /// Serializable summary without pixel data.
    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            id: self.id,
            width: self.width(),
            height: self.height(),
            captured_at: self.captured_at,
        }
    }
}

impl PartialEq for CapturedImage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CapturedImage {}

/// Metadata of a [`CapturedImage`] for output.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub id: Uuid,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Local>,
}
