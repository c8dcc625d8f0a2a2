//! Writing screenshots to disk as PNG.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::ImageFormat;
use tracing::{debug, info};

use crate::capture::CapturedImage;
use crate::error::{Result, SnapError};

pub use crate::config::default_save_directory;

/// Prefix of quick-save file names.
pub const FILE_PREFIX: &str = "Snapshelf_Screenshot_";

/// `Snapshelf_Screenshot_2026-10-18_09-30-00.png`
pub fn default_file_name(captured_at: DateTime<Local>) -> String {
    format!("{FILE_PREFIX}{}.png", captured_at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Append `.png` unless the path already ends in it (case-insensitive).
pub fn with_png_extension(path: &Path) -> PathBuf {
    let has_png = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if has_png {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(".png");
    PathBuf::from(name)
}

/// First of `name.png`, `name-2.png`, `name-3.png`, ... that does not exist.
///
/// Two captures in the same second get the same default name.
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = Path::new(file_name)
        .file_stem()
        .map_or_else(|| file_name.to_string(), |s| s.to_string_lossy().into_owned());
    (2u32..)
        .map(|n| dir.join(format!("{stem}-{n}.png")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Create `dir` and its parents if missing.
///
/// # Errors
///
/// Returns [`SnapError::SaveDirectory`] if the directory cannot be created
/// or the path exists and is not a directory.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    debug!(path = %dir.display(), "Creating save directory");
    fs::create_dir_all(dir).map_err(|e| SnapError::SaveDirectory {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;
    if !dir.is_dir() {
        return Err(SnapError::SaveDirectory {
            path: dir.display().to_string(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(())
}

/// Encode `image` as PNG at `path`.
///
/// # Errors
///
/// Returns [`SnapError::ImageEncoding`] if encoding or writing fails.
pub fn write_png(image: &CapturedImage, path: &Path) -> Result<()> {
    image
        .pixels()
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| SnapError::ImageEncoding(format!("{}: {e}", path.display())))?;
    info!(
        id = %image.id(),
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Screenshot saved"
    );
    Ok(())
}

/// Save into `dir` under the default name, creating `dir` on demand.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the PNG cannot
/// be written.
pub fn save_to_directory(image: &CapturedImage, dir: &Path) -> Result<PathBuf> {
    ensure_directory(dir)?;
    let path = unique_path(dir, &default_file_name(image.timestamp()));
    write_png(image, &path)?;
    Ok(path)
}
