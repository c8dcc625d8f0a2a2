//! Path resolution helpers for configuration and save locations.
//!
//! Supports absolute paths, paths relative to a base directory, and "~" home
//! directory expansion.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Result, SnapError};

/// Folder name used under the desktop for screenshots and under the
/// platform config directory for settings.
pub const APP_DIR_NAME: &str = "Snapshelf";

/// Resolve a path read from a config file.
///
/// Resolution rules:
/// 1. Paths starting with `~`: expanded to home directory
/// 2. Absolute paths: used as-is
/// 3. Relative paths: resolved relative to `base_dir`
pub fn resolve_path(path: &Path, base_dir: &Path) -> Result<PathBuf> {
    trace!(
        path = %path.display(),
        base_dir = %base_dir.display(),
        "Resolving path"
    );

    if let Some(expanded) = expand_home(path)? {
        debug!(
            original = %path.display(),
            resolved = %expanded.display(),
            "Expanded home directory path"
        );
        return Ok(expanded);
    }

    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let resolved = base_dir.join(path);
    debug!(
        original = %path.display(),
        resolved = %resolved.display(),
        "Resolved relative path"
    );
    Ok(resolved)
}

/// Expand a leading `~` or `~/`; `None` when the path does not start with one.
pub fn expand_home(path: &Path) -> Result<Option<PathBuf>> {
    let path_str = path.to_string_lossy();
    if path_str != "~" && !path_str.starts_with("~/") {
        return Ok(None);
    }

    let home = home_dir()?;
    let rest = path_str.strip_prefix("~/").unwrap_or("");
    Ok(Some(if rest.is_empty() { home } else { home.join(rest) }))
}

/// Resolve the user's home directory (cross-platform).
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| SnapError::ConfigInvalid("Could not determine home directory".to_string()))
}

/// Default location of the settings file, if the platform has a config dir.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME.to_lowercase()).join("config.toml"))
}

/// Directory quick-saves go to when none was chosen: `<Desktop>/Snapshelf`.
///
/// Falls back to `~/Desktop`, then to the working directory.
pub fn default_save_directory() -> PathBuf {
    let base = dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_DIR_NAME)
}
