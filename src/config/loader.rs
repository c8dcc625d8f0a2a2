//! Loads [`Settings`] from TOML.

use std::path::Path;

use tracing::{debug, info};

use super::path::{default_config_file, resolve_path};
use super::schema::Settings;
use crate::error::{Result, ResultExt, SnapError};

/// Parse settings from TOML text; relative paths resolve against `base_dir`.
pub fn parse_settings(text: &str, base_dir: &Path) -> Result<Settings> {
    let mut settings: Settings =
        toml::from_str(text).map_err(|e| SnapError::ConfigParse(e.to_string()))?;

    if settings.capture.timeout_secs == 0 {
        return Err(SnapError::ConfigInvalid(
            "capture.timeout_secs must be greater than zero".to_string(),
        ));
    }

    if let Some(dir) = settings.save.directory.take() {
        settings.save.directory = Some(resolve_path(&dir, base_dir)?);
    }

    Ok(settings)
}

/// Load settings from an explicit file. A missing file is an error.
pub fn load_file(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Err(SnapError::ConfigNotFound {
            path: path.display().to_string(),
        });
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let settings = parse_settings(&text, base_dir)?;
    info!(path = %path.display(), "Loaded settings");
    Ok(settings)
}

/// Load settings from `explicit` if given, else the default config file when
/// it exists, else defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        return load_file(path);
    }

    match default_config_file() {
        Some(path) if path.exists() => load_file(&path),
        other => {
            debug!(candidate = ?other, "No settings file, using defaults");
            Ok(Settings::default())
        }
    }
}
