//! Configuration for capture behaviour and save locations.
//!
//! Settings come from a TOML file (`--config`, `SNAPSHELF_CONFIG`, or the
//! platform config directory) and fall back to built-in defaults.

mod loader;
mod path;
mod schema;

pub use loader::{load_file, load_settings, parse_settings};
pub use path::{
    APP_DIR_NAME, default_config_file, default_save_directory, expand_home, home_dir,
    resolve_path,
};
pub use schema::{BackendKind, CaptureSettings, DEFAULT_TIMEOUT_SECS, SaveSettings, Settings};
