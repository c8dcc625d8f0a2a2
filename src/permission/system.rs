//! Permission backend for the running desktop.
//!
//! The crate forbids `unsafe`, so the CoreGraphics preflight/request symbols
//! are not bound here; preflight reports "unavailable" and the gate fails
//! open. Opening settings goes through the platform URL launcher.

use std::process::{Child, Command, Stdio};

use tracing::{debug, info, warn};

use super::PermissionBackend;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPermissions;

impl SystemPermissions {
    /// Program that opens URLs on this platform.
    pub const fn launcher() -> &'static str {
        if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "explorer"
        } else {
            "xdg-open"
        }
    }
}

impl PermissionBackend for SystemPermissions {
    fn preflight(&self) -> Option<bool> {
        None
    }

    fn request(&self) {
        info!("Grant screen recording to this terminal in the system privacy settings");
    }

    fn open_url(&self, url: &str) -> std::io::Result<()> {
        let launcher = Self::launcher();
        debug!(launcher, url, "Launching URL");

        let child = Command::new(launcher)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        reap(child);
        Ok(())
    }
}

/// Wait for `child` on a detached thread so it never lingers as a zombie.
fn reap(mut child: Child) {
    let spawned = std::thread::Builder::new()
        .name("snapshelf-launcher".to_string())
        .spawn(move || match child.wait() {
            Ok(status) => debug!(%status, "URL launcher exited"),
            Err(e) => warn!(error = %e, "Could not wait for URL launcher"),
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Could not start launcher reaper");
    }
}
