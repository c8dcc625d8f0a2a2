//! Screen-recording authorization.
//!
//! [`PermissionGate`] wraps a [`PermissionBackend`] (the OS calls) and turns
//! every failure into a silent, logged no-op. When the OS cannot be asked,
//! the gate answers "permitted" so the user is never blocked by a missing
//! query mechanism; the capture itself then reports what actually happened.

pub mod mock;
mod system;

pub use mock::MockPermissions;
pub use system::SystemPermissions;

use tracing::{debug, info, warn};

/// Deep link into the macOS Screen Recording privacy pane.
pub const PRIVACY_PANEL_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_ScreenCapture";

/// OS-level permission calls.
pub trait PermissionBackend: Send + Sync {
    /// Current authorization without prompting. `None` when the query
    /// mechanism is unavailable on this system.
    fn preflight(&self) -> Option<bool>;

    /// Ask the OS to show its permission prompt. Fire-and-forget.
    fn request(&self);

    /// Launch a URL with the system handler.
    fn open_url(&self, url: &str) -> std::io::Result<()>;
}

/// Stateless front for a [`PermissionBackend`].
#[derive(Debug, Clone, Default)]
pub struct PermissionGate<B> {
    backend: B,
}

impl<B: PermissionBackend> PermissionGate<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether capture is authorized. Fails open.
    pub fn is_permitted(&self) -> bool {
        match self.backend.preflight() {
            Some(granted) => {
                debug!(granted, "Screen recording preflight");
                granted
            }
            None => {
                debug!("Screen recording preflight unavailable, assuming permitted");
                true
            }
        }
    }

    /// Fire the OS permission prompt. Safe to call repeatedly.
    pub fn request_permission(&self) {
        info!("Requesting screen recording permission");
        self.backend.request();
    }

    /// Open the system privacy settings at the screen recording pane.
    pub fn open_system_privacy_panel(&self) {
        self.open_privacy_panel_at(PRIVACY_PANEL_URL);
    }

    /// Open `url` as a settings deep link. Malformed links and launch
    /// failures are logged and ignored.
    pub fn open_privacy_panel_at(&self, url: &str) {
        if !is_deep_link(url) {
            warn!(url, "Ignoring malformed settings link");
            return;
        }

        if let Err(e) = self.backend.open_url(url) {
            warn!(url, error = %e, "Could not open system settings");
        }
    }
}

/// `scheme:target` with a well-formed scheme and a non-empty target.
fn is_deep_link(url: &str) -> bool {
    let Some((scheme, target)) = url.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    starts_alpha
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !target.trim().is_empty()
        && !url.chars().any(char::is_whitespace)
}
