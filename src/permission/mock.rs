//! Scripted permission backend for tests and the mock capture mode.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use super::PermissionBackend;

/// Permission backend with a fixed preflight answer.
///
/// Cloning shares the recorded calls, so a test can keep a handle while the
/// gate owns another.
#[derive(Debug, Clone)]
pub struct MockPermissions {
    answer: Option<bool>,
    inner: Arc<Recorded>,
}

#[derive(Debug, Default)]
struct Recorded {
    requests: AtomicUsize,
    opened: Mutex<Vec<String>>,
    fail_open: AtomicBool,
}

impl MockPermissions {
    fn with_answer(answer: Option<bool>) -> Self {
        Self {
            answer,
            inner: Arc::default(),
        }
    }

    #[must_use]
    pub fn granted() -> Self {
        Self::with_answer(Some(true))
    }

    #[must_use]
    pub fn denied() -> Self {
        Self::with_answer(Some(false))
    }

    /// Preflight mechanism missing.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::with_answer(None)
    }

    /// Make `open_url` return an error (still recorded).
    #[must_use]
    pub fn failing_open(self) -> Self {
        self.inner.fail_open.store(true, Ordering::SeqCst);
        self
    }

    pub fn request_count(&self) -> usize {
        self.inner.requests.load(Ordering::SeqCst)
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.inner
            .opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PermissionBackend for MockPermissions {
    fn preflight(&self) -> Option<bool> {
        self.answer
    }

    fn request(&self) {
        trace!("Mock permission request");
        self.inner.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn open_url(&self, url: &str) -> std::io::Result<()> {
        self.inner
            .opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        if self.inner.fail_open.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("mock open failure"));
        }
        Ok(())
    }
}
