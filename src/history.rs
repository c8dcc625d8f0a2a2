//! Bounded, newest-first history of captured screenshots.
//!
//! The store has one writer. Readers either borrow it or subscribe to
//! immutable snapshots published on every change.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::capture::CapturedImage;

/// Maximum number of screenshots kept.
pub const DEFAULT_MAX_ITEMS: usize = 10;

/// Immutable view of the history at one revision.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    /// Incremented on every `push` and `clear`.
    pub revision: u64,
    pub items: Arc<[CapturedImage]>,
}

impl HistorySnapshot {
    fn empty() -> Self {
        Self {
            revision: 0,
            items: Arc::from(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Recent screenshots, newest first, never more than `max_items`.
#[derive(Debug)]
pub struct HistoryStore {
    items: Vec<CapturedImage>,
    max_items: usize,
    revision: u64,
    tx: watch::Sender<HistorySnapshot>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ITEMS)
    }

    /// Store bounded at `max_items` (at least 1).
    pub fn with_capacity(max_items: usize) -> Self {
        let max_items = max_items.max(1);
        let (tx, _rx) = watch::channel(HistorySnapshot::empty());
        Self {
            items: Vec::with_capacity(max_items + 1),
            max_items,
            revision: 0,
            tx,
        }
    }

    pub const fn max_items(&self) -> usize {
        self.max_items
    }

    /// Insert at the front, evicting the oldest items beyond the bound.
    pub fn push(&mut self, item: CapturedImage) {
        debug!(id = %item.id(), "Adding screenshot to history");
        self.items.insert(0, item);
        if self.items.len() > self.max_items {
            let evicted = self.items.len() - self.max_items;
            self.items.truncate(self.max_items);
            debug!(evicted, "Evicted oldest screenshots");
        }
        self.publish();
    }

    pub fn clear(&mut self) {
        debug!(count = self.items.len(), "Clearing history");
        self.items.clear();
        self.publish();
    }

    /// Items, newest first.
    pub fn items(&self) -> &[CapturedImage] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapturedImage> {
        self.items.iter()
    }

    /// Item at `index`, where 0 is the newest.
    pub fn get(&self, index: usize) -> Option<&CapturedImage> {
        self.items.get(index)
    }

    pub fn find(&self, id: Uuid) -> Option<&CapturedImage> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        self.tx.borrow().clone()
    }

    /// Receive a new snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<HistorySnapshot> {
        self.tx.subscribe()
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.tx.send_replace(HistorySnapshot {
            revision: self.revision,
            items: Arc::from(self.items.as_slice()),
        });
    }
}
