//! Durable record of handled items and the failure policy around it.
//!
//! [`DedupTracker`] is constructed once at startup and passed by `&mut` to the
//! polling loop. Each item is either eligible or processed, and the transition
//! is one-way.

mod classify;
mod store;

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub use classify::{FailureClassification, classify};
use store::{LineStore, ProcessedItemSet};

/// Tracks which items the bot must never act on again.
#[derive(Debug)]
pub struct DedupTracker {
    store: LineStore,
    processed: ProcessedItemSet,
}

impl DedupTracker {
    /// Load the tracker from the store at `path`.
    ///
    /// A missing file yields an empty set. Read errors also yield an empty set
    /// so the bot keeps running, at the cost of possible duplicate replies.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::try_load(&path) {
            Ok(tracker) => tracker,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read processed-item store, starting empty"
                );
                Self {
                    store: LineStore::new(path),
                    processed: ProcessedItemSet::new(),
                }
            }
        }
    }

    /// Load the tracker, returning read errors instead of starting empty.
    pub fn try_load(path: impl Into<PathBuf>) -> io::Result<Self> {
        let store = LineStore::new(path);
        let processed = store.read_all()?;
        debug!(count = processed.len(), "loaded processed items");
        Ok(Self { store, processed })
    }

    pub fn is_processed(&self, id: &str) -> bool {
        self.processed.contains(id)
    }

    /// Record `id` as processed, in memory and in the durable store.
    ///
    /// Calling this twice for the same id is harmless. A failed write is logged
    /// and ignored; the item stays processed for the rest of this run.
    pub fn mark_processed(&mut self, id: &str) {
        if let Err(e) = self.try_mark_processed(id) {
            warn!(
                id,
                path = %self.store.path().display(),
                error = %e,
                "failed to persist processed item"
            );
            self.processed.insert(id);
        }
    }

    /// Like [`mark_processed`](Self::mark_processed), but surfaces the write
    /// error. The in-memory set only changes when the append succeeded.
    pub fn try_mark_processed(&mut self, id: &str) -> io::Result<()> {
        self.store.append(id)?;
        self.processed.insert(id);
        Ok(())
    }

    /// Classify an error signal reported by a remote action.
    pub fn classify(signal: &str) -> FailureClassification {
        classify(signal)
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }
}
