//! In-memory persistence store (no durability)
//!
//! Useful for:
//! - Testing without touching the filesystem
//! - Running the bot with persistence disabled
//!
//! ## Limitations
//!
//! - **No persistence**: All state lost on restart

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;

use super::backend::PersistenceStore;
use super::error::{StorageError, StorageResult};
use crate::registry::Target;

/// In-memory store
///
/// Holds the last saved document and counts how many saves happened.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<Vec<Target>>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store (loads as "no prior state")
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a document
    pub fn with_targets(targets: Vec<Target>) -> Self {
        Self {
            document: Mutex::new(Some(targets)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last saved document
    pub fn snapshot(&self) -> Option<Vec<Target>> {
        self.document.lock().ok().and_then(|doc| doc.clone())
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn load(&self) -> StorageResult<Option<Vec<Target>>> {
        let document = self
            .document
            .lock()
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(document.clone())
    }

    async fn save(&self, targets: &[Target]) -> StorageResult<()> {
        let mut document = self
            .document
            .lock()
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        *document = Some(targets.to_vec());
        self.saves.fetch_add(1, Ordering::SeqCst);

        debug!("in-memory store: saved {} targets", targets.len());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory (no persistence)".to_string()
    }
}
