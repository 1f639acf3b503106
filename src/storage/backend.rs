//! Persistence store trait definition
//!
//! This module defines the `PersistenceStore` trait that every
//! registry store implements.

use async_trait::async_trait;

use super::error::StorageResult;
use crate::registry::Target;

/// Trait for durable registry storage
///
/// The registry is always written as one whole document. There is no
/// incremental or append format: `save` replaces whatever was stored before.
///
/// ## Error Handling
///
/// Both operations are best-effort from the caller's point of view. The
/// registry logs `StorageError`s and keeps its in-memory state, so a failing
/// store only risks losing state across restarts.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared between the
/// scheduler task, API handlers and the command loop.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Load the stored collection
    ///
    /// Returns `Ok(None)` when no prior state exists (e.g. first start).
    async fn load(&self) -> StorageResult<Option<Vec<Target>>>;

    /// Serialize the full ordered collection, overwriting prior content
    async fn save(&self, targets: &[Target]) -> StorageResult<()>;

    /// Human-readable description of where state lives (for logging)
    fn describe(&self) -> String;
}
