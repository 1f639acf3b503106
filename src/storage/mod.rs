//! Persistence stores for the target registry
//!
//! This module provides a trait-based abstraction for keeping the registry
//! across restarts.
//!
//! ## Design
//!
//! - **Trait-based**: `PersistenceStore` allows swapping implementations
//! - **Async**: All operations are async for compatibility with Tokio tasks
//! - **Whole-document**: Every save overwrites the previous state
//!
//! ## Stores
//!
//! - **JSON file** (default): one document at `DATA_FILE`
//! - **In-Memory**: No persistence, for testing or `--no-persist`
//!
//! ## Usage
//!
//! ```no_run
//! use server_status::storage::{PersistenceStore, json::JsonFileStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = JsonFileStore::new("./data/servers.json");
//!     let targets = store.load().await?;
//!     println!("{targets:?}");
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod json;
pub mod memory;

pub use backend::PersistenceStore;
pub use error::{StorageError, StorageResult};
