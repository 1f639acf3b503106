//! Error types for persistence operations

use std::fmt;

/// Result type alias for persistence operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while loading or saving the registry
#[derive(Debug)]
pub enum StorageError {
    /// I/O error (file access, directory creation, rename)
    IoError(std::io::Error),

    /// The stored document could not be (de)serialized
    SerializationError(String),

    /// Backend-specific error
    BackendError(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::IoError(err) => write!(f, "I/O error: {}", err),
            StorageError::SerializationError(msg) => {
                write!(f, "registry serialization error: {}", msg)
            }
            StorageError::BackendError(msg) => write!(f, "persistence backend error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}
