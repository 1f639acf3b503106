//! JSON file store
//!
//! Keeps the registry as a single pretty-printed JSON array. The data
//! directory is created on first save. Writes go to a sibling temporary file
//! which is then renamed over the real one, so a crash mid-write leaves the
//! previous document intact.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, trace};

use super::backend::PersistenceStore;
use super::error::StorageResult;
use crate::registry::Target;

/// File-backed persistence store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "servers.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl PersistenceStore for JsonFileStore {
    async fn load(&self) -> StorageResult<Option<Vec<Target>>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no registry file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let targets: Vec<Target> = serde_json::from_str(&content)?;
        trace!("read {} targets from {}", targets.len(), self.path.display());

        Ok(Some(targets))
    }

    async fn save(&self, targets: &[Target]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let document = serde_json::to_string_pretty(targets)?;

        let temp = self.temp_path();
        fs::write(&temp, document).await?;
        fs::rename(&temp, &self.path).await?;

        trace!("wrote {} targets to {}", targets.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
