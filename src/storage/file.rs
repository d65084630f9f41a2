//! JSON-lines file sink

use super::Persistence;
use crate::models::SeatLogEntry;
use crate::utils::error::StorageError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Appends one JSON record per line to a log file.
///
/// Concurrent writers are serialized around the whole open-append-close
/// sequence, so lines never interleave.
#[derive(Debug)]
pub struct FilePersistence {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl Persistence for FilePersistence {
    async fn write_session_seats(&self, entry: &SeatLogEntry) -> Result<(), StorageError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(&line).await.map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;

        debug!(session_id = %entry.session_id, seats = entry.seats, "Seat log written");
        Ok(())
    }
}
