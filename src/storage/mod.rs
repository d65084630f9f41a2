//! Seat observation persistence
//!
//! Scheduler callbacks hand every [`SeatLogEntry`] to a [`Persistence`] sink.
//! Two sinks exist: an append-only JSON-lines file and a PostgreSQL table.

pub mod file;
pub mod postgres;

use crate::config::{PersistenceBackend, PersistenceConfig};
use crate::models::SeatLogEntry;
use crate::utils::error::StorageError;
use async_trait::async_trait;
use std::sync::Arc;

pub use file::FilePersistence;
pub use postgres::PostgresPersistence;

/// Sink for seat observations
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn write_session_seats(&self, entry: &SeatLogEntry) -> Result<(), StorageError>;
}

/// Open the sink selected by `config`
///
/// # Errors
///
/// Returns `StorageError` if the database pool cannot be created
pub async fn open(config: &PersistenceConfig) -> Result<Arc<dyn Persistence>, StorageError> {
    match config.backend {
        PersistenceBackend::File => Ok(Arc::new(FilePersistence::new(&config.file_path))),
        PersistenceBackend::Postgres => {
            let sink = PostgresPersistence::new(&config.postgres_url, config.pool_size).await?;
            Ok(Arc::new(sink))
        }
    }
}
