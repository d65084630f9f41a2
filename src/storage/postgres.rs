//! PostgreSQL sink
//!
//! Writes one row per observation into the `session` table.

use super::Persistence;
use crate::models::SeatLogEntry;
use crate::utils::error::StorageError;
use async_trait::async_trait;
use deadpool_postgres::{
    Config as PoolConfig, ManagerConfig, Pool, PoolConfig as PoolSize, RecyclingMethod, Runtime,
};
use tokio_postgres::NoTls;
use tracing::{debug, info};

const CREATE_SESSION_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS session (
        id SERIAL PRIMARY KEY,
        cinema_name TEXT NOT NULL,
        film_name TEXT NOT NULL,
        session_id VARCHAR(32) NOT NULL,
        seats INTEGER NOT NULL,
        logged_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        start_hour VARCHAR(5) NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_session_session_id ON session(session_id);
    CREATE INDEX IF NOT EXISTS idx_session_logged_at ON session(logged_at);
"#;

const INSERT_SESSION: &str = r#"
    INSERT INTO session (cinema_name, film_name, session_id, seats, logged_at, start_hour)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

/// Connection-pooled PostgreSQL sink
pub struct PostgresPersistence {
    pool: Pool,
}

impl PostgresPersistence {
    /// Create the pool and check connectivity
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Pool` if the pool cannot be built or no
    /// connection can be obtained
    pub async fn new(url: &str, pool_size: usize) -> Result<Self, StorageError> {
        let mut pool_config = PoolConfig::new();
        pool_config.url = Some(url.to_string());
        pool_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        pool_config.pool = Some(PoolSize::new(pool_size.max(1)));

        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StorageError::Pool(e.to_string()))?;

        let client = pool.get().await?;
        client.simple_query("SELECT 1").await?;

        info!(pool_size, "PostgreSQL sink connected");
        Ok(Self { pool })
    }

    /// Create the `session` table and its indexes if missing
    pub async fn init_schema(&self) -> Result<(), StorageError> {
        let client = self.pool.get().await?;
        client.batch_execute(CREATE_SESSION_TABLE).await?;
        info!("Session table ready");
        Ok(())
    }
}

#[async_trait]
impl Persistence for PostgresPersistence {
    async fn write_session_seats(&self, entry: &SeatLogEntry) -> Result<(), StorageError> {
        let client = self.pool.get().await?;
        let seats = i32::try_from(entry.seats).map_err(|_| {
            StorageError::Database(format!("seat count {} out of range", entry.seats))
        })?;

        client
            .execute(
                INSERT_SESSION,
                &[
                    &entry.cinema_name,
                    &entry.film_name,
                    &entry.session_id,
                    &seats,
                    &entry.logged_at,
                    &entry.start_hour,
                ],
            )
            .await?;

        debug!(session_id = %entry.session_id, seats = entry.seats, "Seat row inserted");
        Ok(())
    }
}
