use anyhow::{Context, Result};

use seatwatch::config::Config;
use seatwatch::storage::PostgresPersistence;

/// Create the seat log table
pub async fn init_db(config: Config) -> Result<()> {
    let sink = PostgresPersistence::new(
        &config.persistence.postgres_url,
        config.persistence.pool_size,
    )
    .await
    .context("Failed to connect to PostgreSQL")?;

    sink.init_schema()
        .await
        .context("Failed to create session table")?;

    println!("Schema initialized");
    Ok(())
}
