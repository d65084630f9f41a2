use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;

use seatwatch::config::Config;
use seatwatch::crawler::{Catalog, FetchPipeline};
use seatwatch::utils::showings_filename;

use super::build_extractor;

/// One-shot catalog fetch: every (cinema, film) pair through both pipeline
/// stages, written to a timestamped JSON file in `output_dir`
pub async fn fetch(config: Config, no_proxy: bool, output_dir: PathBuf) -> Result<()> {
    let extractor = build_extractor(&config, no_proxy).await?;

    let catalog = Catalog::load(extractor.as_ref())
        .await
        .context("Failed to load cinema and film catalog")?;
    let items = catalog.work_items();

    let pipeline = FetchPipeline::builder(Arc::clone(&extractor))
        .endpoints(config.endpoints.clone())
        .cinema_names(catalog.cinema_names())
        .workers(config.crawler.workers)
        .request_delay(config.request_delay())
        .build();

    let showings = pipeline.run(items).await;
    let stats = pipeline.stats();

    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(showings_filename(Local::now()));
    let json = serde_json::to_string_pretty(&showings)?;
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        total = stats.total_items,
        showings = showings.len(),
        "Catalog fetch written"
    );
    println!(
        "Fetched {} showings from {} work items -> {}",
        showings.len(),
        stats.total_items,
        path.display()
    );
    Ok(())
}
