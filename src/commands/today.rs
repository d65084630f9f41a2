use anyhow::{Context, Result};
use std::sync::Arc;

use seatwatch::config::Config;
use seatwatch::crawler::Catalog;
use seatwatch::scheduler::{
    bootstrap, flatten, FileSnapshotStore, SeatChecker, SessionScheduler, TodayFetcher,
};
use seatwatch::storage;
use seatwatch::utils::today_string;

use super::build_extractor;

/// Schedule a seat re-check for every session of today and wait for all of them
pub async fn today(config: Config, no_proxy: bool) -> Result<()> {
    let date = today_string();
    let extractor = build_extractor(&config, no_proxy).await?;

    let catalog = Catalog::load_cinemas(extractor.as_ref())
        .await
        .context("Failed to load cinemas")?;
    let fetcher = TodayFetcher::new(
        Arc::clone(&extractor),
        config.endpoints.clone(),
        catalog.cinema_names(),
        config.crawler.workers,
    );
    let store = FileSnapshotStore::new(&config.scheduler.snapshot_dir);

    let showings = bootstrap(&store, &fetcher, &date).await?;
    let sessions = flatten(showings);
    tracing::info!(date = %date, sessions = sessions.len(), "Sessions loaded");

    let sink = storage::open(&config.persistence)
        .await
        .context("Failed to open seat log")?;
    let checker = Arc::new(SeatChecker::new(extractor, config.endpoints.clone(), sink));

    let scheduler = SessionScheduler::new(&config.scheduler);
    let stats = scheduler.run(&date, sessions, checker.callback()).await;

    println!(
        "{date}: {} sessions scheduled, {} already past, {} unparseable, {} checked",
        stats.scheduled, stats.skipped_past, stats.skipped_unparseable, stats.fired
    );
    Ok(())
}
