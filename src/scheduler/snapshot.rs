//! Today's showing snapshot
//!
//! The scheduler works from one snapshot of the day's showings. The snapshot
//! is fetched once per day and reused by later runs on the same date.

use super::error::{SchedulerError, SchedulerResult};
use crate::config::EndpointConfig;
use crate::crawler::pipeline::fetch_all_seats;
use crate::crawler::{Extractor, Team};
use crate::models::{flatten_showings, ScheduledSession, ShowingResult};
use crate::utils::error::FetchError;
use crate::utils::snapshot_path;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

// ============================================================================
// Stores
// ============================================================================

/// Storage for per-date showing snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Snapshot for `date` (YYYY-MM-DD), if one was saved
    async fn load(&self, date: &str) -> SchedulerResult<Option<Vec<ShowingResult>>>;

    async fn save(&self, date: &str, showings: &[ShowingResult]) -> SchedulerResult<()>;
}

/// One `today-sessions-YYYY-MM-DD.json` file per date
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, date: &str) -> PathBuf {
        snapshot_path(&self.dir, date)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self, date: &str) -> SchedulerResult<Option<Vec<ShowingResult>>> {
        let path = self.path_for(date);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SchedulerError::io_error("load_snapshot", e.to_string()))?;
        let showings: Vec<ShowingResult> = serde_json::from_str(&json)?;
        debug!(path = %path.display(), showings = showings.len(), "Snapshot loaded");
        Ok(Some(showings))
    }

    async fn save(&self, date: &str, showings: &[ShowingResult]) -> SchedulerResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SchedulerError::io_error("create_snapshot_dir", e.to_string()))?;

        let path = self.path_for(date);
        let json = serde_json::to_string_pretty(showings)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| SchedulerError::io_error("save_snapshot", e.to_string()))?;
        info!(path = %path.display(), showings = showings.len(), "Snapshot saved");
        Ok(())
    }
}

/// Keeps the most recent snapshot in memory
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    cached: RwLock<Option<(String, Vec<ShowingResult>)>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, date: &str) -> SchedulerResult<Option<Vec<ShowingResult>>> {
        let cached = self.cached.read().await;
        Ok(cached
            .as_ref()
            .filter(|(cached_date, _)| cached_date == date)
            .map(|(_, showings)| showings.clone()))
    }

    async fn save(&self, date: &str, showings: &[ShowingResult]) -> SchedulerResult<()> {
        *self.cached.write().await = Some((date.to_string(), showings.to_vec()));
        Ok(())
    }
}

// ============================================================================
// Bootstrap
// ============================================================================

/// Fetches every showing of a date, one Team job per cinema
pub struct TodayFetcher {
    extractor: Arc<dyn Extractor>,
    endpoints: Arc<EndpointConfig>,
    cinema_names: Arc<HashMap<String, String>>,
    workers: usize,
}

impl TodayFetcher {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        endpoints: EndpointConfig,
        cinema_names: HashMap<String, String>,
        workers: usize,
    ) -> Self {
        Self {
            extractor,
            endpoints: Arc::new(endpoints),
            cinema_names: Arc::new(cinema_names),
            workers,
        }
    }

    /// Showings at every known cinema on `date`.
    ///
    /// Cinemas whose request fails are dropped, and so is any film with a
    /// session whose seat request fails.
    pub async fn fetch(&self, date: &str) -> Vec<ShowingResult> {
        let extractor = Arc::clone(&self.extractor);
        let endpoints = Arc::clone(&self.endpoints);
        let names = Arc::clone(&self.cinema_names);
        let date = date.to_string();

        let team = Team::new("today", self.workers, move |cinema_id: String| {
            let extractor = Arc::clone(&extractor);
            let endpoints = Arc::clone(&endpoints);
            let names = Arc::clone(&names);
            let date = date.clone();
            async move { fetch_cinema_day(extractor, &endpoints, &names, &cinema_id, &date).await }
        });

        let mut cinema_ids: Vec<String> = self.cinema_names.keys().cloned().collect();
        cinema_ids.sort_unstable();

        team.run(cinema_ids).await.into_iter().flatten().collect()
    }
}

async fn fetch_cinema_day(
    extractor: Arc<dyn Extractor>,
    endpoints: &EndpointConfig,
    names: &HashMap<String, String>,
    cinema_id: &str,
    date: &str,
) -> Result<Vec<ShowingResult>, FetchError> {
    let url = endpoints.today_showings_url(cinema_id, date);
    let response = extractor.call_showings(&url).await?;
    let cinema_name = names.get(cinema_id).cloned().unwrap_or_default();

    let mut showings = Vec::new();
    for film in response.result {
        if film.showing_groups.is_empty() {
            continue;
        }

        let mut showing = ShowingResult {
            film_title: film.film_title,
            film_id: film.film_id,
            cinema_id: cinema_id.to_string(),
            cinema_name: cinema_name.clone(),
            showing_groups: film.showing_groups,
        };
        match fetch_all_seats(Arc::clone(&extractor), endpoints, &showing).await {
            Ok(booking) => {
                showing.aggregate_booking(&booking);
                showings.push(showing);
            }
            Err(e) => warn!(
                cinema_id,
                film_id = %showing.film_id,
                error = %e,
                "Dropping film from snapshot"
            ),
        }
    }

    debug!(cinema_id, films = showings.len(), "Cinema day fetched");
    Ok(showings)
}

/// Reuse the snapshot for `date`, or fetch and save it.
///
/// # Errors
///
/// Returns `SchedulerError::BootstrapFailed` if nothing was cached and the
/// fetch produced no showings, or a store error.
#[instrument(skip(store, fetcher))]
pub async fn bootstrap(
    store: &dyn SnapshotStore,
    fetcher: &TodayFetcher,
    date: &str,
) -> SchedulerResult<Vec<ShowingResult>> {
    if let Some(showings) = store.load(date).await? {
        info!(showings = showings.len(), "Reusing cached snapshot");
        return Ok(showings);
    }

    let showings = fetcher.fetch(date).await;
    if showings.is_empty() {
        return Err(SchedulerError::BootstrapFailed {
            reason: format!("no showings found for {date}"),
        });
    }

    store.save(date, &showings).await?;
    Ok(showings)
}

/// Flatten a snapshot into scheduler input.
///
/// Start hours are derived again so snapshots missing them still schedule.
pub fn flatten(mut showings: Vec<ShowingResult>) -> Vec<ScheduledSession> {
    showings.retain(|s| !s.is_empty_sentinel());
    for showing in &mut showings {
        showing.derive_start_hours();
    }
    flatten_showings(&showings)
}
