//! Two-stage showing/seat pipeline
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐   filter   ┌──────────────┐
//! │  WorkItems  │────▶│   Stage A    │───────────▶│   Stage B    │────▶ Vec<ShowingResult>
//! │ cinema×film │     │  showings    │  (no empty │ seats per    │
//! └─────────────┘     │  Team        │  sentinel) │ session Team │
//!                     └──────────────┘            └──────────────┘
//! ```
//!
//! Stage A runs to completion before Stage B starts. Inside Stage B every
//! session's seat request runs concurrently; the first failure drops the
//! whole showing once every sibling request has finished.
//!
//! # Example
//!
//! ```no_run
//! use seatwatch::crawler::pipeline::FetchPipeline;
//! use seatwatch::models::WorkItem;
//! # use std::sync::Arc;
//! # async fn example(extractor: Arc<dyn seatwatch::crawler::Extractor>) {
//! let pipeline = FetchPipeline::builder(extractor).workers(10).build();
//! let showings = pipeline.run(vec![WorkItem::new("1030", "HO00003077")]).await;
//! println!("Aggregated {} showings", showings.len());
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::client::Extractor;
use super::team::Team;
use crate::config::EndpointConfig;
use crate::models::{SeatResponse, ShowingResult, WorkItem};
use crate::utils::error::FetchError;

// ============================================================================
// Configuration
// ============================================================================

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Workers per stage
    pub workers: usize,

    /// Pause after each aggregated showing
    pub request_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            request_delay: Duration::from_millis(100),
        }
    }
}

// ============================================================================
// Pipeline Statistics
// ============================================================================

/// Pipeline statistics (thread-safe)
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Work items submitted
    pub total_items: AtomicU64,

    /// Stage A results with showing groups
    pub showings_found: AtomicU64,

    /// Stage A results without showing groups
    pub empty_showings: AtomicU64,

    /// Stage B results with seat counts merged
    pub aggregated: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_items: self.total_items.load(Ordering::Relaxed),
            showings_found: self.showings_found.load(Ordering::Relaxed),
            empty_showings: self.empty_showings.load(Ordering::Relaxed),
            aggregated: self.aggregated.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of pipeline statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_items: u64,
    pub showings_found: u64,
    pub empty_showings: u64,
    pub aggregated: u64,
}

impl StatsSnapshot {
    /// Work items whose showings request failed or returned nothing
    pub fn dropped_items(&self) -> u64 {
        self.total_items
            .saturating_sub(self.showings_found + self.empty_showings)
    }

    /// Showings dropped while fetching seats
    pub fn dropped_showings(&self) -> u64 {
        self.showings_found.saturating_sub(self.aggregated)
    }
}

// ============================================================================
// Stage workers
// ============================================================================

/// Stage A: resolve one work item into a showing.
///
/// # Errors
///
/// Returns `FetchError::EmptyResult` when the endpoint lists no film. A film
/// without showing groups yields [`ShowingResult::empty`] instead.
pub async fn fetch_showing(
    extractor: &dyn Extractor,
    endpoints: &EndpointConfig,
    cinema_names: &HashMap<String, String>,
    item: &WorkItem,
) -> Result<ShowingResult, FetchError> {
    let url = endpoints.showings_url(&item.cinema_id, &item.film_id);
    let response = extractor.call_showings(&url).await?;

    let Some(film) = response.result.into_iter().next() else {
        return Err(FetchError::EmptyResult);
    };

    if film.showing_groups.is_empty() {
        return Ok(ShowingResult::empty());
    }

    Ok(ShowingResult {
        film_title: film.film_title,
        film_id: film.film_id,
        cinema_id: item.cinema_id.clone(),
        cinema_name: cinema_names
            .get(&item.cinema_id)
            .cloned()
            .unwrap_or_default(),
        showing_groups: film.showing_groups,
    })
}

/// Stage B fan-out: fetch seats for every session of `showing` concurrently.
///
/// All requests are awaited. If any failed, the first failure is returned.
pub async fn fetch_all_seats(
    extractor: Arc<dyn Extractor>,
    endpoints: &EndpointConfig,
    showing: &ShowingResult,
) -> Result<HashMap<String, SeatResponse>, FetchError> {
    let first_error: Arc<OnceLock<FetchError>> = Arc::new(OnceLock::new());

    let tasks: Vec<_> = showing
        .session_ids()
        .into_iter()
        .map(|session_id| {
            let url = endpoints.seats_url(&showing.cinema_id, &session_id);
            let extractor = Arc::clone(&extractor);
            let first_error = Arc::clone(&first_error);

            tokio::spawn(async move {
                match extractor.call_seats(&url).await {
                    Ok(seats) => Some((session_id, seats)),
                    Err(e) => {
                        // later failures are discarded
                        let _ = first_error.set(FetchError::for_session(session_id, e));
                        None
                    }
                }
            })
        })
        .collect();

    let mut booking = HashMap::with_capacity(tasks.len());
    for joined in join_all(tasks).await {
        match joined {
            Ok(Some((session_id, seats))) => {
                booking.insert(session_id, seats);
            }
            Ok(None) => {}
            Err(e) => {
                let _ = first_error.set(FetchError::Decode(format!("seat task failed: {e}")));
            }
        }
    }

    match Arc::into_inner(first_error).and_then(OnceLock::into_inner) {
        Some(error) => Err(error),
        None => Ok(booking),
    }
}

// ============================================================================
// Pipeline Implementation
// ============================================================================

/// Showings → seats pipeline over a shared [`Extractor`]
pub struct FetchPipeline {
    extractor: Arc<dyn Extractor>,
    endpoints: Arc<EndpointConfig>,
    cinema_names: Arc<HashMap<String, String>>,
    config: PipelineConfig,
    stats: Arc<PipelineStats>,
}

impl FetchPipeline {
    pub fn builder(extractor: Arc<dyn Extractor>) -> PipelineBuilder {
        PipelineBuilder::new(extractor)
    }

    /// Run both stages and return the aggregated showings
    pub async fn run(&self, items: Vec<WorkItem>) -> Vec<ShowingResult> {
        self.stats
            .total_items
            .fetch_add(items.len() as u64, Ordering::Relaxed);

        info!(
            items = items.len(),
            workers = self.config.workers,
            "Starting showings stage"
        );

        let showings = self.showings_stage().run(items).await;
        let filtered: Vec<ShowingResult> = showings
            .into_iter()
            .filter(|showing| !showing.is_empty_sentinel())
            .collect();

        info!(showings = filtered.len(), "Starting seats stage");
        let results = self.seats_stage().run(filtered).await;

        let snapshot = self.stats.snapshot();
        info!(
            total = snapshot.total_items,
            found = snapshot.showings_found,
            empty = snapshot.empty_showings,
            aggregated = snapshot.aggregated,
            dropped_items = snapshot.dropped_items(),
            dropped_showings = snapshot.dropped_showings(),
            "Pipeline completed"
        );

        results
    }

    fn showings_stage(&self) -> Team<WorkItem, ShowingResult> {
        let extractor = Arc::clone(&self.extractor);
        let endpoints = Arc::clone(&self.endpoints);
        let names = Arc::clone(&self.cinema_names);
        let stats = Arc::clone(&self.stats);

        Team::new("showings", self.config.workers, move |item: WorkItem| {
            let extractor = Arc::clone(&extractor);
            let endpoints = Arc::clone(&endpoints);
            let names = Arc::clone(&names);
            let stats = Arc::clone(&stats);

            async move {
                match fetch_showing(extractor.as_ref(), &endpoints, &names, &item).await {
                    Ok(showing) if showing.is_empty_sentinel() => {
                        stats.empty_showings.fetch_add(1, Ordering::Relaxed);
                        debug!(
                            cinema_id = %item.cinema_id,
                            film_id = %item.film_id,
                            "No showing groups"
                        );
                        Ok(showing)
                    }
                    Ok(showing) => {
                        stats.showings_found.fetch_add(1, Ordering::Relaxed);
                        Ok(showing)
                    }
                    Err(e) => {
                        debug!(
                            cinema_id = %item.cinema_id,
                            film_id = %item.film_id,
                            error = %e,
                            "Showings request failed"
                        );
                        Err(e)
                    }
                }
            }
        })
    }

    fn seats_stage(&self) -> Team<ShowingResult, ShowingResult> {
        let extractor = Arc::clone(&self.extractor);
        let endpoints = Arc::clone(&self.endpoints);
        let stats = Arc::clone(&self.stats);
        let delay = self.config.request_delay;

        Team::new("seats", self.config.workers, move |mut showing: ShowingResult| {
            let extractor = Arc::clone(&extractor);
            let endpoints = Arc::clone(&endpoints);
            let stats = Arc::clone(&stats);

            async move {
                let booking = match fetch_all_seats(extractor, &endpoints, &showing).await {
                    Ok(booking) => booking,
                    Err(e) => {
                        warn!(
                            cinema_id = %showing.cinema_id,
                            film_id = %showing.film_id,
                            error = %e,
                            "Dropping showing"
                        );
                        return Err(e);
                    }
                };

                showing.aggregate_booking(&booking);
                stats.aggregated.fetch_add(1, Ordering::Relaxed);

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok::<_, FetchError>(showing)
            }
        })
    }

    /// Get current statistics
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

// ============================================================================
// Pipeline Builder
// ============================================================================

/// Builder for [`FetchPipeline`]
pub struct PipelineBuilder {
    extractor: Arc<dyn Extractor>,
    endpoints: EndpointConfig,
    cinema_names: HashMap<String, String>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self {
            extractor,
            endpoints: EndpointConfig::default(),
            cinema_names: HashMap::new(),
            config: PipelineConfig::default(),
        }
    }

    pub fn endpoints(mut self, endpoints: EndpointConfig) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Cinema id → display name
    pub fn cinema_names(mut self, names: HashMap<String, String>) -> Self {
        self.cinema_names = names;
        self
    }

    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    pub fn request_delay(mut self, delay: Duration) -> Self {
        self.config.request_delay = delay;
        self
    }

    pub fn build(self) -> FetchPipeline {
        FetchPipeline {
            extractor: self.extractor,
            endpoints: Arc::new(self.endpoints),
            cinema_names: Arc::new(self.cinema_names),
            config: self.config,
            stats: PipelineStats::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
