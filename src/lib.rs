//! seatwatch - cinema seat-occupancy tracker
//!
//! Fetches showing calendars and seat maps from a cinema booking API through a
//! rotating pool of scored proxies, then re-checks each session's occupancy
//! shortly after it starts.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`proxy`] - Proxy scoring, the proxy max-heap and the proxy manager
//! - [`crawler`] - Outbound clients, the client pool, worker teams and the fetch pipeline
//! - [`scheduler`] - Today's snapshot, per-session timers and seat re-checks
//! - [`storage`] - Seat log persistence (JSON lines, PostgreSQL)
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! ```text
//!   ProxySource ─▶ ProxyManager ─▶ ClientPool ─▶ FetchPipeline ─▶ showings
//!                                      │
//!                                      └──▶ SessionScheduler ─▶ Persistence
//! ```
//!
//! # Example
//!
//! ```no_run
//! use seatwatch::config::Config;
//! use seatwatch::crawler::{Catalog, ClientSettings, FetchPipeline, HttpExtractor, StaticHeaders};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let headers = Arc::new(StaticHeaders::new(config.credentials.cookie.as_deref())?);
//!     let extractor = Arc::new(HttpExtractor::direct(
//!         &ClientSettings::from_config(&config),
//!         headers,
//!         config.endpoints.clone(),
//!     )?);
//!
//!     let catalog = Catalog::load(extractor.as_ref()).await?;
//!     let pipeline = FetchPipeline::builder(extractor)
//!         .endpoints(config.endpoints.clone())
//!         .cinema_names(catalog.cinema_names())
//!         .build();
//!     let showings = pipeline.run(catalog.work_items()).await;
//!     println!("{} showings", showings.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod proxy;
pub mod scheduler;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{ClientPool, Extractor, FetchPipeline, Team};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{ScheduledSession, SeatLogEntry, ShowingResult, WorkItem};
    pub use crate::proxy::{ProxyManager, ScoreAlgorithm, WeightedScore};
    pub use crate::scheduler::{SeatChecker, SessionScheduler};
    pub use crate::storage::Persistence;
}

// Direct re-exports for convenience
pub use models::{ScheduledSession, SeatLogEntry, Session, ShowingResult, WorkItem};
