//! Booking API crawling
//!
//! Outbound clients, the proxy-bound client pool, the generic worker
//! [`Team`] and the two-stage [`FetchPipeline`] built on top of it.

pub mod catalog;
pub mod client;
pub mod headers;
pub mod pipeline;
pub mod pool;
pub mod team;

pub use catalog::Catalog;
pub use client::{ClientSettings, Extractor, HttpExtractor};
pub use headers::{CookieJarProvider, HeaderProvider, HttpCookieSource, StaticHeaders};
pub use pipeline::{FetchPipeline, PipelineConfig, StatsSnapshot};
pub use pool::{ClientPool, PooledClient, ScoredClient};
pub use team::Team;
