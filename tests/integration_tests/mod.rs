//! Integration tests module
//!
//! End-to-end tests for seatwatch against mock booking and proxy-list
//! servers, including:
//! - Catalog fetch pipeline with seat aggregation
//! - Proxy source, manager and client pool
//! - Snapshot bootstrap and session timers
//! - Persistence sinks
//! - Error handling and classification

pub mod error_scenarios;
pub mod fixtures;
pub mod pipeline_test;
pub mod proxy_test;
pub mod storage_test;
