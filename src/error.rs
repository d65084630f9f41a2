//! Unified error handling for the seatwatch crate
//!
//! Domain-specific errors are consolidated into a single [`Error`] enum. Each
//! variant maps to an [`ErrorCategory`] that tells callers how a failure is
//! handled:
//!
//! - [`ErrorCategory::Transient`] - per-job failures absorbed by a batch
//! - [`ErrorCategory::Setup`] - fatal to the enclosing run
//! - [`ErrorCategory::Aggregation`] - one sibling failed, the whole showing is dropped
//! - [`ErrorCategory::Scheduling`] - one session is skipped
//!
//! # Usage
//!
//! ```rust,ignore
//! use seatwatch::error::{Error, ErrorCategory};
//!
//! fn handle(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(error = %err, "dropping job");
//!     } else {
//!         tracing::error!(error = %err, "run aborted");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::scheduler::error::SchedulerError;
pub use crate::utils::error::{FetchError, ProxyError, StorageError};

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network error, unparseable response or empty result for one job
    Transient,
    /// Cannot reach the proxy source, parse its data or acquire credentials
    Setup,
    /// A sibling request failed while aggregating one showing
    Aggregation,
    /// Bad start hour or timer bookkeeping
    Scheduling,
    /// Persistence sink failures
    Storage,
    /// Configuration and validation errors
    Config,
}

impl ErrorCategory {
    /// Short human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Setup => "setup",
            Self::Aggregation => "aggregation",
            Self::Scheduling => "scheduling",
            Self::Storage => "storage",
            Self::Config => "config",
        }
    }
}

/// Unified error type for the seatwatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Proxy acquisition and transport errors
    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Scheduler and timing errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(FetchError::Session { .. }) => ErrorCategory::Aggregation,
            Self::Fetch(FetchError::Credentials(_) | FetchError::PoolClosed(_)) => {
                ErrorCategory::Setup
            }
            Self::Fetch(_) => ErrorCategory::Transient,
            Self::Proxy(_) => ErrorCategory::Setup,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Scheduler(SchedulerError::InvalidStartHour { .. }) => ErrorCategory::Scheduling,
            Self::Scheduler(_) => ErrorCategory::Storage,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Transient,
            Self::Config(_) => ErrorCategory::Config,
        }
    }

    /// Whether the failure only costs a single job or session
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transient | ErrorCategory::Aggregation | ErrorCategory::Scheduling
        )
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
