//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Session start hour could not be turned into a target time
    InvalidStartHour {
        session_id: String,
        start_hour: String,
    },

    /// Bootstrap fetch produced nothing usable
    BootstrapFailed { reason: String },

    /// Serialization/deserialization error
    SerializationError { reason: String },

    /// IO error
    IoError { operation: String, reason: String },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStartHour {
                session_id,
                start_hour,
            } => {
                write!(
                    f,
                    "Invalid start hour '{}' for session {}",
                    start_hour, session_id
                )
            }
            Self::BootstrapFailed { reason } => {
                write!(f, "Failed to bootstrap today's sessions: {}", reason)
            }
            Self::SerializationError { reason } => {
                write!(f, "Serialization error: {}", reason)
            }
            Self::IoError { operation, reason } => {
                write!(f, "IO error during '{}': {}", operation, reason)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for SchedulerError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            operation: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl SchedulerError {
    /// Create an invalid start hour error
    pub fn invalid_start_hour(
        session_id: impl Into<String>,
        start_hour: impl Into<String>,
    ) -> Self {
        Self::InvalidStartHour {
            session_id: session_id.into(),
            start_hour: start_hour.into(),
        }
    }

    /// Create an IO error with context
    pub fn io_error(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IoError {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error only affects a single session
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidStartHour { .. })
    }
}
