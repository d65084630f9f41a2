//! Error types for the seatwatch crawler
//!
//! This module defines the domain error types used by the outbound request,
//! proxy and storage layers.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Body could not be decoded into the expected shape
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Endpoint answered with zero results
    #[error("No results found")]
    EmptyResult,

    /// Credentials could not be produced for the request
    #[error("Credential error: {0}")]
    Credentials(String),

    /// No pooled client can be handed out
    #[error("Client pool unavailable: {0}")]
    PoolClosed(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Request failed for a specific session
    #[error("Seat request failed for session {session_id}: {source}")]
    Session {
        session_id: String,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Wrap an error with the session it belongs to
    pub fn for_session(session_id: impl Into<String>, source: FetchError) -> Self {
        Self::Session {
            session_id: session_id.into(),
            source: Box::new(source),
        }
    }

    /// Classify a reqwest error, keeping timeouts distinguishable
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Errors raised while acquiring or using proxies
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Proxy list endpoint could not be reached
    #[error("Proxy source unreachable: {0}")]
    SourceUnreachable(String),

    /// Proxy list payload did not match the expected shape
    #[error("Malformed proxy data: {0}")]
    Malformed(String),

    /// Protocol not supported by any transport
    #[error("Unsupported proxy protocol: {0}")]
    UnsupportedProtocol(String),

    /// Transport for a proxy could not be constructed
    #[error("Failed to build transport for {addr}: {reason}")]
    Transport { addr: String, reason: String },

    /// No usable proxy and the fallback policy forbids a direct connection
    #[error("No usable proxies available")]
    NoProxies,
}

/// Errors raised by persistence sinks
#[derive(Error, Debug)]
pub enum StorageError {
    /// File sink I/O error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Record could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Connection pool error
    #[error("Pool error: {0}")]
    Pool(String),
}

impl From<tokio_postgres::Error> for StorageError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for StorageError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
