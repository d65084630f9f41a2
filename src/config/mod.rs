//! Configuration management for seatwatch
//!
//! This module handles loading and validating configuration from environment variables
//! and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Crawler configuration
    pub crawler: CrawlerConfig,

    /// Booking API endpoints
    pub endpoints: EndpointConfig,

    /// Proxy configuration
    pub proxy: ProxyConfig,

    /// Session timer configuration
    pub scheduler: SchedulerConfig,

    /// Seat log persistence
    pub persistence: PersistenceConfig,

    /// Credentials sent with every booking API request
    pub credentials: CredentialsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Crawler-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers per stage
    pub workers: usize,

    /// Delay after each aggregated showing, in milliseconds
    pub request_delay_ms: u64,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Rate limit (requests per second) per outbound client
    pub rate_limit: u32,

    /// Number of proxy-bound clients in the pool
    pub pool_size: usize,

    /// User agent string
    pub user_agent: String,
}

/// Booking API endpoint templates. `{cinema}`, `{film}`, `{session}` and
/// `{date}` are substituted per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub showings_path: String,
    pub today_showings_path: String,
    pub seats_path: String,
    pub cinemas_path: String,
    pub films_path: String,
}

/// What to do when the proxy source yields no usable proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Use a single unproxied client
    Direct,
    /// Abort the run
    Fail,
}

/// Proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Route requests through scored proxies
    pub enabled: bool,

    /// Proxy list endpoint
    pub source_url: String,

    /// Behaviour for an empty proxy list
    pub fallback: FallbackPolicy,
}

/// Session timer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Offset after session start before the seat re-check, in seconds
    pub base_offset_secs: u64,

    /// Lower jitter bound in milliseconds
    pub jitter_min_ms: u64,

    /// Upper jitter bound in milliseconds (inclusive)
    pub jitter_max_ms: u64,

    /// Directory holding today's showing snapshots
    pub snapshot_dir: PathBuf,

    /// Fixed RNG seed for reproducible jitter
    pub seed: Option<u64>,
}

/// Persistence backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    File,
    Postgres,
}

/// Seat log persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub backend: PersistenceBackend,

    /// JSON-lines log file used by the file backend
    pub file_path: PathBuf,

    /// PostgreSQL connection string
    pub postgres_url: String,

    /// Maximum pool size
    pub pool_size: usize,
}

/// Credential configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Raw cookie header value
    pub cookie: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let backend = match std::env::var("SEATWATCH_PERSISTENCE").ok().as_deref() {
            Some("postgres") => PersistenceBackend::Postgres,
            Some("file") | None => defaults.persistence.backend,
            Some(other) => anyhow::bail!("Unknown persistence backend: {other}"),
        };

        let fallback = match std::env::var("SEATWATCH_PROXY_FALLBACK").ok().as_deref() {
            Some("fail") => FallbackPolicy::Fail,
            Some("direct") | None => defaults.proxy.fallback,
            Some(other) => anyhow::bail!("Unknown proxy fallback policy: {other}"),
        };

        let config = Self {
            crawler: CrawlerConfig {
                workers: env_parse("SEATWATCH_WORKERS").unwrap_or(defaults.crawler.workers),
                request_delay_ms: env_parse("SEATWATCH_REQUEST_DELAY_MS")
                    .unwrap_or(defaults.crawler.request_delay_ms),
                request_timeout_secs: env_parse("SEATWATCH_REQUEST_TIMEOUT")
                    .unwrap_or(defaults.crawler.request_timeout_secs),
                rate_limit: env_parse("SEATWATCH_RATE_LIMIT")
                    .unwrap_or(defaults.crawler.rate_limit),
                pool_size: env_parse("SEATWATCH_POOL_SIZE").unwrap_or(defaults.crawler.pool_size),
                user_agent: std::env::var("SEATWATCH_USER_AGENT")
                    .unwrap_or(defaults.crawler.user_agent),
            },
            endpoints: EndpointConfig {
                base_url: std::env::var("SEATWATCH_BASE_URL")
                    .unwrap_or(defaults.endpoints.base_url),
                ..defaults.endpoints
            },
            proxy: ProxyConfig {
                enabled: env_parse("SEATWATCH_PROXY_ENABLED").unwrap_or(defaults.proxy.enabled),
                source_url: std::env::var("SEATWATCH_PROXY_SOURCE")
                    .unwrap_or(defaults.proxy.source_url),
                fallback,
            },
            scheduler: SchedulerConfig {
                base_offset_secs: env_parse("SEATWATCH_BASE_OFFSET_SECS")
                    .unwrap_or(defaults.scheduler.base_offset_secs),
                snapshot_dir: std::env::var("SEATWATCH_SNAPSHOT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.scheduler.snapshot_dir),
                seed: env_parse("SEATWATCH_SEED"),
                ..defaults.scheduler
            },
            persistence: PersistenceConfig {
                backend,
                file_path: std::env::var("SEATWATCH_LOG_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.persistence.file_path),
                postgres_url: std::env::var("DATABASE_URL")
                    .unwrap_or(defaults.persistence.postgres_url),
                pool_size: env_parse("SEATWATCH_DB_POOL_SIZE")
                    .unwrap_or(defaults.persistence.pool_size),
            },
            credentials: CredentialsConfig {
                cookie: std::env::var("SEATWATCH_COOKIE").ok(),
            },
            logging: LoggingConfig {
                level: std::env::var("SEATWATCH_LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: std::env::var("SEATWATCH_LOG_FORMAT").unwrap_or(defaults.logging.format),
            },
        };

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.crawler.workers == 0 {
            anyhow::bail!("workers must be greater than 0");
        }

        if self.crawler.rate_limit == 0 {
            anyhow::bail!("rate_limit must be positive");
        }

        if self.crawler.pool_size == 0 {
            anyhow::bail!("pool_size must be greater than 0");
        }

        if self.scheduler.jitter_min_ms > self.scheduler.jitter_max_ms {
            anyhow::bail!("jitter_min_ms must not exceed jitter_max_ms");
        }

        if self.persistence.backend == PersistenceBackend::Postgres
            && self.persistence.postgres_url.is_empty()
        {
            anyhow::bail!("postgres_url is required for the postgres backend");
        }

        url::Url::parse(&self.endpoints.base_url).context("Invalid base_url")?;

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.request_timeout_secs)
    }

    /// Get the inter-job throttle as Duration
    #[must_use]
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.crawler.request_delay_ms)
    }
}

impl EndpointConfig {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Showings of one film at one cinema
    pub fn showings_url(&self, cinema_id: &str, film_id: &str) -> String {
        self.url(
            &self
                .showings_path
                .replace("{cinema}", cinema_id)
                .replace("{film}", film_id),
        )
    }

    /// All showings at one cinema on `date` (YYYY-MM-DD)
    pub fn today_showings_url(&self, cinema_id: &str, date: &str) -> String {
        self.url(
            &self
                .today_showings_path
                .replace("{cinema}", cinema_id)
                .replace("{date}", date),
        )
    }

    /// Seat grid of one session
    pub fn seats_url(&self, cinema_id: &str, session_id: &str) -> String {
        self.url(
            &self
                .seats_path
                .replace("{cinema}", cinema_id)
                .replace("{session}", session_id),
        )
    }

    pub fn cinemas_url(&self) -> String {
        self.url(&self.cinemas_path)
    }

    pub fn films_url(&self) -> String {
        self.url(&self.films_path)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://www.thespacecinema.it"),
            showings_path: String::from(
                "/api/microservice/showings/cinemas/{cinema}/films?filmId={film}",
            ),
            today_showings_path: String::from(
                "/api/microservice/showings/cinemas/{cinema}/films?showingDate={date}T00:00:00",
            ),
            seats_path: String::from("/api/microservice/booking/Session/{cinema}/{session}/seats"),
            cinemas_path: String::from("/api/microservice/showings/cinemas"),
            films_path: String::from("/api/microservice/showings/films"),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_offset_secs: 12 * 60,
            jitter_min_ms: 100,
            jitter_max_ms: 2 * 60 * 1000,
            snapshot_dir: PathBuf::from("files"),
            seed: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig {
                workers: 10,
                request_delay_ms: 100,
                request_timeout_secs: 30,
                rate_limit: 5,
                pool_size: 20,
                user_agent: format!("seatwatch/{}", env!("CARGO_PKG_VERSION")),
            },
            endpoints: EndpointConfig::default(),
            proxy: ProxyConfig {
                enabled: true,
                source_url: String::from(
                    "https://proxylist.geonode.com/api/proxy-list?limit=500&page=1&sort_by=lastChecked&sort_type=desc",
                ),
                fallback: FallbackPolicy::Direct,
            },
            scheduler: SchedulerConfig::default(),
            persistence: PersistenceConfig {
                backend: PersistenceBackend::File,
                file_path: PathBuf::from("files/seat_log.jsonl"),
                postgres_url: String::from("postgresql://localhost/seatwatch"),
                pool_size: 10,
            },
            credentials: CredentialsConfig::default(),
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}
