//! Booking API client
//!
//! [`Extractor`] is the seam every pipeline stage and the seat re-check talk
//! through. [`HttpExtractor`] is the concrete client: one reqwest client,
//! optionally routed through a proxy, a header provider for credentials and
//! a governor rate limiter.

use super::headers::HeaderProvider;
use crate::config::EndpointConfig;
use crate::models::{CinemasResponse, FilmsResponse, SeatResponse, ShowingResponse};
use crate::utils::error::FetchError;
use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Booking API operations
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Showings payload at a fully built showings URL
    async fn call_showings(&self, url: &str) -> Result<ShowingResponse, FetchError>;

    /// Seat grid at a fully built seats URL
    async fn call_seats(&self, url: &str) -> Result<SeatResponse, FetchError>;

    /// Cinema catalog grouped by region
    async fn get_cinemas(&self) -> Result<CinemasResponse, FetchError>;

    /// Film catalog
    async fn get_films(&self) -> Result<FilmsResponse, FetchError>;
}

/// Settings shared by every outbound client
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub user_agent: String,
    /// Requests per second, `None` for unlimited
    pub rate_limit: Option<u32>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("seatwatch/{}", env!("CARGO_PKG_VERSION")),
            rate_limit: None,
        }
    }
}

impl ClientSettings {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            timeout: config.request_timeout(),
            user_agent: config.crawler.user_agent.clone(),
            rate_limit: Some(config.crawler.rate_limit),
        }
    }

    /// Build a reqwest client, routed through `proxy` when given
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the client cannot be created
    pub fn build_client(&self, proxy: Option<reqwest::Proxy>) -> Result<Client, FetchError> {
        let mut builder = Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .gzip(true);

        builder = match proxy {
            Some(proxy) => builder.proxy(proxy),
            None => builder.no_proxy(),
        };

        Ok(builder.build()?)
    }
}

/// Extractor over a single reqwest client
#[derive(Clone)]
pub struct HttpExtractor {
    client: Client,
    headers: Arc<dyn HeaderProvider>,
    endpoints: EndpointConfig,
    rate_limiter: Option<Arc<DirectRateLimiter>>,
}

impl HttpExtractor {
    pub fn new(
        client: Client,
        headers: Arc<dyn HeaderProvider>,
        endpoints: EndpointConfig,
    ) -> Self {
        Self {
            client,
            headers,
            endpoints,
            rate_limiter: None,
        }
    }

    /// Direct (unproxied) client built from settings
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn direct(
        settings: &ClientSettings,
        headers: Arc<dyn HeaderProvider>,
        endpoints: EndpointConfig,
    ) -> Result<Self, FetchError> {
        let client = settings.build_client(None)?;
        Ok(Self::new(client, headers, endpoints).with_rate_limit(settings.rate_limit))
    }

    /// Limit this client to `requests_per_second`; `None` or zero disables it
    pub fn with_rate_limit(mut self, requests_per_second: Option<u32>) -> Self {
        self.rate_limiter = requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));
        self
    }

    /// GET `url` and decode the JSON body
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let headers = self.headers.headers().await?;
        debug!(url = %url, "Fetching");

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(FetchError::from_reqwest)?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(format!("{url}: {e}")))
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn call_showings(&self, url: &str) -> Result<ShowingResponse, FetchError> {
        self.get_json(url).await
    }

    async fn call_seats(&self, url: &str) -> Result<SeatResponse, FetchError> {
        self.get_json(url).await
    }

    async fn get_cinemas(&self) -> Result<CinemasResponse, FetchError> {
        self.get_json(&self.endpoints.cinemas_url()).await
    }

    async fn get_films(&self) -> Result<FilmsResponse, FetchError> {
        self.get_json(&self.endpoints.films_url()).await
    }
}
