//! Request headers and booking-site credentials
//!
//! Every outbound request asks a [`HeaderProvider`] for its headers. The
//! provider owns the auth cookie and refreshes it when it expires.

use crate::utils::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, SET_COOKIE};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Cookie carrying the access-token expiry (URL-encoded RFC 3339)
pub const EXPIRY_COOKIE: &str = "accessTokenExpirationTime";

/// Supplies headers for booking API requests
#[async_trait]
pub trait HeaderProvider: Send + Sync {
    async fn headers(&self) -> Result<HeaderMap, FetchError>;
}

/// Build the JSON API headers shared by every request
///
/// # Arguments
///
/// * `cookie` - Raw `Cookie` header value, skipped when empty
///
/// # Errors
///
/// Returns `FetchError::Credentials` if the cookie is not a valid header value
pub fn build_api_headers(cookie: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("it-IT,it;q=0.9,en-US;q=0.8,en;q=0.7"),
    );

    if !cookie.is_empty() {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| FetchError::Credentials(format!("invalid cookie header: {e}")))?;
        headers.insert(COOKIE, value);
    }

    Ok(headers)
}

/// Fixed cookie string, e.g. from configuration
#[derive(Debug, Clone)]
pub struct StaticHeaders {
    headers: HeaderMap,
}

impl StaticHeaders {
    pub fn new(cookie: Option<&str>) -> Result<Self, FetchError> {
        Ok(Self {
            headers: build_api_headers(cookie.unwrap_or_default())?,
        })
    }
}

#[async_trait]
impl HeaderProvider for StaticHeaders {
    async fn headers(&self) -> Result<HeaderMap, FetchError> {
        Ok(self.headers.clone())
    }
}

// ============================================================================
// Refreshing cookie jar
// ============================================================================

/// Produces a fresh `Cookie` header value
#[async_trait]
pub trait CookieSource: Send + Sync {
    async fn fetch_cookies(&self) -> Result<String, FetchError>;
}

/// Time source for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Read the access-token expiry out of a cookie string.
///
/// Returns `None` when the cookie is missing or not a valid timestamp.
pub fn cookie_expiry(cookies: &str) -> Option<DateTime<Utc>> {
    let raw = cookies
        .split("; ")
        .find_map(|pair| pair.strip_prefix(EXPIRY_COOKIE)?.strip_prefix('='))?;

    // form_urlencoded yields the whole value as a key when there is no '='
    let decoded = url::form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())?;

    DateTime::parse_from_rfc3339(&decoded)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Caches a cookie and refreshes it through a [`CookieSource`] once the
/// access token has expired. A cookie without a readable expiry counts as
/// expired.
pub struct CookieJarProvider<C: Clock = SystemClock> {
    source: Arc<dyn CookieSource>,
    clock: C,
    cookies: Mutex<String>,
}

impl CookieJarProvider<SystemClock> {
    /// Fetch the first cookie eagerly.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Credentials` if the source cannot produce cookies
    pub async fn connect(source: Arc<dyn CookieSource>) -> Result<Self, FetchError> {
        Self::connect_with_clock(source, SystemClock).await
    }
}

impl<C: Clock> CookieJarProvider<C> {
    pub async fn connect_with_clock(
        source: Arc<dyn CookieSource>,
        clock: C,
    ) -> Result<Self, FetchError> {
        info!("Retrieving booking cookies");
        let cookies = source.fetch_cookies().await?;
        Ok(Self {
            source,
            clock,
            cookies: Mutex::new(cookies),
        })
    }

    pub fn is_expired(&self, cookies: &str) -> bool {
        match cookie_expiry(cookies) {
            Some(expiry) => self.clock.now() > expiry,
            None => true,
        }
    }

    /// Current cookie string, refreshed if expired
    pub async fn cookies(&self) -> Result<String, FetchError> {
        let mut cookies = self.cookies.lock().await;
        if self.is_expired(&cookies) {
            info!("Booking cookies expired, refreshing");
            *cookies = self.source.fetch_cookies().await?;
        }
        Ok(cookies.clone())
    }
}

#[async_trait]
impl<C: Clock> HeaderProvider for CookieJarProvider<C> {
    async fn headers(&self) -> Result<HeaderMap, FetchError> {
        let cookies = self.cookies().await?;
        build_api_headers(&cookies)
    }
}

/// Collects the `Set-Cookie` headers of a plain GET against the site root
pub struct HttpCookieSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCookieSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CookieSource for HttpCookieSource {
    async fn fetch_cookies(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Credentials(e.to_string()))?;

        let pairs: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(|pair| pair.trim().to_string())
            .filter(|pair| !pair.is_empty())
            .collect();

        if pairs.is_empty() {
            return Err(FetchError::Credentials(format!(
                "no cookies set by {}",
                self.url
            )));
        }

        debug!(count = pairs.len(), "Collected booking cookies");
        Ok(pairs.join("; "))
    }
}
