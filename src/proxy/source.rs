//! Proxy list sources

use super::{Proxy, ProxyResponse};
use crate::utils::error::ProxyError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Provides the candidate proxy list
#[async_trait]
pub trait ProxySource: Send + Sync {
    async fn get_proxies(&self) -> Result<Vec<Proxy>, ProxyError>;
}

/// Parse a `{data, total, page, limit}` proxy-list body
pub fn parse_proxy_list(body: &str) -> Result<Vec<Proxy>, ProxyError> {
    let response: ProxyResponse =
        serde_json::from_str(body).map_err(|e| ProxyError::Malformed(e.to_string()))?;
    Ok(response.data)
}

/// Public proxy-list HTTP API (geonode format)
pub struct GeonodeProxySource {
    client: reqwest::Client,
    url: String,
}

impl GeonodeProxySource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::SourceUnreachable(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ProxySource for GeonodeProxySource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn get_proxies(&self) -> Result<Vec<Proxy>, ProxyError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ProxyError::SourceUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::SourceUnreachable(format!(
                "status {} from proxy list",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProxyError::SourceUnreachable(e.to_string()))?;
        debug!(bytes = body.len(), "Proxy list downloaded");

        let proxies = parse_proxy_list(&body)?;
        info!(count = proxies.len(), "Proxy list parsed");
        Ok(proxies)
    }
}

/// Fixed in-memory list
#[derive(Debug, Clone, Default)]
pub struct StaticProxySource {
    proxies: Vec<Proxy>,
}

impl StaticProxySource {
    pub fn new(proxies: Vec<Proxy>) -> Self {
        Self { proxies }
    }
}

#[async_trait]
impl ProxySource for StaticProxySource {
    async fn get_proxies(&self) -> Result<Vec<Proxy>, ProxyError> {
        Ok(self.proxies.clone())
    }
}
