pub mod fetch;
pub mod init_db;
pub mod today;

// Re-export command functions for convenience
pub use fetch::fetch;
pub use init_db::init_db;
pub use today::today;

use anyhow::{Context, Result};
use std::sync::Arc;

use seatwatch::config::Config;
use seatwatch::crawler::{
    ClientPool, ClientSettings, CookieJarProvider, Extractor, HeaderProvider, HttpCookieSource,
    HttpExtractor, StaticHeaders,
};
use seatwatch::proxy::{GeonodeProxySource, ProxyManager, WeightedScore};
use seatwatch::utils::extract_host;

/// Header provider: the configured cookie, or cookies fetched from the site
async fn header_provider(config: &Config) -> Result<Arc<dyn HeaderProvider>> {
    match config.credentials.cookie.as_deref() {
        Some(cookie) => Ok(Arc::new(
            StaticHeaders::new(Some(cookie)).context("Invalid cookie")?,
        )),
        None => {
            let source = HttpCookieSource::new(&config.endpoints.base_url, config.request_timeout())
                .context("Failed to create cookie source")?;
            let provider = CookieJarProvider::connect(Arc::new(source))
                .await
                .context("Failed to obtain session cookies")?;
            Ok(Arc::new(provider))
        }
    }
}

/// Outbound extractor for a run: the proxy-backed client pool, or one direct
/// client when proxies are disabled
pub async fn build_extractor(config: &Config, no_proxy: bool) -> Result<Arc<dyn Extractor>> {
    let host = extract_host(&config.endpoints.base_url)?;
    let headers = header_provider(config).await?;
    let settings = ClientSettings::from_config(config);

    if no_proxy || !config.proxy.enabled {
        tracing::info!(host = %host, "Using a direct connection");
        let extractor = HttpExtractor::direct(&settings, headers, config.endpoints.clone())
            .context("Failed to create HTTP client")?;
        return Ok(Arc::new(extractor));
    }

    let source = GeonodeProxySource::new(&config.proxy.source_url, config.request_timeout())
        .context("Failed to create proxy source")?;
    let manager = ProxyManager::new(&source, WeightedScore)
        .await
        .context("Failed to load proxies")?;
    let pool = ClientPool::new(
        config.crawler.pool_size,
        &manager,
        headers,
        &config.endpoints,
        &settings,
        config.proxy.fallback,
    )
    .context("Failed to build client pool")?;

    tracing::info!(host = %host, clients = pool.size(), "Using proxy client pool");
    Ok(Arc::new(pool))
}
