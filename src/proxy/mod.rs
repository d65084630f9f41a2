//! Scored proxy selection
//!
//! Proxies come from an external [`ProxySource`], are scored by a pluggable
//! [`ScoreAlgorithm`] and kept in a [`ProxyHeap`]. The [`ProxyManager`] hands
//! out the best N; each hand-out counts as a use, so repeated selections
//! rotate toward proxies that have rested longer.
//!
//! # Example
//!
//! ```rust,ignore
//! use seatwatch::proxy::{GeonodeProxySource, ProxyManager, WeightedScore};
//!
//! let source = GeonodeProxySource::new(&config.proxy.source_url, config.request_timeout())?;
//! let manager = ProxyManager::new(&source, WeightedScore).await?;
//! for element in manager.best_proxies(20) {
//!     println!("{} -> {}", element.proxy.address(), element.score);
//! }
//! ```

pub mod algo;
pub mod heap;
pub mod manager;
pub mod source;

use serde::{Deserialize, Serialize};

pub use algo::{ScoreAlgorithm, WeightedScore};
pub use heap::{ProxyElement, ProxyHeap};
pub use manager::ProxyManager;
pub use source::{parse_proxy_list, GeonodeProxySource, ProxySource, StaticProxySource};

/// One proxy as published by the proxy-list API. Never mutated after parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Proxy {
    #[serde(rename = "_id")]
    pub id: String,
    pub ip: String,
    pub port: String,
    pub protocols: Vec<String>,

    /// Latency in milliseconds
    pub latency: f64,
    /// Uptime percentage, 0-100
    pub up_time: f64,
    pub up_time_success_count: u64,
    pub up_time_try_count: u64,
    /// Unix seconds of the upstream health check
    pub last_checked: i64,
    /// Response time in milliseconds
    pub response_time: u64,
    /// Coarse rating, 0-10
    pub speed: u32,

    pub anonymity_level: String,
    pub country: String,
    pub city: String,
    pub isp: String,
    pub org: String,
    pub asn: String,
    #[serde(rename = "created_at")]
    pub created_at: String,
    #[serde(rename = "updated_at")]
    pub updated_at: String,
}

impl Proxy {
    /// `ip:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// First advertised protocol, `http` when none is listed
    pub fn primary_protocol(&self) -> &str {
        self.protocols
            .first()
            .map(String::as_str)
            .filter(|p| !p.is_empty())
            .unwrap_or("http")
    }

    /// Successful health checks over attempted ones, 0 when never tried
    pub fn success_ratio(&self) -> f64 {
        if self.up_time_try_count == 0 {
            0.0
        } else {
            self.up_time_success_count as f64 / self.up_time_try_count as f64
        }
    }
}

/// Proxy-list payload: `{data, total, page, limit}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyResponse {
    pub data: Vec<Proxy>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub limit: u64,
}
