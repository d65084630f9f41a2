//! Pool of proxy-bound clients
//!
//! The pool is a bounded channel holding every [`ScoredClient`]. Borrowing
//! receives one, releasing sends it back, so a client is never held by two
//! callers at once and borrowers block while the pool is exhausted.

use super::client::{ClientSettings, Extractor, HttpExtractor};
use super::headers::HeaderProvider;
use crate::config::{EndpointConfig, FallbackPolicy};
use crate::models::{CinemasResponse, FilmsResponse, SeatResponse, ShowingResponse};
use crate::proxy::{Proxy, ProxyManager};
use crate::utils::error::{FetchError, ProxyError};
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Client bound to one proxy's transport; `proxy` is `None` for a direct client
#[derive(Clone)]
pub struct ScoredClient {
    pub extractor: HttpExtractor,
    pub proxy: Option<Arc<Proxy>>,
}

impl ScoredClient {
    /// `ip:port` of the proxy, or `direct`
    pub fn label(&self) -> String {
        self.proxy
            .as_ref()
            .map(|p| p.address())
            .unwrap_or_else(|| "direct".to_string())
    }
}

/// reqwest proxy for the proxy's first advertised protocol
///
/// # Errors
///
/// Returns `ProxyError::UnsupportedProtocol` for unknown schemes and
/// `ProxyError::Transport` if the proxy URL is rejected
pub fn transport_for_proxy(proxy: &Proxy) -> Result<reqwest::Proxy, ProxyError> {
    let addr = proxy.address();
    let url = match proxy.primary_protocol() {
        scheme @ ("http" | "https") => format!("{scheme}://{addr}"),
        "socks4" => format!("socks4://{addr}"),
        // resolve target hostnames on the proxy side
        "socks5" => format!("socks5h://{addr}"),
        other => return Err(ProxyError::UnsupportedProtocol(other.to_string())),
    };

    reqwest::Proxy::all(&url).map_err(|e| ProxyError::Transport {
        addr,
        reason: e.to_string(),
    })
}

/// Fixed-capacity pool of [`ScoredClient`]s
pub struct ClientPool {
    sender: mpsc::Sender<ScoredClient>,
    receiver: Mutex<mpsc::Receiver<ScoredClient>>,
    size: usize,
}

impl ClientPool {
    /// Build up to `capacity` clients from the best proxies.
    ///
    /// Proxies whose transport cannot be built are skipped. When no client
    /// could be built, `fallback` decides between one direct client and
    /// `ProxyError::NoProxies`.
    pub fn new(
        capacity: usize,
        manager: &ProxyManager,
        headers: Arc<dyn HeaderProvider>,
        endpoints: &EndpointConfig,
        settings: &ClientSettings,
        fallback: FallbackPolicy,
    ) -> Result<Self, ProxyError> {
        let mut clients = Vec::with_capacity(capacity);

        for element in manager.best_proxies(capacity) {
            let proxy = Arc::clone(&element.proxy);
            let transport = match transport_for_proxy(&proxy) {
                Ok(transport) => transport,
                Err(e) => {
                    warn!(proxy = %proxy.address(), error = %e, "Skipping proxy");
                    continue;
                }
            };

            let client = match settings.build_client(Some(transport)) {
                Ok(client) => client,
                Err(e) => {
                    warn!(proxy = %proxy.address(), error = %e, "Skipping proxy");
                    continue;
                }
            };

            debug!(
                proxy = %proxy.address(),
                protocols = ?proxy.protocols,
                score = element.score,
                "Created pooled client"
            );
            clients.push(ScoredClient {
                extractor: HttpExtractor::new(client, Arc::clone(&headers), endpoints.clone())
                    .with_rate_limit(settings.rate_limit),
                proxy: Some(proxy),
            });
        }

        if clients.is_empty() {
            match fallback {
                FallbackPolicy::Direct => {
                    warn!("No usable proxies, falling back to a direct connection");
                    let extractor = HttpExtractor::direct(settings, headers, endpoints.clone())
                        .map_err(|e| ProxyError::Transport {
                            addr: "direct".to_string(),
                            reason: e.to_string(),
                        })?;
                    clients.push(ScoredClient {
                        extractor,
                        proxy: None,
                    });
                }
                FallbackPolicy::Fail => return Err(ProxyError::NoProxies),
            }
        }

        let pool = Self::from_clients(clients);
        info!(size = pool.size(), requested = capacity, "Client pool ready");
        Ok(pool)
    }

    /// Pool over prepared clients; capacity is the number of clients
    pub fn from_clients(clients: Vec<ScoredClient>) -> Self {
        let size = clients.len();
        let (sender, receiver) = mpsc::channel(size.max(1));
        for client in clients {
            // capacity equals the client count, so this never fails
            let _ = sender.try_send(client);
        }

        Self {
            sender,
            receiver: Mutex::new(receiver),
            size,
        }
    }

    /// Number of clients owned by the pool
    pub fn size(&self) -> usize {
        self.size
    }

    /// Clients currently idle
    pub fn available(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Wait for an idle client. The guard returns it on drop.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::PoolClosed` if the pool holds no clients
    pub async fn borrow(&self) -> Result<PooledClient<'_>, FetchError> {
        if self.size == 0 {
            return Err(FetchError::PoolClosed("no clients".to_string()));
        }

        let client = self
            .receiver
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| FetchError::PoolClosed("channel closed".to_string()))?;

        debug!(client = %client.label(), "Borrowed client");
        Ok(PooledClient {
            client: Some(client),
            pool: self,
        })
    }

    /// Return a client to the idle set
    pub fn release(&self, client: ScoredClient) {
        debug!(client = %client.label(), "Returned client");
        if let Err(e) = self.sender.try_send(client) {
            warn!(error = %e, "Client could not be returned to the pool");
        }
    }
}

/// Scoped borrow of a [`ScoredClient`]
pub struct PooledClient<'a> {
    client: Option<ScoredClient>,
    pool: &'a ClientPool,
}

impl Deref for PooledClient<'_> {
    type Target = ScoredClient;

    fn deref(&self) -> &Self::Target {
        // only taken in Drop
        self.client.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledClient<'_> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool.release(client);
        }
    }
}

#[async_trait]
impl Extractor for ClientPool {
    async fn call_showings(&self, url: &str) -> Result<ShowingResponse, FetchError> {
        let client = self.borrow().await?;
        client.extractor.call_showings(url).await
    }

    async fn call_seats(&self, url: &str) -> Result<SeatResponse, FetchError> {
        let client = self.borrow().await?;
        client.extractor.call_seats(url).await
    }

    async fn get_cinemas(&self) -> Result<CinemasResponse, FetchError> {
        let client = self.borrow().await?;
        client.extractor.get_cinemas().await
    }

    async fn get_films(&self) -> Result<FilmsResponse, FetchError> {
        let client = self.borrow().await?;
        client.extractor.get_films().await
    }
}
