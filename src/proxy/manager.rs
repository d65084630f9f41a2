//! Proxy manager: one heap built from a proxy source

use super::{ProxyElement, ProxyHeap, ProxySource, ScoreAlgorithm};
use crate::utils::error::ProxyError;
use std::sync::Arc;
use tracing::{info, warn};

/// Owns the proxy heap for one run
#[derive(Debug, Clone)]
pub struct ProxyManager {
    heap: ProxyHeap,
}

impl ProxyManager {
    /// Fetch the proxy list and build the heap.
    ///
    /// # Errors
    ///
    /// Fails when the source is unreachable or returns malformed data. An
    /// empty list is not an error.
    pub async fn new<A>(source: &dyn ProxySource, algo: A) -> Result<Self, ProxyError>
    where
        A: ScoreAlgorithm,
    {
        let proxies = source.get_proxies().await?;
        if proxies.is_empty() {
            warn!("Proxy source returned no proxies");
        }

        Ok(Self::from_elements(
            proxies.into_iter().map(ProxyElement::new).collect(),
            Arc::new(algo),
        ))
    }

    /// Build directly from prepared elements
    pub fn from_elements(elements: Vec<ProxyElement>, algo: Arc<dyn ScoreAlgorithm>) -> Self {
        let heap = ProxyHeap::build(elements, algo);
        info!(proxies = heap.len(), "Proxy heap built");
        Self { heap }
    }

    /// Up to `n` best proxies, best first
    pub fn best_proxies(&self, n: usize) -> Vec<ProxyElement> {
        self.heap.peek_best_n(n)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
