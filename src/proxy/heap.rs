//! Binary max-heap of scored proxies
//!
//! Elements stay in the heap for the whole run. Selecting the best N marks
//! them as used and re-scores them in place, so subsequent selections drift
//! toward proxies that have rested.

use super::{Proxy, ScoreAlgorithm};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// A proxy plus its scheduling state inside the heap
#[derive(Debug, Clone)]
pub struct ProxyElement {
    pub proxy: Arc<Proxy>,
    /// Epoch for proxies never handed out
    pub last_used_at: DateTime<Utc>,
    pub score: i64,
    /// Position in the backing array
    pub heap_index: usize,
    slot: usize,
}

impl ProxyElement {
    pub fn new(proxy: Proxy) -> Self {
        Self::with_last_use(proxy, DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn with_last_use(proxy: Proxy, last_used_at: DateTime<Utc>) -> Self {
        Self {
            proxy: Arc::new(proxy),
            last_used_at,
            score: 0,
            heap_index: 0,
            slot: 0,
        }
    }

    fn rescore(&mut self, algo: &dyn ScoreAlgorithm, now: DateTime<Utc>) {
        let rested = (now - self.last_used_at).num_seconds();
        self.score = algo.score(&self.proxy, rested);
    }
}

// ============================================================================
// Heap state
// ============================================================================

struct HeapState {
    elements: Vec<ProxyElement>,
    // slot -> current heap index
    positions: Vec<usize>,
}

impl HeapState {
    fn higher(&self, i: usize, j: usize) -> bool {
        self.elements[i].score > self.elements[j].score
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.elements.swap(i, j);
        self.elements[i].heap_index = i;
        self.elements[j].heap_index = j;
        self.positions[self.elements[i].slot] = i;
        self.positions[self.elements[j].slot] = j;
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.higher(i, parent) {
                break;
            }
            self.swap(i, parent);
            i = parent;
        }
    }

    /// Returns true when the element moved
    fn sift_down(&mut self, start: usize) -> bool {
        let n = self.elements.len();
        let mut i = start;
        loop {
            let left = 2 * i + 1;
            if left >= n {
                break;
            }
            let mut child = left;
            let right = left + 1;
            if right < n && self.higher(right, left) {
                child = right;
            }
            if !self.higher(child, i) {
                break;
            }
            self.swap(i, child);
            i = child;
        }
        i > start
    }

    fn fix(&mut self, i: usize) {
        if i >= self.elements.len() {
            return;
        }
        if !self.sift_down(i) {
            self.sift_up(i);
        }
    }

    fn heapify(&mut self) {
        let n = self.elements.len();
        for i in (0..n / 2).rev() {
            self.sift_down(i);
        }
    }

    /// Heap indices of the `n` highest scores, best first
    fn top_n(&self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.elements.len()).collect();
        order.sort_by(|&a, &b| {
            self.elements[b]
                .score
                .cmp(&self.elements[a].score)
                .then(a.cmp(&b))
        });
        order.truncate(n);
        order
    }
}

// ============================================================================
// ProxyHeap
// ============================================================================

struct Inner {
    state: Mutex<HeapState>,
    algo: Arc<dyn ScoreAlgorithm>,
}

/// Max-heap of [`ProxyElement`]s ordered by score.
///
/// Cloning is cheap; clones share the same heap.
#[derive(Clone)]
pub struct ProxyHeap {
    inner: Arc<Inner>,
}

impl ProxyHeap {
    /// Score every element and heapify in place
    pub fn build(elements: Vec<ProxyElement>, algo: Arc<dyn ScoreAlgorithm>) -> Self {
        let now = Utc::now();
        let mut elements = elements;
        for (i, element) in elements.iter_mut().enumerate() {
            element.rescore(algo.as_ref(), now);
            element.heap_index = i;
            element.slot = i;
        }

        let positions = (0..elements.len()).collect();
        let mut state = HeapState {
            elements,
            positions,
        };
        state.heapify();

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                algo,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeapState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the backing array in heap order
    pub fn snapshot(&self) -> Vec<ProxyElement> {
        self.lock().elements.clone()
    }

    /// Return the `n` best elements without removing them.
    ///
    /// `n` is clamped to the heap size and the result is sorted by descending
    /// score. The returned elements are snapshots. Each one is then marked as
    /// used and re-scored: on a spawned task when called inside a tokio
    /// runtime, inline otherwise.
    pub fn peek_best_n(&self, n: usize) -> Vec<ProxyElement> {
        let picked: Vec<ProxyElement> = {
            let state = self.lock();
            let n = n.min(state.elements.len());
            state
                .top_n(n)
                .into_iter()
                .map(|i| state.elements[i].clone())
                .collect()
        };

        if picked.is_empty() {
            return picked;
        }

        let slots: Vec<usize> = picked.iter().map(|e| e.slot).collect();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let heap = self.clone();
                handle.spawn(async move { heap.mark_used(&slots) });
            }
            Err(_) => self.mark_used(&slots),
        }

        picked
    }

    /// Set `last_used_at = now` for the given slots, re-score and fix up
    fn mark_used(&self, slots: &[usize]) {
        let now = Utc::now();
        let algo = Arc::clone(&self.inner.algo);
        let mut state = self.lock();

        for &slot in slots {
            let Some(&index) = state.positions.get(slot) else {
                continue;
            };
            let element = &mut state.elements[index];
            element.last_used_at = now;
            element.rescore(algo.as_ref(), now);
            debug!(
                proxy = %element.proxy.address(),
                score = element.score,
                "Re-scored proxy after use"
            );
            state.fix(index);
        }
    }

    /// Restore heap order after the element at `index` changed score
    pub fn fix_after_score_change(&self, index: usize) {
        self.lock().fix(index);
    }

    /// Overwrite one element's score and restore heap order
    pub fn update_score(&self, index: usize, score: i64) {
        let mut state = self.lock();
        if let Some(element) = state.elements.get_mut(index) {
            element.score = score;
            state.fix(index);
        }
    }
}

impl std::fmt::Debug for ProxyHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyHeap")
            .field("len", &self.len())
            .finish()
    }
}
