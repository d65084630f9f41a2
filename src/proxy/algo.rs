//! Proxy scoring
//!
//! A [`ScoreAlgorithm`] turns a proxy's published quality signals plus how
//! long it has rested since its last use into an integer score. Higher is
//! better. The heap only ever calls through the trait, so scoring strategies
//! can be swapped without touching it.

use super::Proxy;
use chrono::Utc;

/// Scoring contract used by [`super::ProxyHeap`]
pub trait ScoreAlgorithm: Send + Sync + 'static {
    /// Score `proxy` given the seconds elapsed since it was last handed out
    fn score(&self, proxy: &Proxy, secs_since_last_use: i64) -> i64;
}

/// Weighted sum of normalized quality signals, scaled by 1000
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScore;

impl WeightedScore {
    const LATENCY: f64 = 0.25;
    const UPTIME: f64 = 0.20;
    const SUCCESS: f64 = 0.20;
    const LAST_CHECKED: f64 = 0.10;
    const RESPONSE_TIME: f64 = 0.10;
    const LAST_USED: f64 = 0.10;
    const SPEED: f64 = 0.05;

    /// Score against an explicit clock (unix seconds)
    pub fn score_at(&self, proxy: &Proxy, secs_since_last_use: i64, now: i64) -> i64 {
        let latency = 1.0 / (1.0 + proxy.latency.max(0.0));
        let uptime = proxy.up_time / 100.0;
        let success = proxy.success_ratio();
        let last_checked = if now > 0 {
            proxy.last_checked as f64 / now as f64
        } else {
            0.0
        };
        let response_time = 1.0 / (1.0 + proxy.response_time as f64);
        let rested_hours = secs_since_last_use.max(0) as f64 / 3600.0;
        let speed = f64::from(proxy.speed) / 10.0;

        let score = Self::LATENCY * latency
            + Self::UPTIME * uptime
            + Self::SUCCESS * success
            + Self::LAST_CHECKED * last_checked
            + Self::RESPONSE_TIME * response_time
            + Self::LAST_USED * rested_hours
            + Self::SPEED * speed;

        (score * 1000.0) as i64
    }
}

impl ScoreAlgorithm for WeightedScore {
    fn score(&self, proxy: &Proxy, secs_since_last_use: i64) -> i64 {
        self.score_at(proxy, secs_since_last_use, Utc::now().timestamp())
    }
}
