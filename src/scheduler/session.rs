//! Per-session re-check timers
//!
//! Every scheduled session gets one timer firing a short, jittered while
//! after the session starts. Timers are independent tasks: a session that
//! cannot be parsed or whose fire time has passed is skipped on its own, and
//! nothing is retried or cancelled once scheduled.

use super::error::{SchedulerError, SchedulerResult};
use crate::config::SchedulerConfig;
use crate::models::ScheduledSession;
use crate::utils::local_datetime;
use chrono::{DateTime, Local};
use futures::future::join_all;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome counts of one scheduling run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleStats {
    pub scheduled: u64,
    pub skipped_past: u64,
    pub skipped_unparseable: u64,
    pub fired: u64,
}

impl ScheduleStats {
    pub fn total(&self) -> u64 {
        self.scheduled + self.skipped_past + self.skipped_unparseable
    }
}

/// Computes fire times and drives the timers
pub struct SessionScheduler {
    base_offset: Duration,
    jitter_min_ms: u64,
    jitter_max_ms: u64,
    rng: Mutex<ChaCha8Rng>,
}

impl SessionScheduler {
    /// Scheduler seeded from `config.seed`, or from OS entropy when unset
    pub fn new(config: &SchedulerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: &SchedulerConfig, rng: ChaCha8Rng) -> Self {
        Self {
            base_offset: Duration::from_secs(config.base_offset_secs),
            jitter_min_ms: config.jitter_min_ms.min(config.jitter_max_ms),
            jitter_max_ms: config.jitter_max_ms.max(config.jitter_min_ms),
            rng: Mutex::new(rng),
        }
    }

    /// Next random jitter, uniform in the configured bounds
    pub fn jitter(&self) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Duration::from_millis(rng.gen_range(self.jitter_min_ms..=self.jitter_max_ms))
    }

    /// Fire time of `session` on `date`: start hour plus base offset plus jitter.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidStartHour` if the start hour does not
    /// form a valid local time on `date`
    pub fn target_time(
        &self,
        date: &str,
        session: &ScheduledSession,
    ) -> SchedulerResult<DateTime<Local>> {
        let start_hour = &session.session.start_hour;
        let start = local_datetime(date, start_hour).ok_or_else(|| {
            SchedulerError::invalid_start_hour(&session.session.session_id, start_hour)
        })?;
        Ok(start + self.base_offset + self.jitter())
    }

    /// Schedule every session of `date` relative to the current time
    pub async fn run<F, Fut>(
        &self,
        date: &str,
        sessions: Vec<ScheduledSession>,
        callback: F,
    ) -> ScheduleStats
    where
        F: Fn(ScheduledSession) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.run_at(date, sessions, Local::now(), callback).await
    }

    /// Schedule every session of `date`, taking `now` as the current time.
    ///
    /// Returns once every launched timer has fired and its callback returned.
    pub async fn run_at<F, Fut>(
        &self,
        date: &str,
        sessions: Vec<ScheduledSession>,
        now: DateTime<Local>,
        callback: F,
    ) -> ScheduleStats
    where
        F: Fn(ScheduledSession) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback = Arc::new(callback);
        let fired = Arc::new(AtomicU64::new(0));
        let mut stats = ScheduleStats::default();
        let mut timers = Vec::with_capacity(sessions.len());

        for session in sessions {
            let target = match self.target_time(date, &session) {
                Ok(target) => target,
                Err(e) => {
                    warn!(error = %e, "Skipping session");
                    stats.skipped_unparseable += 1;
                    continue;
                }
            };

            let Ok(delay) = (target - now).to_std() else {
                debug!(
                    session_id = %session.session.session_id,
                    target = %target.format("%H:%M:%S%.3f"),
                    "Fire time already passed, skipping session"
                );
                stats.skipped_past += 1;
                continue;
            };

            debug!(
                session_id = %session.session.session_id,
                cinema = %session.cinema_name,
                film = %session.film_name,
                target = %target.format("%H:%M:%S%.3f"),
                "Session scheduled"
            );
            stats.scheduled += 1;

            let callback = Arc::clone(&callback);
            let fired = Arc::clone(&fired);
            timers.push(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                callback(session).await;
                fired.fetch_add(1, Ordering::Relaxed);
            }));
        }

        info!(
            date,
            scheduled = stats.scheduled,
            skipped_past = stats.skipped_past,
            skipped_unparseable = stats.skipped_unparseable,
            "Timers launched"
        );

        for joined in join_all(timers).await {
            if let Err(e) = joined {
                warn!(error = %e, "Session timer aborted");
            }
        }

        stats.fired = fired.load(Ordering::Relaxed);
        info!(date, fired = stats.fired, "All session timers finished");
        stats
    }
}
