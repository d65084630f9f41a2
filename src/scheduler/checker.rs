//! Seat re-check run when a session timer fires

use crate::config::EndpointConfig;
use crate::crawler::Extractor;
use crate::error::Result;
use crate::models::{ScheduledSession, SeatLogEntry};
use crate::storage::Persistence;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{error, info};

/// Re-fetches a session's seats and records the observation
pub struct SeatChecker {
    extractor: Arc<dyn Extractor>,
    endpoints: EndpointConfig,
    sink: Arc<dyn Persistence>,
}

impl SeatChecker {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        endpoints: EndpointConfig,
        sink: Arc<dyn Persistence>,
    ) -> Self {
        Self {
            extractor,
            endpoints,
            sink,
        }
    }

    /// Fetch current occupancy and write it through the sink
    ///
    /// # Errors
    ///
    /// Returns the fetch or storage error; nothing is written on fetch failure
    pub async fn check(&self, session: &ScheduledSession) -> Result<SeatLogEntry> {
        let url = self
            .endpoints
            .seats_url(&session.cinema_id, &session.session.session_id);
        let seats = self.extractor.call_seats(&url).await?;

        let entry = SeatLogEntry::observe(session, seats.occupied_seats());
        self.sink.write_session_seats(&entry).await?;

        info!(
            cinema = %entry.cinema_name,
            film = %entry.film_name,
            session_id = %entry.session_id,
            start_hour = %entry.start_hour,
            seats = entry.seats,
            "Seats recorded"
        );
        Ok(entry)
    }

    /// Timer callback that logs failures instead of returning them
    pub fn callback(
        self: Arc<Self>,
    ) -> impl Fn(ScheduledSession) -> BoxFuture<'static, ()> + Send + Sync + 'static {
        move |session| {
            let checker = Arc::clone(&self);
            Box::pin(async move {
                if let Err(e) = checker.check(&session).await {
                    error!(
                        session_id = %session.session.session_id,
                        cinema = %session.cinema_name,
                        category = e.category().label(),
                        error = %e,
                        "Seat re-check failed"
                    );
                }
            })
        }
    }
}
