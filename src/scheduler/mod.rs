//! Session-timed seat re-checks
//!
//! A scheduling run turns today's showings into one timer per session. Each
//! timer fires a fixed offset plus random jitter after its session starts and
//! hands the session to a caller-supplied callback, usually a [`SeatChecker`].
//!
//! # Run
//!
//! ```text
//!   Bootstrap ──▶ Flatten ──▶ Schedule ──▶ Await
//!   (snapshot)   (sessions)   (timers)    (all fired)
//! ```
//!
//! - **Bootstrap** reuses `today-sessions-YYYY-MM-DD.json` when present,
//!   otherwise fetches every cinema's showings for the day and saves them.
//! - **Flatten** produces one [`ScheduledSession`](crate::models::ScheduledSession)
//!   per session.
//! - **Schedule** computes `start + base offset + jitter` per session. Sessions
//!   whose start hour cannot be parsed, or whose fire time has passed, are
//!   skipped.
//! - **Await** returns once every timer has fired and its callback returned.
//!
//! # Modules
//!
//! - [`snapshot`] - Snapshot stores and the bootstrap fetch
//! - [`session`] - Fire-time computation and timers
//! - [`checker`] - Seat re-check callback
//! - [`error`] - Scheduler error types
//!
//! # Quick Start
//!
//! ```ignore
//! use seatwatch::scheduler::{bootstrap, flatten, FileSnapshotStore, SeatChecker, SessionScheduler};
//!
//! let showings = bootstrap(&store, &fetcher, &date).await?;
//! let scheduler = SessionScheduler::new(&config.scheduler);
//! let stats = scheduler
//!     .run(&date, flatten(showings), Arc::new(checker).callback())
//!     .await;
//! ```

pub mod checker;
pub mod error;
pub mod session;
pub mod snapshot;

pub use checker::SeatChecker;
pub use error::{SchedulerError, SchedulerResult};
pub use session::{ScheduleStats, SessionScheduler};
pub use snapshot::{
    bootstrap, flatten, FileSnapshotStore, MemorySnapshotStore, SnapshotStore, TodayFetcher,
};
