// Core data structures for seatwatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Domain records
// ============================================================================

/// One session of a film at a cinema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub session_id: String,
    pub start_hour: String,         // "HH:MM", derived from start_time
    pub rounded_start_hour: String, // "HH"
    pub seats: u32,                 // occupied seats
    pub total_seats: u32,
    pub start_time: String, // raw "YYYY-MM-DDTHH:MM:SS"
}

impl Session {
    /// Derive `start_hour` and `rounded_start_hour` from the raw start timestamp.
    ///
    /// Returns `false` and leaves the fields untouched when the timestamp has no
    /// date/time separator or no `HH:MM` component.
    pub fn derive_start_hour(&mut self) -> bool {
        match split_start_time(&self.start_time) {
            Some((hour, minute)) => {
                self.start_hour = format!("{hour}:{minute}");
                self.rounded_start_hour = hour.to_string();
                true
            }
            None => false,
        }
    }

    /// Merge a seat response into this session
    pub fn apply_seats(&mut self, seats: &SeatResponse) {
        self.total_seats = seats.total_seats();
        self.seats = seats.occupied_seats();
    }
}

/// Split `"2025-09-15T20:30:00"` into `("20", "30")`
fn split_start_time(start_time: &str) -> Option<(&str, &str)> {
    let mut parts = start_time.split('T');
    let _date = parts.next()?;
    let time = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let mut time_parts = time.split(':');
    let hour = time_parts.next()?;
    let minute = time_parts.next()?;
    Some((hour, minute))
}

/// Sessions grouped by showing date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowingGroup {
    pub date: String,
    pub sessions: Vec<Session>,
}

/// One film's showing calendar at one cinema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShowingResult {
    #[serde(rename = "movie")]
    pub film_title: String,
    pub film_id: String,
    pub cinema_id: String,
    pub cinema_name: String,
    pub showing_groups: Vec<ShowingGroup>,
}

impl ShowingResult {
    /// Sentinel for "results exist but nothing is scheduled"
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the session-less sentinel
    pub fn is_empty_sentinel(&self) -> bool {
        self.film_id.is_empty()
    }

    /// All session ids across every showing group
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions().map(|s| s.session_id.clone()).collect()
    }

    /// Iterate over every session
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.showing_groups.iter().flat_map(|g| g.sessions.iter())
    }

    /// Iterate mutably over every session
    pub fn sessions_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.showing_groups
            .iter_mut()
            .flat_map(|g| g.sessions.iter_mut())
    }

    /// Merge per-session seat counts and derive start hours.
    ///
    /// Sessions missing from `booking` keep their previous counts.
    pub fn aggregate_booking(&mut self, booking: &HashMap<String, SeatResponse>) {
        for session in self.sessions_mut() {
            if let Some(seats) = booking.get(&session.session_id) {
                session.apply_seats(seats);
            }
            session.derive_start_hour();
        }
    }

    /// Derive start hours without touching seat counts
    pub fn derive_start_hours(&mut self) {
        for session in self.sessions_mut() {
            session.derive_start_hour();
        }
    }

    /// Flatten into one scheduled session per session
    pub fn to_scheduled_sessions(&self) -> Vec<ScheduledSession> {
        self.sessions()
            .map(|session| ScheduledSession {
                session: session.clone(),
                cinema_id: self.cinema_id.clone(),
                cinema_name: self.cinema_name.clone(),
                film_id: self.film_id.clone(),
                film_name: self.film_title.clone(),
            })
            .collect()
    }
}

/// Flatten many showing results
pub fn flatten_showings(showings: &[ShowingResult]) -> Vec<ScheduledSession> {
    showings
        .iter()
        .flat_map(ShowingResult::to_scheduled_sessions)
        .collect()
}

/// A (cinema, film) pair, the unit of catalog fetch work
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    pub cinema_id: String,
    pub film_id: String,
}

impl WorkItem {
    pub fn new(cinema_id: impl Into<String>, film_id: impl Into<String>) -> Self {
        Self {
            cinema_id: cinema_id.into(),
            film_id: film_id.into(),
        }
    }
}

/// Denormalized session used by the timer scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledSession {
    pub session: Session,
    pub cinema_id: String,
    pub cinema_name: String,
    pub film_id: String,
    pub film_name: String,
}

/// Persisted observation of seat occupancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatLogEntry {
    pub cinema_name: String,
    pub film_name: String,
    pub session_id: String,
    pub seats: u32,
    pub logged_at: DateTime<Utc>,
    pub start_hour: String,
}

impl SeatLogEntry {
    /// Build an entry for a session observed now
    pub fn observe(session: &ScheduledSession, seats: u32) -> Self {
        Self {
            cinema_name: session.cinema_name.clone(),
            film_name: session.film_name.clone(),
            session_id: session.session.session_id.clone(),
            seats,
            logged_at: Utc::now(),
            start_hour: session.session.start_hour.clone(),
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Showings endpoint payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowingResponse {
    pub result: Vec<FilmShowings>,
}

/// One film entry of the showings payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilmShowings {
    pub film_id: String,
    pub film_title: String,
    pub showing_groups: Vec<ShowingGroup>,
}

/// Seats endpoint payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatResponse {
    pub result: SeatMap,
}

/// Seat grid plus occupancy fraction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeatMap {
    pub seat_rows: Vec<SeatRow>,
    pub session_occupancy: f64,
}

/// One row of the booking grid; `None` cells are gaps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatRow {
    pub columns: Vec<Option<Seat>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Seat {
    pub seat_status: i32,
}

impl SeatResponse {
    /// Count of non-null seat cells
    pub fn total_seats(&self) -> u32 {
        self.result
            .seat_rows
            .iter()
            .map(|row| row.columns.iter().filter(|c| c.is_some()).count() as u32)
            .sum()
    }

    /// floor(occupancy × total)
    pub fn occupied_seats(&self) -> u32 {
        let total = self.total_seats() as f64;
        let occupancy = self.result.session_occupancy.clamp(0.0, 1.0);
        (occupancy * total).floor() as u32
    }
}

/// Cinemas endpoint payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CinemasResponse {
    pub result: Vec<Region>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub cinemas: Vec<Cinema>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cinema {
    pub cinema_id: String,
    pub cinema_name: String,
}

/// Films endpoint payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilmsResponse {
    pub result: Vec<Film>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Film {
    pub film_id: String,
    pub film_title: String,
}
