//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::path::{Path, PathBuf};
use url::Url;

/// Today's local date as `YYYY-MM-DD`
pub fn today_string() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Output file name for a catalog fetch, e.g. `showings_20250915_203000.json`
pub fn showings_filename(at: DateTime<Local>) -> String {
    format!("showings_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Snapshot file for a given date inside `dir`
pub fn snapshot_path(dir: &Path, date: &str) -> PathBuf {
    dir.join(format!("today-sessions-{date}.json"))
}

/// Interpret `date` and `HH:MM` as a local wall-clock instant.
///
/// Returns `None` when either part fails to parse or the local time does not
/// exist (DST gap). Ambiguous times resolve to the earlier instant.
pub fn local_datetime(date: &str, hour_minute: &str) -> Option<DateTime<Local>> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = chrono::NaiveTime::parse_from_str(hour_minute, "%H:%M").ok()?;
    Local.from_local_datetime(&day.and_time(time)).earliest()
}

/// Extract host from URL
pub fn extract_host(url: &str) -> Result<String> {
    let parsed = Url::parse(url).context("Invalid URL")?;

    parsed
        .host_str()
        .map(|s| s.to_string())
        .context("No host in URL")
}
