//! Persistence sink tests

use chrono::Utc;
use seatwatch::config::{PersistenceBackend, PersistenceConfig};
use seatwatch::models::SeatLogEntry;
use seatwatch::storage::{self, FilePersistence, Persistence};
use std::sync::Arc;

fn entry(session_id: &str, seats: u32) -> SeatLogEntry {
    SeatLogEntry {
        cinema_name: "Vimercate".to_string(),
        film_name: "Second Film".to_string(),
        session_id: session_id.to_string(),
        seats,
        logged_at: Utc::now(),
        start_hour: "20:30".to_string(),
    }
}

fn file_config(path: std::path::PathBuf) -> PersistenceConfig {
    PersistenceConfig {
        backend: PersistenceBackend::File,
        file_path: path,
        postgres_url: String::new(),
        pool_size: 1,
    }
}

/// The file backend creates missing directories and appends in order
#[tokio::test]
async fn test_open_file_backend_appends_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("seat_log.jsonl");

    let sink = storage::open(&file_config(path.clone())).await.unwrap();
    sink.write_session_seats(&entry("93000", 12)).await.unwrap();
    sink.write_session_seats(&entry("93001", 40)).await.unwrap();

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["sessionId"], "93000");
    assert_eq!(first["seats"], 12);
    assert_eq!(first["cinemaName"], "Vimercate");
    assert_eq!(first["startHour"], "20:30");
    assert!(first["loggedAt"].is_string());
}

/// Existing content is never truncated
#[tokio::test]
async fn test_file_sink_keeps_existing_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seat_log.jsonl");
    tokio::fs::write(&path, "{\"previous\":true}\n").await.unwrap();

    let sink = FilePersistence::new(&path);
    sink.write_session_seats(&entry("93002", 7)).await.unwrap();

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.starts_with("{\"previous\":true}\n"));
}

/// Concurrent writers sharing one sink produce whole, parseable lines
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_do_not_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seat_log.jsonl");
    let sink: Arc<dyn Persistence> = Arc::new(FilePersistence::new(&path));

    let handles: Vec<_> = (0..50u32)
        .map(|i| {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move {
                sink.write_session_seats(&entry(&format!("9{i:04}"), i))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let content = tokio::fs::read_to_string(&path).await.unwrap();
    let mut ids: Vec<String> = content
        .lines()
        .map(|line| serde_json::from_str::<SeatLogEntry>(line).unwrap().session_id)
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 50);
}

/// An unreachable database fails at open time
#[tokio::test]
async fn test_open_postgres_backend_unreachable() {
    let config = PersistenceConfig {
        backend: PersistenceBackend::Postgres,
        file_path: Default::default(),
        postgres_url: "postgresql://seatwatch@127.0.0.1:1/seatwatch".to_string(),
        pool_size: 1,
    };
    assert!(storage::open(&config).await.is_err());
}
