//! Instrument discovery and supervisor lifecycle tests.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeQuotes, FakeSession, Reply, fixture, instrument, quote};
use serde_json::json;
use tempfile::TempDir;
use ticker_bots::engine::TickerEngine;
use ticker_bots::retry::RetryPolicy;
use ticker_bots::supervisor::{Supervisor, load_instruments};

fn config_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        std::fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

#[test]
fn test_load_instruments_skips_sample_and_malformed_sources() {
    let bitcoin = fixture("bitcoin.json");
    let pony = fixture("pony_nav.json");
    let dir = config_dir(&[
        ("sample.json", bitcoin.as_str()),
        ("b-bitcoin.json", bitcoin.as_str()),
        ("a-pony.json", pony.as_str()),
        ("broken.json", "{ not json"),
        ("no-token.json", fixture("missing_token.json").as_str()),
        ("notes.txt", "ignored"),
    ]);

    let instruments = load_instruments(dir.path()).unwrap();

    let names: Vec<&str> = instruments.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["pony-nav", "bitcoin"]);
}

#[test]
fn test_load_instruments_from_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");

    assert!(load_instruments(&missing).is_err());
}

#[test]
fn test_empty_directory_yields_no_instruments() {
    let dir = config_dir(&[]);

    assert!(load_instruments(dir.path()).unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_supervisor_stops_every_engine_on_shutdown() {
    let mut supervisor = Supervisor::new();
    let mut sessions = Vec::new();

    for name in ["bitcoin", "ethereum"] {
        let quotes = Arc::new(FakeQuotes::new().script(
            name,
            vec![Reply::Quote(quote("btc", 100.0, Some(1.0), Some(1.0)))],
        ));
        let session = Arc::new(FakeSession::default());
        sessions.push(session.clone());
        supervisor.spawn(TickerEngine::new(
            Arc::new(instrument(json!({ "name": name, "frequency": 10 }))),
            quotes,
            Arc::new(FakeQuotes::new()),
            session,
            RetryPolicy::default(),
        ));
    }
    assert_eq!(supervisor.len(), 2);

    tokio::time::sleep(Duration::from_secs(25)).await;
    supervisor.shutdown();
    supervisor.wait().await;

    assert!(supervisor.is_empty());
    for session in sessions {
        assert_eq!(session.closed_shards(), vec![0]);
        assert_eq!(session.statuses().len(), 2);
    }
}

#[tokio::test]
async fn test_failed_engine_does_not_affect_siblings() {
    let mut supervisor = Supervisor::new();
    let broken = Arc::new(FakeSession {
        failing_shard: Some(0),
        ..FakeSession::default()
    });
    let healthy = Arc::new(FakeSession::default());

    for session in [broken.clone(), healthy.clone()] {
        supervisor.spawn(TickerEngine::new(
            Arc::new(instrument(json!({}))),
            Arc::new(FakeQuotes::new()),
            Arc::new(FakeQuotes::new()),
            session,
            RetryPolicy::default(),
        ));
    }

    tokio::task::yield_now().await;
    supervisor.shutdown();
    supervisor.wait().await;

    assert_eq!(broken.closed_shards(), vec![0]);
    assert_eq!(healthy.closed_shards(), vec![0]);
}
