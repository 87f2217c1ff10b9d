//! Integration tests for the file-backed local store.

use round_robin_tracker::{
    CountChange, FileStore, FixtureAlgorithm, LocalStore, Tracker, TrackerConfig,
};
use std::fs;

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("tracker.json");

    let store = FileStore::open(&path);
    store.set("pairs-tracker:A", r#"{"participantCount":6,"completionMap":{}}"#).unwrap();
    store.set("scratch", "1").unwrap();
    store.remove("scratch").unwrap();

    let reopened = FileStore::open(&path);
    assert_eq!(
        reopened.get("pairs-tracker:A").unwrap().as_deref(),
        Some(r#"{"participantCount":6,"completionMap":{}}"#)
    );
    assert_eq!(reopened.get("scratch").unwrap(), None);
}

#[test]
fn corrupt_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.json");
    fs::write(&path, "{{{{").unwrap();

    let store = FileStore::open(&path);
    assert_eq!(store.get("anything").unwrap(), None);
    store.set("k", "v").unwrap();
    assert_eq!(FileStore::open(&path).get("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn tracker_sessions_share_a_data_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.json");
    let config = TrackerConfig {
        algorithm: FixtureAlgorithm::Combinatorial,
        data_file: path.clone(),
        ..TrackerConfig::default()
    };

    {
        let mut tracker = Tracker::new(config.clone(), Box::new(FileStore::open(&path)));
        tracker.switch_league("C").unwrap();
        tracker.change_participants(CountChange::Value(7)).unwrap();
        tracker.toggle("6-7").unwrap();
    }

    let mut tracker = Tracker::new(config, Box::new(FileStore::open(&path)));
    let view = tracker.view();
    assert_eq!(view.active.as_str(), "C");
    assert_eq!(view.league.participant_count, 7);
    assert_eq!(view.league.progress.completed, 1);
    assert_eq!(view.league.progress.total, 21);
}
