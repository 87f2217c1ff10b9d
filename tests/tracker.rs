//! Integration tests for the tracker: toggling, edit lock, clamping, persistence, and
//! remote reconciliation.

use round_robin_tracker::{
    ChangeKind, CompletionRow, CountChange, FixtureAlgorithm, LeagueLabel, LeagueState,
    LocalStore, MatchKey, MemoryStore, RemoteChange, RemoteEvent, RemoteWrite, SettingsRow,
    Tracker, TrackerConfig, TrackerError,
};
use uuid::Uuid;

fn config(algorithm: FixtureAlgorithm) -> TrackerConfig {
    TrackerConfig {
        algorithm,
        ..TrackerConfig::default()
    }
}

fn tracker_with(store: &MemoryStore, algorithm: FixtureAlgorithm) -> Tracker {
    Tracker::new(config(algorithm), Box::new(store.clone()))
}

fn label(s: &str) -> LeagueLabel {
    LeagueLabel::new(s)
}

fn remote_event(change: RemoteChange) -> RemoteEvent {
    RemoteEvent {
        origin: Uuid::new_v4(),
        change,
    }
}

#[test]
fn four_pairs_combinatorial_end_to_end() {
    let store = MemoryStore::new();
    let mut tracker = tracker_with(&store, FixtureAlgorithm::Combinatorial);

    let view = tracker.view();
    assert_eq!(view.active, label("A"));
    let keys: Vec<&str> = view.league.matches.iter().map(|m| m.key.as_str()).collect();
    assert_eq!(keys, vec!["1-2", "1-3", "1-4", "2-3", "2-4", "3-4"]);
    assert!(!view.league.locked);

    let writes = tracker.toggle("2-3").unwrap();
    let view = tracker.view();
    assert_eq!(view.league.progress.completed, 1);
    assert_eq!(view.league.progress.total, 6);
    assert_eq!(view.league.progress.percent, 17);
    assert!(view.league.locked);

    match writes.as_slice() {
        [RemoteWrite::Completions(rows)] => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].league, label("A"));
            assert_eq!(rows[0].match_key, MatchKey::from("2-3"));
            assert!(rows[0].completed);
        }
        other => panic!("unexpected writes: {other:?}"),
    }
}

#[test]
fn toggle_rejects_keys_outside_fixture_set() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::CircleMethod);
    assert_eq!(
        tracker.toggle("4-5"),
        Err(TrackerError::UnknownMatch("4-5".into()))
    );
}

#[test]
fn participant_change_is_rejected_while_locked() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::CircleMethod);
    tracker.toggle("1-2").unwrap();
    let before = tracker.view();

    assert_eq!(
        tracker.change_participants(CountChange::Delta(1)),
        Err(TrackerError::EditLocked)
    );
    assert_eq!(
        tracker.change_participants(CountChange::Value(10)),
        Err(TrackerError::EditLocked)
    );
    assert_eq!(tracker.view(), before);

    tracker.toggle("1-2").unwrap();
    let writes = tracker.change_participants(CountChange::Delta(1)).unwrap();
    assert_eq!(tracker.view().league.participant_count, 5);
    assert!(matches!(
        writes.as_slice(),
        [RemoteWrite::Settings(row)] if row.pair_count == 5 && row.league == label("A")
    ));
}

#[test]
fn participant_count_clamps_to_bounds() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::CircleMethod);

    tracker.change_participants(CountChange::Value(1)).unwrap();
    assert_eq!(tracker.view().league.participant_count, 2);

    let writes = tracker.change_participants(CountChange::Delta(-1)).unwrap();
    assert!(writes.is_empty());
    assert_eq!(tracker.view().league.participant_count, 2);

    tracker.change_participants(CountChange::Value(1_000)).unwrap();
    assert_eq!(tracker.view().league.participant_count, 100);
}

#[test]
fn reset_zeroes_every_key_of_the_fixture_set() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::CircleMethod);
    tracker.toggle("1-3").unwrap();
    tracker.toggle("2-4").unwrap();

    let writes = tracker.reset();
    let view = tracker.view();
    assert_eq!(view.league.progress.completed, 0);
    assert!(!view.league.locked);
    match writes.as_slice() {
        [RemoteWrite::Completions(rows)] => {
            assert_eq!(rows.len(), 6);
            assert!(rows.iter().all(|row| !row.completed));
        }
        other => panic!("unexpected writes: {other:?}"),
    }
}

#[test]
fn state_survives_a_new_session_and_algorithm_switch() {
    let store = MemoryStore::new();
    {
        let mut tracker = tracker_with(&store, FixtureAlgorithm::Combinatorial);
        tracker.switch_league("B").unwrap();
        tracker.change_participants(CountChange::Value(6)).unwrap();
        tracker.toggle("2-5").unwrap();
    }

    let mut tracker = tracker_with(&store, FixtureAlgorithm::CircleMethod);
    let view = tracker.view();
    assert_eq!(view.active, label("B"));
    assert_eq!(view.league.participant_count, 6);
    assert_eq!(view.league.progress.completed, 1);
    let toggled = view.league.matches.iter().find(|m| m.key.as_str() == "2-5").unwrap();
    assert!(toggled.completed);
}

#[test]
fn leagues_are_isolated() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::CircleMethod);
    tracker.toggle("1-2").unwrap();
    tracker.switch_league("C").unwrap();
    assert_eq!(tracker.view().league.progress.completed, 0);
    assert_eq!(tracker.league_view("A").unwrap().progress.completed, 1);
    assert_eq!(
        tracker.switch_league("Z"),
        Err(TrackerError::UnknownLeague("Z".into()))
    );
    assert_eq!(tracker.active(), &label("C"));
}

#[test]
fn corrupt_or_out_of_range_local_state_is_repaired_on_load() {
    let store = MemoryStore::new();
    store.set("pairs-tracker:A", "not json").unwrap();
    let state = LeagueState {
        participant_count: 500,
        completion_map: [(MatchKey::from("1-2"), true), (MatchKey::from("x"), true)]
            .into_iter()
            .collect(),
    };
    store
        .set("pairs-tracker:B", &serde_json::to_string(&state).unwrap())
        .unwrap();

    let mut tracker = tracker_with(&store, FixtureAlgorithm::CircleMethod);
    let a = tracker.league_view("A").unwrap();
    assert_eq!(a.participant_count, 4);
    assert_eq!(a.progress.completed, 0);

    let b = tracker.league_view("B").unwrap();
    assert_eq!(b.participant_count, 100);
    assert_eq!(b.progress.completed, 1);
}

#[test]
fn legacy_state_migrates_into_first_league() {
    let store = MemoryStore::new();
    store
        .set("pairs-tracker", r#"{"pairCount":3,"completedIds":["1-2","2-3","9-10"]}"#)
        .unwrap();

    let mut tracker = tracker_with(&store, FixtureAlgorithm::Combinatorial);
    let view = tracker.view();
    assert_eq!(view.league.participant_count, 3);
    assert_eq!(view.league.progress.completed, 2);
    assert!(view.league.locked);
    assert_eq!(store.get("pairs-tracker").unwrap(), None);
    assert!(store.get("pairs-tracker:A").unwrap().is_some());
}

#[test]
fn stale_fetch_is_dropped_after_league_switch() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::CircleMethod);
    let ticket = tracker.begin_fetch();
    tracker.switch_league("B").unwrap();

    let rows = vec![CompletionRow::new(label("A"), MatchKey::from("1-2"), true)];
    assert!(!tracker.finish_fetch(ticket, Some(SettingsRow::new(label("A"), 8)), rows));
    let a = tracker.league_view("A").unwrap();
    assert_eq!(a.participant_count, 4);
    assert_eq!(a.progress.completed, 0);
}

#[test]
fn fetch_replaces_local_state_through_the_allow_list() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::CircleMethod);
    tracker.toggle("3-4").unwrap();
    let ticket = tracker.begin_fetch();
    let rows = vec![
        CompletionRow::new(label("A"), MatchKey::from("1-5"), true),
        CompletionRow::new(label("A"), MatchKey::from("5-9"), true),
        CompletionRow::new(label("A"), MatchKey::from("2-3"), false),
    ];
    assert!(tracker.finish_fetch(ticket, Some(SettingsRow::new(label("A"), 6)), rows));

    let view = tracker.view();
    assert_eq!(view.league.participant_count, 6);
    assert_eq!(view.league.progress.completed, 1);
    assert!(view.league.matches.iter().any(|m| m.key.as_str() == "1-5" && m.completed));
    assert!(!view.league.matches.iter().any(|m| m.key.as_str() == "3-4" && m.completed));
}

#[test]
fn empty_remote_keeps_local_state() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::CircleMethod);
    tracker.toggle("1-4").unwrap();
    let ticket = tracker.begin_fetch();
    assert!(tracker.finish_fetch(ticket, None, Vec::new()));
    assert_eq!(tracker.view().league.progress.completed, 1);
}

#[test]
fn remote_events_merge_through_the_allow_list() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::CircleMethod);

    let valid = CompletionRow::new(label("A"), MatchKey::from("2-4"), true);
    assert!(tracker.apply_remote(remote_event(RemoteChange::Completion {
        kind: ChangeKind::Insert,
        row: valid.clone(),
    })));
    let stale = CompletionRow::new(label("A"), MatchKey::from("4-7"), true);
    assert!(!tracker.apply_remote(remote_event(RemoteChange::Completion {
        kind: ChangeKind::Insert,
        row: stale,
    })));
    assert_eq!(tracker.view().league.progress.completed, 1);

    assert!(tracker.apply_remote(remote_event(RemoteChange::Completion {
        kind: ChangeKind::Delete,
        row: valid,
    })));
    assert_eq!(tracker.view().league.progress.completed, 0);
}

#[test]
fn remote_settings_apply_even_while_locked() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::CircleMethod);
    tracker.toggle("3-4").unwrap();
    tracker.toggle("1-2").unwrap();

    assert!(tracker.apply_remote(remote_event(RemoteChange::Settings {
        kind: ChangeKind::Update,
        row: SettingsRow::new(label("A"), 3),
    })));
    let view = tracker.view();
    assert_eq!(view.league.participant_count, 3);
    assert_eq!(view.league.progress.completed, 1);
}

#[test]
fn own_echoes_and_unknown_leagues_are_ignored() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::CircleMethod);
    let echo = RemoteEvent {
        origin: tracker.client_id(),
        change: RemoteChange::Completion {
            kind: ChangeKind::Update,
            row: CompletionRow::new(label("A"), MatchKey::from("1-2"), true),
        },
    };
    assert!(!tracker.apply_remote(echo));

    let foreign = remote_event(RemoteChange::Settings {
        kind: ChangeKind::Insert,
        row: SettingsRow::new(label("Q"), 9),
    });
    assert!(!tracker.apply_remote(foreign));
    assert_eq!(tracker.view().league.progress.completed, 0);
}

#[test]
fn csv_export_lists_every_match() {
    let mut tracker = tracker_with(&MemoryStore::new(), FixtureAlgorithm::Combinatorial);
    tracker.toggle("1-2").unwrap();
    let csv = String::from_utf8(tracker.view().league.to_csv().unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "key,first,second,round,completed");
    assert_eq!(lines[1], "1-2,1,2,,true");
    assert_eq!(lines.len(), 7);
}
