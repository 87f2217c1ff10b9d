//! Round-robin tracker: fixture generation, per-league completion state, and the local
//! and remote stores it syncs with.

pub mod config;
pub mod logic;
pub mod models;
pub mod store;
pub mod sync;
pub mod tracker;

pub use config::TrackerConfig;
pub use logic::{
    apply_change, circle_method_fixtures, circle_method_rounds, combinatorial_fixtures,
    filter_rows, generate_fixtures, is_edit_locked, progress, prune_stale, replace_from_rows,
    reset_league, round_count, set_participant_count, shift_participant_count, toggle_match,
    valid_keys,
};
pub use models::{
    ChangeKind, CompletionRow, FixtureAlgorithm, LeagueLabel, LeagueState, Match, MatchKey,
    PairBounds, Participant, Progress, RemoteChange, RemoteEvent, SettingsRow, TrackerError,
    DEFAULT_PARTICIPANTS, MIN_PARTICIPANTS,
};
pub use store::{FileStore, LocalStore, MemoryRemote, MemoryStore, RemoteStore, StoreError, Subscription};
pub use tracker::{CountChange, FetchTicket, LeagueView, MatchView, RemoteWrite, Tracker, TrackerView};
