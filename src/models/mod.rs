//! Data structures for the tracker: matches, leagues, remote rows.

mod fixture;
mod league;
mod remote;

pub use fixture::{FixtureAlgorithm, Match, MatchKey, Participant};
pub use league::{
    LeagueLabel, LeagueState, PairBounds, Progress, TrackerError, DEFAULT_PARTICIPANTS,
    MIN_PARTICIPANTS,
};
pub use remote::{ChangeKind, CompletionRow, RemoteChange, RemoteEvent, SettingsRow};
