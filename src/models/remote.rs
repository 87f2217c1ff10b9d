//! Rows and change notifications exchanged with the remote store.

use crate::models::fixture::MatchKey;
use crate::models::league::LeagueLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the per-match completion table, keyed by `(league, match_key)`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompletionRow {
    pub league: LeagueLabel,
    pub match_key: MatchKey,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

impl CompletionRow {
    pub fn new(league: LeagueLabel, match_key: MatchKey, completed: bool) -> Self {
        Self {
            league,
            match_key,
            completed,
            updated_at: Utc::now(),
        }
    }
}

/// One row of the per-league settings table, keyed by `league`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SettingsRow {
    pub league: LeagueLabel,
    pub pair_count: u32,
    pub updated_at: DateTime<Utc>,
}

impl SettingsRow {
    pub fn new(league: LeagueLabel, pair_count: u32) -> Self {
        Self {
            league,
            pair_count,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Which table changed, with the affected row.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum RemoteChange {
    Completion { kind: ChangeKind, row: CompletionRow },
    Settings { kind: ChangeKind, row: SettingsRow },
}

impl RemoteChange {
    pub fn league(&self) -> &LeagueLabel {
        match self {
            RemoteChange::Completion { row, .. } => &row.league,
            RemoteChange::Settings { row, .. } => &row.league,
        }
    }
}

/// Change notification delivered to subscribers.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    /// Client that issued the write.
    pub origin: Uuid,
    pub change: RemoteChange,
}
