//! League, LeagueState, participant bounds, and TrackerError.

use crate::models::fixture::MatchKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Participant count a league starts with when nothing is persisted.
pub const DEFAULT_PARTICIPANTS: u32 = 4;

/// Fewest participants that still produce a fixture.
pub const MIN_PARTICIPANTS: u32 = 2;

/// Errors that can occur during tracker operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TrackerError {
    /// League label is not one of the configured leagues.
    UnknownLeague(String),
    /// Match key is not part of the league's current fixture set.
    UnknownMatch(String),
    /// Participant count cannot change while any match is complete.
    EditLocked,
    /// Shared tracker state is unusable (a holder panicked).
    LockPoisoned,
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerError::UnknownLeague(label) => write!(f, "Unknown league: {}", label),
            TrackerError::UnknownMatch(key) => write!(f, "Match {} is not in the current fixture list", key),
            TrackerError::EditLocked => {
                write!(f, "Participant count is locked while matches are marked complete")
            }
            TrackerError::LockPoisoned => write!(f, "Tracker state lock error"),
        }
    }
}

impl std::error::Error for TrackerError {}

/// Label of one isolated league namespace (e.g. "A").
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeagueLabel(String);

impl LeagueLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeagueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive bounds for the participant count. Out-of-range requests clamp, never error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PairBounds {
    pub min: u32,
    pub max: u32,
}

impl PairBounds {
    /// Bounds `[MIN_PARTICIPANTS, max]`; a `max` below the minimum is raised to it.
    pub fn up_to(max: u32) -> Self {
        Self {
            min: MIN_PARTICIPANTS,
            max: max.max(MIN_PARTICIPANTS),
        }
    }

    pub fn clamp(&self, requested: i64) -> u32 {
        requested.clamp(i64::from(self.min), i64::from(self.max)) as u32
    }
}

impl Default for PairBounds {
    fn default() -> Self {
        Self::up_to(100)
    }
}

/// Persisted per-league state: participant count plus match completion flags.
///
/// Invariant: `completion` only holds keys valid for the current `participant_count`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueState {
    pub participant_count: u32,
    #[serde(default)]
    pub completion_map: BTreeMap<MatchKey, bool>,
}

impl LeagueState {
    pub fn new(participant_count: u32) -> Self {
        Self {
            participant_count,
            completion_map: BTreeMap::new(),
        }
    }

    /// Whether the given match is marked complete.
    pub fn is_complete(&self, key: &MatchKey) -> bool {
        self.completion_map.get(key).copied().unwrap_or(false)
    }

    /// Number of entries marked complete.
    pub fn completed_count(&self) -> usize {
        self.completion_map.values().filter(|done| **done).count()
    }
}

impl Default for LeagueState {
    fn default() -> Self {
        Self::new(DEFAULT_PARTICIPANTS)
    }
}

/// Aggregate completion numbers for display.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// `round(completed / total * 100)`, 0 when there are no matches.
    pub percent: u32,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            (completed as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_clamp_both_ends() {
        let bounds = PairBounds::up_to(10);
        assert_eq!(bounds.clamp(-3), 2);
        assert_eq!(bounds.clamp(1), 2);
        assert_eq!(bounds.clamp(7), 7);
        assert_eq!(bounds.clamp(11), 10);
    }

    #[test]
    fn bounds_never_drop_below_minimum() {
        assert_eq!(PairBounds::up_to(0), PairBounds { min: 2, max: 2 });
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        assert_eq!(Progress::new(1, 6).percent, 17);
        assert_eq!(Progress::new(0, 0).percent, 0);
        assert_eq!(Progress::new(6, 6).percent, 100);
    }

    #[test]
    fn league_state_uses_camel_case_shape() {
        let state: LeagueState =
            serde_json::from_str(r#"{"participantCount":5,"completionMap":{"1-2":true}}"#).unwrap();
        assert_eq!(state.participant_count, 5);
        assert!(state.is_complete(&MatchKey::from("1-2")));
    }
}
