//! Allow-list reconciliation of completion state against the current fixture set.
//!
//! Applied after every participant-count change and to every batch of rows or single
//! change arriving from the remote store.

use crate::logic::fixtures::generate_fixtures;
use crate::models::{ChangeKind, CompletionRow, FixtureAlgorithm, LeagueState, MatchKey};
use std::collections::HashSet;

/// Keys of every match required for `n` participants.
pub fn valid_keys(n: u32, algorithm: FixtureAlgorithm) -> HashSet<MatchKey> {
    generate_fixtures(n, algorithm)
        .into_iter()
        .map(|m| m.key)
        .collect()
}

/// Drop every completion entry not in `valid`. Returns the removed keys.
pub fn prune_stale(state: &mut LeagueState, valid: &HashSet<MatchKey>) -> Vec<MatchKey> {
    let stale: Vec<MatchKey> = state
        .completion_map
        .keys()
        .filter(|key| !valid.contains(*key))
        .cloned()
        .collect();
    for key in &stale {
        state.completion_map.remove(key);
    }
    stale
}

/// Keep only rows whose key is in `valid`.
pub fn filter_rows(rows: Vec<CompletionRow>, valid: &HashSet<MatchKey>) -> Vec<CompletionRow> {
    rows.into_iter()
        .filter(|row| valid.contains(&row.match_key))
        .collect()
}

/// Replace the completion map with the allowed subset of `rows`.
pub fn replace_from_rows(
    state: &mut LeagueState,
    algorithm: FixtureAlgorithm,
    rows: Vec<CompletionRow>,
) {
    let valid = valid_keys(state.participant_count, algorithm);
    state.completion_map = filter_rows(rows, &valid)
        .into_iter()
        .map(|row| (row.match_key, row.completed))
        .collect();
}

/// Merge one incoming completion change. Returns false when the key is not allowed.
pub fn apply_change(
    state: &mut LeagueState,
    algorithm: FixtureAlgorithm,
    kind: ChangeKind,
    row: CompletionRow,
) -> bool {
    let valid = valid_keys(state.participant_count, algorithm);
    if !valid.contains(&row.match_key) {
        return false;
    }
    match kind {
        ChangeKind::Delete => {
            state.completion_map.remove(&row.match_key);
        }
        ChangeKind::Insert | ChangeKind::Update => {
            state.completion_map.insert(row.match_key, row.completed);
        }
    }
    true
}
