//! League mutations: toggle, participant count changes, reset, and progress.

use crate::logic::fixtures::generate_fixtures;
use crate::logic::reconcile::{prune_stale, valid_keys};
use crate::models::{
    FixtureAlgorithm, LeagueState, MatchKey, PairBounds, Progress, TrackerError,
};

/// True when any match is complete; the participant count is frozen while this holds.
pub fn is_edit_locked(state: &LeagueState) -> bool {
    state.completion_map.values().any(|done| *done)
}

/// Flip the completion flag of `key`. Returns the new flag.
///
/// The key must belong to the league's current fixture set.
pub fn toggle_match(
    state: &mut LeagueState,
    algorithm: FixtureAlgorithm,
    key: &MatchKey,
) -> Result<bool, TrackerError> {
    if !valid_keys(state.participant_count, algorithm).contains(key) {
        return Err(TrackerError::UnknownMatch(key.to_string()));
    }
    let completed = !state.is_complete(key);
    state.completion_map.insert(key.clone(), completed);
    Ok(completed)
}

/// Set the participant count (clamped to `bounds`) and prune stale completion entries.
///
/// Returns `Some(new_count)` when the count changed, `None` when clamping left it as is.
pub fn set_participant_count(
    state: &mut LeagueState,
    algorithm: FixtureAlgorithm,
    requested: i64,
    bounds: PairBounds,
) -> Result<Option<u32>, TrackerError> {
    if is_edit_locked(state) {
        return Err(TrackerError::EditLocked);
    }
    let count = bounds.clamp(requested);
    if count == state.participant_count {
        return Ok(None);
    }
    state.participant_count = count;
    prune_stale(state, &valid_keys(count, algorithm));
    Ok(Some(count))
}

/// Change the participant count by `delta` (e.g. +1 / -1 buttons).
pub fn shift_participant_count(
    state: &mut LeagueState,
    algorithm: FixtureAlgorithm,
    delta: i64,
    bounds: PairBounds,
) -> Result<Option<u32>, TrackerError> {
    let requested = i64::from(state.participant_count).saturating_add(delta);
    set_participant_count(state, algorithm, requested, bounds)
}

/// Clear every completion flag. Returns all keys of the current fixture set,
/// which the remote side zeroes.
pub fn reset_league(state: &mut LeagueState, algorithm: FixtureAlgorithm) -> Vec<MatchKey> {
    state.completion_map.clear();
    generate_fixtures(state.participant_count, algorithm)
        .into_iter()
        .map(|m| m.key)
        .collect()
}

/// Completed/total counts over the current fixture set; stale entries are never counted.
pub fn progress(state: &LeagueState, algorithm: FixtureAlgorithm) -> Progress {
    let fixtures = generate_fixtures(state.participant_count, algorithm);
    let completed = fixtures.iter().filter(|m| state.is_complete(&m.key)).count();
    Progress::new(completed, fixtures.len())
}
