//! Application state: every league's count and completion map, the active league, and
//! the local store they persist to.
//!
//! All mutations are local-first. Each one updates memory, persists locally, and hands
//! back the [`RemoteWrite`]s the caller should push; a failed push is only logged.

use crate::config::TrackerConfig;
use crate::logic::{
    apply_change, generate_fixtures, is_edit_locked, progress, prune_stale, replace_from_rows,
    reset_league, round_count, set_participant_count, shift_participant_count, toggle_match,
    valid_keys,
};
use crate::models::{
    ChangeKind, CompletionRow, FixtureAlgorithm, LeagueLabel, LeagueState, MatchKey, PairBounds,
    Participant, Progress, RemoteChange, RemoteEvent, SettingsRow, TrackerError,
};
use crate::store::{load_active, load_league, save_active, save_league, LocalStore};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A write the remote store should receive after a local mutation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RemoteWrite {
    Completions(Vec<CompletionRow>),
    Settings(SettingsRow),
}

/// Requested participant count change.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountChange {
    /// Relative step (e.g. +1 / -1).
    Delta(i64),
    /// Absolute value.
    Value(i64),
}

/// Identifies one remote fetch; results for a superseded ticket are dropped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchTicket {
    pub league: LeagueLabel,
    generation: u64,
}

/// One fixture as displayed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MatchView {
    pub key: MatchKey,
    pub first: Participant,
    pub second: Participant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    pub completed: bool,
}

/// Everything the presentation layer shows for one league.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LeagueView {
    pub league: LeagueLabel,
    pub participant_count: u32,
    pub algorithm: FixtureAlgorithm,
    pub bounds: PairBounds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u32>,
    pub matches: Vec<MatchView>,
    pub progress: Progress,
    /// Participant count is frozen while any match is complete.
    pub locked: bool,
}

impl LeagueView {
    fn build(league: &LeagueLabel, state: &LeagueState, config: &TrackerConfig) -> Self {
        let matches = generate_fixtures(state.participant_count, config.algorithm)
            .into_iter()
            .map(|m| MatchView {
                completed: state.is_complete(&m.key),
                key: m.key,
                first: m.first,
                second: m.second,
                round: m.round,
            })
            .collect();
        let rounds = match config.algorithm {
            FixtureAlgorithm::CircleMethod => Some(round_count(state.participant_count)),
            FixtureAlgorithm::Combinatorial => None,
        };
        Self {
            league: league.clone(),
            participant_count: state.participant_count,
            algorithm: config.algorithm,
            bounds: config.bounds,
            rounds,
            matches,
            progress: progress(state, config.algorithm),
            locked: is_edit_locked(state),
        }
    }

    /// Fixture list as CSV: `key,first,second,round,completed`.
    pub fn to_csv(&self) -> csv::Result<Vec<u8>> {
        #[derive(Serialize)]
        struct Record<'a> {
            key: &'a str,
            first: Participant,
            second: Participant,
            round: Option<u32>,
            completed: bool,
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        for m in &self.matches {
            writer.serialize(Record {
                key: m.key.as_str(),
                first: m.first,
                second: m.second,
                round: m.round,
                completed: m.completed,
            })?;
        }
        writer
            .into_inner()
            .map_err(|err| csv::Error::from(err.into_error()))
    }
}

/// Active league view plus the league selector.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TrackerView {
    pub active: LeagueLabel,
    pub leagues: Vec<LeagueLabel>,
    pub league: LeagueView,
}

/// Owner of all league state. One per client.
pub struct Tracker {
    config: TrackerConfig,
    client_id: Uuid,
    local: Box<dyn LocalStore>,
    leagues: HashMap<LeagueLabel, LeagueState>,
    active: LeagueLabel,
    fetch_generation: u64,
}

impl Tracker {
    /// Restore the active league from `local` (or the first configured league).
    pub fn new(config: TrackerConfig, local: Box<dyn LocalStore>) -> Self {
        let active = load_active(local.as_ref(), &config.namespace)
            .filter(|label| config.leagues.contains(label))
            .unwrap_or_else(|| config.default_league());
        let mut tracker = Self {
            config,
            client_id: Uuid::new_v4(),
            local,
            leagues: HashMap::new(),
            active,
            fetch_generation: 0,
        };
        let active = tracker.active.clone();
        tracker.state_mut(&active);
        info!("Tracker {} started on league {}", tracker.client_id, tracker.active);
        tracker
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Origin tag of this tracker's remote writes.
    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    pub fn active(&self) -> &LeagueLabel {
        &self.active
    }

    /// Resolve a raw label to a configured league.
    pub fn league(&self, raw: &str) -> Result<LeagueLabel, TrackerError> {
        self.config
            .league(raw)
            .ok_or_else(|| TrackerError::UnknownLeague(raw.to_string()))
    }

    /// Current state of a league, created (defaulted or loaded) on first access.
    pub fn state(&mut self, league: &LeagueLabel) -> &LeagueState {
        self.state_mut(league)
    }

    fn state_mut(&mut self, league: &LeagueLabel) -> &mut LeagueState {
        let Self {
            config,
            local,
            leagues,
            ..
        } = self;
        leagues
            .entry(league.clone())
            .or_insert_with(|| load_state(local.as_ref(), config, league))
    }

    fn persist(&self, league: &LeagueLabel) {
        let Some(state) = self.leagues.get(league) else {
            return;
        };
        if let Err(err) = save_league(self.local.as_ref(), &self.config.namespace, league, state) {
            warn!("Could not save league {} locally: {}", league, err);
        }
    }

    /// View of the active league.
    pub fn view(&mut self) -> TrackerView {
        let active = self.active.clone();
        TrackerView {
            league: self.build_view(&active),
            active,
            leagues: self.config.leagues.clone(),
        }
    }

    /// View of any configured league.
    pub fn league_view(&mut self, raw: &str) -> Result<LeagueView, TrackerError> {
        let league = self.league(raw)?;
        Ok(self.build_view(&league))
    }

    fn build_view(&mut self, league: &LeagueLabel) -> LeagueView {
        self.state_mut(league);
        let state = &self.leagues[league];
        LeagueView::build(league, state, &self.config)
    }

    /// Make `raw` the active league. Any fetch issued for the previous league goes stale.
    pub fn switch_league(&mut self, raw: &str) -> Result<FetchTicket, TrackerError> {
        let league = self.league(raw)?;
        self.fetch_generation += 1;
        if league != self.active {
            info!("Switching active league {} -> {}", self.active, league);
            self.active = league.clone();
            if let Err(err) = save_active(self.local.as_ref(), &self.config.namespace, &league) {
                warn!("Could not save active league: {}", err);
            }
        }
        self.state_mut(&league);
        Ok(self.begin_fetch())
    }

    /// Ticket for a remote fetch of the active league.
    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket {
            league: self.active.clone(),
            generation: self.fetch_generation,
        }
    }

    /// Apply a completed remote fetch. Returns false when the ticket is stale.
    ///
    /// A settings row sets the participant count; completion rows, filtered to the valid
    /// keys, replace the local map. With nothing stored remotely, local state stands.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        settings: Option<SettingsRow>,
        rows: Vec<CompletionRow>,
    ) -> bool {
        if ticket.generation != self.fetch_generation || ticket.league != self.active {
            debug!("Dropping stale fetch for league {}", ticket.league);
            return false;
        }
        if settings.is_none() && rows.is_empty() {
            return true;
        }
        let bounds = self.config.bounds;
        let algorithm = self.config.algorithm;
        let state = self.state_mut(&ticket.league);
        if let Some(settings) = settings {
            state.participant_count = bounds.clamp(i64::from(settings.pair_count));
        }
        replace_from_rows(state, algorithm, rows);
        self.persist(&ticket.league);
        true
    }

    /// Toggle one match of the active league.
    pub fn toggle(&mut self, raw_key: &str) -> Result<Vec<RemoteWrite>, TrackerError> {
        let league = self.active.clone();
        let key = MatchKey::from(raw_key);
        let algorithm = self.config.algorithm;
        let completed = toggle_match(self.state_mut(&league), algorithm, &key)?;
        self.persist(&league);
        Ok(vec![RemoteWrite::Completions(vec![CompletionRow::new(
            league, key, completed,
        )])])
    }

    /// Change the active league's participant count. Rejected while the league is locked.
    pub fn change_participants(&mut self, change: CountChange) -> Result<Vec<RemoteWrite>, TrackerError> {
        let league = self.active.clone();
        let bounds = self.config.bounds;
        let algorithm = self.config.algorithm;
        let state = self.state_mut(&league);
        let changed = match change {
            CountChange::Delta(delta) => shift_participant_count(state, algorithm, delta, bounds)?,
            CountChange::Value(value) => set_participant_count(state, algorithm, value, bounds)?,
        };
        let Some(count) = changed else {
            return Ok(Vec::new());
        };
        self.persist(&league);
        Ok(vec![RemoteWrite::Settings(SettingsRow::new(league, count))])
    }

    /// Clear every completion flag of the active league.
    pub fn reset(&mut self) -> Vec<RemoteWrite> {
        let league = self.active.clone();
        let algorithm = self.config.algorithm;
        let keys = reset_league(self.state_mut(&league), algorithm);
        self.persist(&league);
        let rows = keys
            .into_iter()
            .map(|key| CompletionRow::new(league.clone(), key, false))
            .collect();
        vec![RemoteWrite::Completions(rows)]
    }

    /// Merge a change notification. Returns true when local state changed.
    ///
    /// Own echoes and unknown leagues are ignored. Settings apply last-delivered-wins,
    /// regardless of the edit lock.
    pub fn apply_remote(&mut self, event: RemoteEvent) -> bool {
        if event.origin == self.client_id {
            return false;
        }
        let league = event.change.league().clone();
        if !self.config.leagues.contains(&league) {
            debug!("Ignoring change for unknown league {}", league);
            return false;
        }
        let bounds = self.config.bounds;
        let algorithm = self.config.algorithm;
        let state = self.state_mut(&league);
        let before = state.clone();
        match event.change {
            RemoteChange::Completion { kind, row } => {
                if !apply_change(state, algorithm, kind, row) {
                    debug!("Ignoring stale completion row for league {}", league);
                }
            }
            RemoteChange::Settings { kind: ChangeKind::Delete, .. } => {}
            RemoteChange::Settings { row, .. } => {
                let count = bounds.clamp(i64::from(row.pair_count));
                state.participant_count = count;
                prune_stale(state, &valid_keys(count, algorithm));
            }
        }
        let changed = *state != before;
        if changed {
            self.persist(&league);
        }
        changed
    }
}

/// Load a league from the local store, defaulting when absent, then clamp and prune.
fn load_state(local: &dyn LocalStore, config: &TrackerConfig, league: &LeagueLabel) -> LeagueState {
    let persisted = load_league(local, &config.namespace, league, config.legacy_league.as_ref());
    let mut state = persisted.unwrap_or_else(|| LeagueState::new(config.default_participants));
    let count = config.bounds.clamp(i64::from(state.participant_count));
    state.participant_count = count;
    let stale = prune_stale(&mut state, &valid_keys(count, config.algorithm));
    if !stale.is_empty() {
        debug!("Dropped {} stale entries while loading league {}", stale.len(), league);
    }
    state
}
