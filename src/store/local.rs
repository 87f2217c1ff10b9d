//! Local key-value persistence: per-league state, the active league, and the legacy
//! single-league shape.

use crate::models::{LeagueLabel, LeagueState, MatchKey};
use crate::store::error::StoreResult;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// String key-value store holding serialized state.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory store; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!("Ignoring corrupt data file {}: {}", path.display(), err);
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("No data file at {}; starting empty", path.display());
                BTreeMap::new()
            }
            Err(err) => {
                warn!("Could not read data file {}: {}", path.display(), err);
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// Pre-league shape: one tracker, completed matches as a list of ids.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyState {
    pair_count: u32,
    #[serde(default)]
    completed_ids: Vec<String>,
}

impl From<LegacyState> for LeagueState {
    fn from(legacy: LegacyState) -> Self {
        Self {
            participant_count: legacy.pair_count,
            completion_map: legacy
                .completed_ids
                .into_iter()
                .map(|id| (MatchKey::from(id), true))
                .collect(),
        }
    }
}

/// `"<namespace>:<league>"`
pub fn league_key(namespace: &str, league: &LeagueLabel) -> String {
    format!("{}:{}", namespace, league)
}

pub fn active_key(namespace: &str) -> String {
    format!("{}:active", namespace)
}

/// The legacy shape lived directly under the namespace.
pub fn legacy_key(namespace: &str) -> String {
    namespace.to_string()
}

/// Read a league's persisted state. `None` means nothing usable is stored.
///
/// When `league` is the designated legacy league and it has no state of its own, the
/// legacy single-league entry is migrated: converted, written under the league key, and
/// removed.
pub fn load_league(
    store: &dyn LocalStore,
    namespace: &str,
    league: &LeagueLabel,
    legacy_league: Option<&LeagueLabel>,
) -> Option<LeagueState> {
    let key = league_key(namespace, league);
    match store.get(&key) {
        Ok(Some(raw)) => {
            return match serde_json::from_str::<LeagueState>(&raw) {
                Ok(state) => Some(state),
                Err(err) => {
                    warn!("Discarding corrupt state for league {}: {}", league, err);
                    None
                }
            };
        }
        Ok(None) => {}
        Err(err) => {
            warn!("Could not read state for league {}: {}", league, err);
            return None;
        }
    }

    if legacy_league != Some(league) {
        return None;
    }
    migrate_legacy(store, namespace, league)
}

fn migrate_legacy(
    store: &dyn LocalStore,
    namespace: &str,
    league: &LeagueLabel,
) -> Option<LeagueState> {
    let old_key = legacy_key(namespace);
    let raw = match store.get(&old_key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!("Could not read legacy state: {}", err);
            return None;
        }
    };
    let state: LeagueState = match serde_json::from_str::<LegacyState>(&raw) {
        Ok(legacy) => legacy.into(),
        Err(err) => {
            warn!("Discarding corrupt legacy state: {}", err);
            return None;
        }
    };
    info!("Migrating legacy state into league {}", league);
    match save_league(store, namespace, league, &state) {
        Ok(()) => {
            if let Err(err) = store.remove(&old_key) {
                warn!("Could not remove legacy state after migration: {}", err);
            }
        }
        Err(err) => warn!("Could not persist migrated state for league {}: {}", league, err),
    }
    Some(state)
}

pub fn save_league(
    store: &dyn LocalStore,
    namespace: &str,
    league: &LeagueLabel,
    state: &LeagueState,
) -> StoreResult<()> {
    let raw = serde_json::to_string(state)?;
    store.set(&league_key(namespace, league), &raw)
}

pub fn load_active(store: &dyn LocalStore, namespace: &str) -> Option<LeagueLabel> {
    match store.get(&active_key(namespace)) {
        Ok(Some(raw)) => serde_json::from_str(&raw)
            .map_err(|err| warn!("Discarding corrupt active league: {}", err))
            .ok(),
        Ok(None) => None,
        Err(err) => {
            warn!("Could not read active league: {}", err);
            None
        }
    }
}

pub fn save_active(store: &dyn LocalStore, namespace: &str, league: &LeagueLabel) -> StoreResult<()> {
    store.set(&active_key(namespace), &serde_json::to_string(league)?)
}
