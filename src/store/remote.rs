//! Remote store contract (completion and settings tables with a change feed) and an
//! in-process implementation.

use crate::models::{
    ChangeKind, CompletionRow, LeagueLabel, MatchKey, RemoteChange, RemoteEvent, SettingsRow,
};
use crate::store::error::{StoreError, StoreResult};
use futures::future::BoxFuture;
use log::warn;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the change feed before slow subscribers start lagging.
const FEED_CAPACITY: usize = 256;

/// Shared store of per-match completion rows and per-league settings.
pub trait RemoteStore: Send + Sync {
    /// All completion rows of one league.
    fn fetch_completions(&self, league: LeagueLabel) -> BoxFuture<'static, StoreResult<Vec<CompletionRow>>>;
    fn fetch_settings(&self, league: LeagueLabel) -> BoxFuture<'static, StoreResult<Option<SettingsRow>>>;
    /// Insert-or-update by `(league, match_key)`. `origin` tags the resulting notifications.
    fn upsert_completions(&self, origin: Uuid, rows: Vec<CompletionRow>) -> BoxFuture<'static, StoreResult<()>>;
    fn upsert_settings(&self, origin: Uuid, row: SettingsRow) -> BoxFuture<'static, StoreResult<()>>;
    /// Change notifications for one league.
    fn subscribe(&self, league: LeagueLabel) -> StoreResult<Subscription>;
}

/// Live change feed filtered to one league.
pub struct Subscription {
    league: LeagueLabel,
    receiver: broadcast::Receiver<RemoteEvent>,
}

impl Subscription {
    pub fn new(league: LeagueLabel, receiver: broadcast::Receiver<RemoteEvent>) -> Self {
        Self { league, receiver }
    }

    pub fn league(&self) -> &LeagueLabel {
        &self.league
    }

    /// Next event for this league; `None` once the feed is closed.
    pub async fn next(&mut self) -> Option<RemoteEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.change.league() == &self.league => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Change feed for league {} skipped {} events", self.league, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[derive(Default)]
struct Tables {
    completions: BTreeMap<(LeagueLabel, MatchKey), CompletionRow>,
    settings: BTreeMap<LeagueLabel, SettingsRow>,
}

struct Inner {
    tables: Mutex<Tables>,
    feed: broadcast::Sender<RemoteEvent>,
    offline: AtomicBool,
}

/// Remote store kept in process memory. Clones share tables and feed.
#[derive(Clone)]
pub struct MemoryRemote {
    inner: Arc<Inner>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        let (feed, _receiver) = broadcast::channel(FEED_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables::default()),
                feed,
                offline: AtomicBool::new(false),
            }),
        }
    }

    /// When offline every call fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Delete one completion row and notify subscribers.
    pub fn delete_completion(&self, origin: Uuid, league: &LeagueLabel, key: &MatchKey) -> StoreResult<bool> {
        let removed = self
            .inner
            .tables()?
            .completions
            .remove(&(league.clone(), key.clone()));
        if let Some(row) = removed {
            self.inner.notify(origin, RemoteChange::Completion { kind: ChangeKind::Delete, row });
            return Ok(true);
        }
        Ok(false)
    }
}

impl Inner {
    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("remote store is offline".into()));
        }
        Ok(())
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.check_online()?;
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("remote tables lock error".into()))
    }

    fn notify(&self, origin: Uuid, change: RemoteChange) {
        // No subscribers is not an error.
        let _ = self.feed.send(RemoteEvent { origin, change });
    }

    fn completions(&self, league: &LeagueLabel) -> StoreResult<Vec<CompletionRow>> {
        Ok(self
            .tables()?
            .completions
            .values()
            .filter(|row| &row.league == league)
            .cloned()
            .collect())
    }

    fn settings(&self, league: &LeagueLabel) -> StoreResult<Option<SettingsRow>> {
        Ok(self.tables()?.settings.get(league).cloned())
    }

    fn upsert_completions(&self, origin: Uuid, rows: Vec<CompletionRow>) -> StoreResult<()> {
        let mut changes = Vec::with_capacity(rows.len());
        {
            let mut tables = self.tables()?;
            for row in rows {
                let id = (row.league.clone(), row.match_key.clone());
                let kind = match tables.completions.insert(id, row.clone()) {
                    Some(_) => ChangeKind::Update,
                    None => ChangeKind::Insert,
                };
                changes.push(RemoteChange::Completion { kind, row });
            }
        }
        for change in changes {
            self.notify(origin, change);
        }
        Ok(())
    }

    fn upsert_settings(&self, origin: Uuid, row: SettingsRow) -> StoreResult<()> {
        let previous = self.tables()?.settings.insert(row.league.clone(), row.clone());
        let kind = match previous {
            Some(_) => ChangeKind::Update,
            None => ChangeKind::Insert,
        };
        self.notify(origin, RemoteChange::Settings { kind, row });
        Ok(())
    }
}

impl RemoteStore for MemoryRemote {
    fn fetch_completions(&self, league: LeagueLabel) -> BoxFuture<'static, StoreResult<Vec<CompletionRow>>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.completions(&league) })
    }

    fn fetch_settings(&self, league: LeagueLabel) -> BoxFuture<'static, StoreResult<Option<SettingsRow>>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.settings(&league) })
    }

    fn upsert_completions(&self, origin: Uuid, rows: Vec<CompletionRow>) -> BoxFuture<'static, StoreResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.upsert_completions(origin, rows) })
    }

    fn upsert_settings(&self, origin: Uuid, row: SettingsRow) -> BoxFuture<'static, StoreResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.upsert_settings(origin, row) })
    }

    fn subscribe(&self, league: LeagueLabel) -> StoreResult<Subscription> {
        self.inner.check_online()?;
        Ok(Subscription::new(league, self.inner.feed.subscribe()))
    }
}
