//! Glue between the tracker and the remote store: push local writes, refresh a league,
//! and follow its change feed. Remote failures are logged and otherwise ignored.

use crate::models::{CompletionRow, RemoteEvent, SettingsRow, TrackerError};
use crate::store::{RemoteStore, Subscription};
use crate::tracker::{FetchTicket, RemoteWrite, Tracker};
use log::{debug, info, warn};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Send local writes to the remote store. No retry and no rollback on failure.
pub async fn push_writes(remote: &dyn RemoteStore, origin: Uuid, writes: Vec<RemoteWrite>) {
    for write in writes {
        let result = match write {
            RemoteWrite::Completions(rows) => {
                let count = rows.len();
                remote
                    .upsert_completions(origin, rows)
                    .await
                    .map(|()| debug!("Pushed {} completion row(s)", count))
            }
            RemoteWrite::Settings(row) => {
                let league = row.league.clone();
                remote
                    .upsert_settings(origin, row)
                    .await
                    .map(|()| debug!("Pushed settings for league {}", league))
            }
        };
        if let Err(err) = result {
            warn!("Remote write failed; local state kept: {}", err);
        }
    }
}

/// Fetch the league named by `ticket` and apply it unless the ticket went stale meanwhile.
/// Returns whether the result was applied.
pub async fn refresh_league(
    tracker: &RwLock<Tracker>,
    remote: &dyn RemoteStore,
    ticket: FetchTicket,
) -> bool {
    let settings = match remote.fetch_settings(ticket.league.clone()).await {
        Ok(settings) => settings,
        Err(err) => {
            warn!("Could not load settings for league {}: {}", ticket.league, err);
            return false;
        }
    };
    let rows = match remote.fetch_completions(ticket.league.clone()).await {
        Ok(rows) => rows,
        Err(err) => {
            warn!("Could not load completions for league {}: {}", ticket.league, err);
            return false;
        }
    };
    match finish(tracker, ticket, settings, rows) {
        Ok(applied) => applied,
        Err(err) => {
            warn!("Could not apply remote state: {}", err);
            false
        }
    }
}

/// Refresh whichever league is active right now.
pub async fn refresh_active(tracker: &RwLock<Tracker>, remote: &dyn RemoteStore) -> bool {
    let ticket = match tracker.read() {
        Ok(guard) => guard.begin_fetch(),
        Err(_) => {
            warn!("{}", TrackerError::LockPoisoned);
            return false;
        }
    };
    refresh_league(tracker, remote, ticket).await
}

/// Subscribe to the active league's change feed.
pub fn subscribe_active(tracker: &RwLock<Tracker>, remote: &dyn RemoteStore) -> Option<Subscription> {
    let league = match tracker.read() {
        Ok(guard) => guard.active().clone(),
        Err(_) => {
            warn!("{}", TrackerError::LockPoisoned);
            return None;
        }
    };
    match remote.subscribe(league.clone()) {
        Ok(subscription) => Some(subscription),
        Err(err) => {
            warn!("Could not subscribe to league {}: {}", league, err);
            None
        }
    }
}

/// Apply change notifications until the feed closes.
pub async fn follow_league(tracker: Arc<RwLock<Tracker>>, mut subscription: Subscription) {
    info!("Following remote changes for league {}", subscription.league());
    while let Some(event) = subscription.next().await {
        if let Err(err) = apply(&tracker, event) {
            warn!("Stopped following league {}: {}", subscription.league(), err);
            return;
        }
    }
    info!("Change feed for league {} closed", subscription.league());
}

fn finish(
    tracker: &RwLock<Tracker>,
    ticket: FetchTicket,
    settings: Option<SettingsRow>,
    rows: Vec<CompletionRow>,
) -> Result<bool, TrackerError> {
    let mut guard = tracker.write().map_err(|_| TrackerError::LockPoisoned)?;
    Ok(guard.finish_fetch(ticket, settings, rows))
}

fn apply(tracker: &RwLock<Tracker>, event: RemoteEvent) -> Result<bool, TrackerError> {
    let mut guard = tracker.write().map_err(|_| TrackerError::LockPoisoned)?;
    Ok(guard.apply_remote(event))
}
