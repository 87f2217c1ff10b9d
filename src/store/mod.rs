//! Persistence collaborators: the local key-value store and the shared remote store.

mod error;
mod local;
mod remote;

pub use error::{StoreError, StoreResult};
pub use local::{
    active_key, league_key, legacy_key, load_active, load_league, save_active, save_league,
    FileStore, LocalStore, MemoryStore,
};
pub use remote::{MemoryRemote, RemoteStore, Subscription};
