use thiserror::Error;

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by local or remote stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode stored value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
}
