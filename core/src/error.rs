use thiserror::Error;

/// Errors raised by a [`KeyValueStore`](crate::store::KeyValueStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused the operation (read-only medium, injected fault, ...).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced to callers of [`NutrilogService`](crate::service::NutrilogService).
#[derive(Error, Debug)]
pub enum Error {
    /// A persisted value could not be read or did not parse. During
    /// initialization the value is treated as absent.
    #[error("Failed to read '{key}' from storage: {reason}")]
    StorageRead { key: String, reason: String },

    /// A persisted value could not be written. In-memory state is left as it
    /// was before the operation.
    #[error("Failed to write '{key}' to storage: {reason}")]
    StorageWrite { key: String, reason: String },

    #[error("Food lookup failed: {0}")]
    LookupFailed(String),

    #[error("State is not loaded yet; call initialize() first")]
    NotReady,

    #[error("Invalid food log entry: {0}")]
    InvalidEntry(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
