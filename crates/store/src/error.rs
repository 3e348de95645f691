//! Record store errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record already exists: {0}")]
    Duplicate(String),

    #[error("Corrupt row for record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Record store lock poisoned")]
    LockPoisoned,

    #[error("Record store task failed: {0}")]
    Task(String),
}
