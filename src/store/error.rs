// Pass Protector - Store error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Credential not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("Database not initialized - run `pass-protector init` first")]
    NotInitialized,

    #[error("Invalid database key - database may be corrupted or key is wrong")]
    InvalidKey,
}
