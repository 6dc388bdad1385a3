// Pass Protector - Vault (view-level) error types

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Not signed in - run `pass-protector login` first")]
    NotSignedIn,

    #[error("Please fill in: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("No such password entry: {0}")]
    UnknownRecord(Uuid),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
