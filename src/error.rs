// Pass Protector - Top-level error types
//
// Aggregates the per-module errors into a single enum for the application
// boundary.

use thiserror::Error;

/// Top-level error type for all Pass Protector operations.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Keychain error: {0}")]
    Keychain(#[from] crate::keychain::KeychainError),

    #[error("{0}")]
    Auth(#[from] crate::auth::AuthError),

    #[error("{0}")]
    Vault(#[from] crate::vault::VaultError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The failure was already shown to the user as a notice.
    #[error("operation failed")]
    Reported,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PassError>;
