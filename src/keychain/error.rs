// Pass Protector - Keychain error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("Key derivation error: {0}")]
    Derivation(String),

    #[error("Stored session is unreadable: {0}")]
    CorruptSession(#[from] serde_json::Error),

    #[error("Master secret not found - run `pass-protector init` first")]
    MasterSecretNotFound,
}
