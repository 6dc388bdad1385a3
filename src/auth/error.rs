// Pass Protector - Authentication error types

use thiserror::Error;

use crate::keychain::KeychainError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Sign-in cancelled")]
    Cancelled,

    #[error("Sign-in rejected: {0}")]
    Rejected(String),

    #[error("Session storage failed: {0}")]
    Persistence(#[from] KeychainError),
}
