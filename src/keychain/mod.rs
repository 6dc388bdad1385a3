// Pass Protector - Keychain Module
//
// Everything that lives in the platform keyring: the master secret the
// database key is derived from, and the persisted sign-in session that is
// restored on start-up.

mod error;
mod provider;

pub use error::KeychainError;
pub use provider::{KeyringProvider, MasterKeyProvider, SessionVault};

#[cfg(test)]
pub use provider::mock;
