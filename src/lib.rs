// Pass Protector - Library root
//
// Re-exports the auth, store, vault, keychain, CLI and gateway modules.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod keychain;
pub mod store;
pub mod vault;

pub use error::{PassError, Result};
