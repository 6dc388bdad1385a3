// Pass Protector - Store Module
//
// The credential collection lives in a SQLCipher-encrypted SQLite database.
// `CredentialStore` is the adapter the rest of the crate talks to; it knows
// nothing about sessions beyond the optional owner filter it is handed.

mod db;
mod error;
mod models;
mod repository;

pub use db::Database;
pub use error::StoreError;
pub use models::{CredentialFields, CredentialRecord, OwnerId};
pub use repository::{CredentialStore, SqliteCredentialStore};
