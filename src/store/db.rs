// Pass Protector - SQLCipher Database Management
//
// Opens the encrypted database holding the `passwords` collection. The key
// comes from the keychain (Argon2id over the master secret) and is applied
// via PRAGMA before any table is touched.

use std::path::Path;

use rusqlite::Connection;

use super::StoreError;

/// Wrapper around a SQLCipher-encrypted SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) an encrypted database at the given path.
    /// `hex_key` is the hex-encoded 32-byte key derived by the keychain.
    pub fn open(path: &Path, hex_key: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "key", format!("x'{}'", hex_key))?;

        // A wrong key only shows up on first read: "file is not a database".
        conn.execute_batch("SELECT count(*) FROM sqlite_master;")
            .map_err(|_| StoreError::InvalidKey)?;

        let db = Self { conn };
        db.run_migrations()?;

        tracing::debug!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// Open an existing database, refusing to create a fresh file.
    pub fn open_existing(path: &Path, hex_key: &str) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotInitialized);
        }
        Self::open(path, hex_key)
    }

    /// Open an in-memory database (unencrypted, for testing only).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS passwords (
                id          TEXT PRIMARY KEY,
                site        TEXT NOT NULL,
                username    TEXT NOT NULL,
                password    TEXT NOT NULL,
                owner_id    TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_passwords_owner
                ON passwords(owner_id);
            ",
        )?;

        tracing::debug!("Database migrations completed successfully");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
