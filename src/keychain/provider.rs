// Pass Protector - Keyring Provider
//
// Two things are kept in the platform keyring under the same service name:
//
//   * `master-secret`: 32 random bytes. Argon2id turns it into the SQLCipher
//     key; the derived key never touches disk.
//   * `session`: the signed-in session as JSON, so a later process (or the
//     gateway) can restore it without a new sign-in.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::auth::Session;

use super::KeychainError;

// ─── Constants ───────────────────────────────────────────────────────────────

const KEYRING_SERVICE: &str = "pass-protector";

const MASTER_SECRET_USER: &str = "master-secret";

const SESSION_USER: &str = "session";

/// 256-bit master secret.
const MASTER_SECRET_LEN: usize = 32;

/// 256-bit SQLCipher key.
const DERIVED_KEY_LEN: usize = 32;

// Argon2id: m=64 MiB, t=3, p=4
const ARGON2_M_COST: u32 = 65536;
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Source of the database encryption key.
pub trait MasterKeyProvider {
    /// Retrieve the master secret, generating and storing one on first use.
    fn get_or_create_master_secret(&self) -> Result<Zeroizing<Vec<u8>>, KeychainError>;

    /// Derive the SQLCipher key from the master secret using Argon2id.
    fn derive_db_key(&self, master_secret: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeychainError>;

    fn has_master_secret(&self) -> Result<bool, KeychainError>;

    /// Hex form of the derived key, as `PRAGMA key` expects it.
    fn database_key_hex(&self) -> Result<Zeroizing<String>, KeychainError> {
        let master_secret = self.get_or_create_master_secret()?;
        let key = self.derive_db_key(&master_secret)?;
        Ok(Zeroizing::new(
            key.iter().map(|b| format!("{:02x}", b)).collect(),
        ))
    }
}

/// Persistence for the signed-in session.
pub trait SessionVault {
    fn load_session(&self) -> Result<Option<Session>, KeychainError>;

    fn save_session(&self, session: &Session) -> Result<(), KeychainError>;

    /// Remove the persisted session. Removing nothing is not an error.
    fn clear_session(&self) -> Result<(), KeychainError>;
}

// ─── Key derivation ──────────────────────────────────────────────────────────

fn generate_master_secret() -> Zeroizing<Vec<u8>> {
    let mut secret = Zeroizing::new(vec![0u8; MASTER_SECRET_LEN]);
    rand::rng().fill_bytes(&mut secret);
    secret
}

/// Salt = SHA-256(service || "::" || user). Deterministic, so the same master
/// secret always yields the same database key.
fn build_salt(service: &str, user: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(service.as_bytes());
    hasher.update(b"::");
    hasher.update(user.as_bytes());
    hasher.finalize().to_vec()
}

fn argon2_derive(master_secret: &[u8], salt: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeychainError> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(DERIVED_KEY_LEN))
        .map_err(|e| KeychainError::Derivation(format!("invalid Argon2 params: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut derived_key = Zeroizing::new(vec![0u8; DERIVED_KEY_LEN]);
    argon2
        .hash_password_into(master_secret, salt, &mut derived_key)
        .map_err(|e| KeychainError::Derivation(format!("Argon2id hash failed: {}", e)))?;

    Ok(derived_key)
}

// ─── Platform Implementation ─────────────────────────────────────────────────

/// Production keychain backed by the `keyring` crate
/// (Keychain on macOS, Credential Manager on Windows, keyutils on Linux).
pub struct KeyringProvider {
    service: String,
}

impl KeyringProvider {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    fn entry(&self, user: &str) -> Result<keyring::Entry, KeychainError> {
        keyring::Entry::new(&self.service, user)
            .map_err(|e| KeychainError::Keyring(format!("failed to create keyring entry: {}", e)))
    }
}

impl Default for KeyringProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MasterKeyProvider for KeyringProvider {
    fn get_or_create_master_secret(&self) -> Result<Zeroizing<Vec<u8>>, KeychainError> {
        let entry = self.entry(MASTER_SECRET_USER)?;

        match entry.get_secret() {
            Ok(secret) => {
                tracing::debug!("Retrieved master secret from keyring");
                Ok(Zeroizing::new(secret))
            }
            Err(keyring::Error::NoEntry) => {
                tracing::info!("No master secret found, generating a new one");
                let secret = generate_master_secret();
                entry.set_secret(&secret).map_err(|e| {
                    KeychainError::Keyring(format!("failed to store master secret: {}", e))
                })?;
                Ok(secret)
            }
            Err(e) => Err(KeychainError::Keyring(format!(
                "failed to retrieve master secret: {}",
                e
            ))),
        }
    }

    fn derive_db_key(&self, master_secret: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeychainError> {
        argon2_derive(master_secret, &build_salt(&self.service, MASTER_SECRET_USER))
    }

    fn has_master_secret(&self) -> Result<bool, KeychainError> {
        match self.entry(MASTER_SECRET_USER)?.get_secret() {
            Ok(_) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(KeychainError::Keyring(format!(
                "failed to check master secret: {}",
                e
            ))),
        }
    }
}

impl SessionVault for KeyringProvider {
    fn load_session(&self) -> Result<Option<Session>, KeychainError> {
        match self.entry(SESSION_USER)?.get_password() {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeychainError::Keyring(format!(
                "failed to read session: {}",
                e
            ))),
        }
    }

    fn save_session(&self, session: &Session) -> Result<(), KeychainError> {
        let json = serde_json::to_string(session)?;
        self.entry(SESSION_USER)?
            .set_password(&json)
            .map_err(|e| KeychainError::Keyring(format!("failed to store session: {}", e)))
    }

    fn clear_session(&self) -> Result<(), KeychainError> {
        match self.entry(SESSION_USER)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::Keyring(format!(
                "failed to delete session: {}",
                e
            ))),
        }
    }
}

// ─── In-Memory Mock for Testing ──────────────────────────────────────────────

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Keeps everything in memory. Sessions go through JSON like the real
    /// keyring so serialization problems show up in tests.
    #[derive(Default)]
    pub struct MockKeychain {
        secret: Mutex<Option<Vec<u8>>>,
        session_json: Mutex<Option<String>>,
        fail_writes: AtomicBool,
    }

    impl MockKeychain {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_secret(secret: Vec<u8>) -> Self {
            let keychain = Self::default();
            *keychain.secret.lock().unwrap() = Some(secret);
            keychain
        }

        /// Store a session entry verbatim, bypassing serialization.
        pub fn put_raw_session(&self, json: &str) {
            *self.session_json.lock().unwrap() = Some(json.to_string());
        }

        /// Make every subsequent write fail, as a locked keyring would.
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        fn check_writable(&self) -> Result<(), KeychainError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(KeychainError::Keyring("keyring is locked".to_string()));
            }
            Ok(())
        }
    }

    impl MasterKeyProvider for MockKeychain {
        fn get_or_create_master_secret(&self) -> Result<Zeroizing<Vec<u8>>, KeychainError> {
            let mut guard = self.secret.lock().unwrap();
            if let Some(ref s) = *guard {
                return Ok(Zeroizing::new(s.clone()));
            }
            self.check_writable()?;
            let secret = generate_master_secret();
            *guard = Some(secret.to_vec());
            Ok(secret)
        }

        fn derive_db_key(&self, master_secret: &[u8]) -> Result<Zeroizing<Vec<u8>>, KeychainError> {
            argon2_derive(master_secret, &build_salt("pass-protector-test", MASTER_SECRET_USER))
        }

        fn has_master_secret(&self) -> Result<bool, KeychainError> {
            Ok(self.secret.lock().unwrap().is_some())
        }
    }

    impl SessionVault for MockKeychain {
        fn load_session(&self) -> Result<Option<Session>, KeychainError> {
            match self.session_json.lock().unwrap().as_deref() {
                Some(json) => Ok(Some(serde_json::from_str(json)?)),
                None => Ok(None),
            }
        }

        fn save_session(&self, session: &Session) -> Result<(), KeychainError> {
            self.check_writable()?;
            *self.session_json.lock().unwrap() = Some(serde_json::to_string(session)?);
            Ok(())
        }

        fn clear_session(&self) -> Result<(), KeychainError> {
            self.check_writable()?;
            *self.session_json.lock().unwrap() = None;
            Ok(())
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
