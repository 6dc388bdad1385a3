// Pass Protector - Identity Providers
//
// A provider runs one sign-in attempt and either yields a `Session` or an
// `AuthError`. It never touches the tracked session itself.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{AuthError, ProviderKind, Session};

/// Domain prefix mixed into email-derived uids.
const EMAIL_UID_DOMAIN: &str = "pass-protector:email:";

/// Hex digits kept from the SHA-256 digest.
const EMAIL_UID_LEN: usize = 32;

pub trait IdentityProvider {
    fn kind(&self) -> ProviderKind;

    fn sign_in(&self) -> Result<Session, AuthError>;
}

/// Every sign-in yields a brand-new identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousProvider;

impl IdentityProvider for AnonymousProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anonymous
    }

    fn sign_in(&self) -> Result<Session, AuthError> {
        let uid = Uuid::new_v4().simple().to_string();
        tracing::debug!(%uid, "Anonymous identity issued");
        Ok(Session::new(uid, ProviderKind::Anonymous, None))
    }
}

/// Identity keyed by an email address. The same address always maps to the
/// same uid, so records survive sign-out and sign-in again.
#[derive(Debug, Clone)]
pub struct EmailProvider {
    email: String,
}

impl EmailProvider {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    fn normalized(&self) -> String {
        self.email.trim().to_lowercase()
    }

    fn uid_for(email: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(EMAIL_UID_DOMAIN.as_bytes());
        hasher.update(email.as_bytes());
        let digest = hasher.finalize();
        let mut uid: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        uid.truncate(EMAIL_UID_LEN);
        uid
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

impl IdentityProvider for EmailProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Email
    }

    fn sign_in(&self) -> Result<Session, AuthError> {
        let email = self.normalized();
        if email.is_empty() {
            return Err(AuthError::Cancelled);
        }
        if !is_plausible_email(&email) {
            return Err(AuthError::Rejected(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        let uid = Self::uid_for(&email);
        Ok(Session::new(uid, ProviderKind::Email, Some(email)))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
