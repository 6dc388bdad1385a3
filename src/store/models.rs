// Pass Protector - Credential data models
//
// The password is never part of Debug or Display output. `CredentialRecord`
// keeps it private behind `password()`; `CredentialFields` is the caller-owned
// draft and redacts it in Debug.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of the session that owns a record (per-user tenancy only).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three user-editable values of a credential. Always written together.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialFields {
    pub site: String,
    pub username: String,
    pub password: String,
}

impl CredentialFields {
    pub fn new(
        site: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            site: site.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Names of the fields that are empty (after trimming whitespace).
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.site.trim().is_empty() {
            missing.push("site");
        }
        if self.username.trim().is_empty() {
            missing.push("username");
        }
        if self.password.is_empty() {
            missing.push("password");
        }
        missing
    }

    pub fn clear(&mut self) {
        self.site.clear();
        self.username.clear();
        self.password.clear();
    }
}

impl fmt::Debug for CredentialFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialFields")
            .field("site", &self.site)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A stored credential as returned by the store.
#[derive(Clone)]
pub struct CredentialRecord {
    pub id: Uuid,
    pub site: String,
    pub username: String,
    password: String,
    pub owner_id: Option<OwnerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(
        id: Uuid,
        fields: CredentialFields,
        owner_id: Option<OwnerId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            site: fields.site,
            username: fields.username,
            password: fields.password,
            owner_id,
            created_at,
            updated_at,
        }
    }

    /// The plain password, for copying or loading into an edit form.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// A copy of the editable values, ready to be loaded into a form.
    pub fn fields(&self) -> CredentialFields {
        CredentialFields::new(&self.site, &self.username, &self.password)
    }

    pub fn is_owned_by(&self, owner: Option<&OwnerId>) -> bool {
        self.owner_id.as_ref() == owner
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("site", &self.site)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("owner_id", &self.owner_id)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl fmt::Display for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.id, self.site, self.username)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(password: &str) -> CredentialRecord {
        CredentialRecord::new(
            Uuid::new_v4(),
            CredentialFields::new("example.com", "alice", password),
            Some(OwnerId::new("uid-a")),
            Utc::now(),
            Utc::now(),
        )
    }

    #[test]
    fn test_record_debug_redacts_password() {
        let rec = record("hunter2-very-secret");
        let debug_output = format!("{:?}", rec);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(
            !debug_output.contains("hunter2-very-secret"),
            "Debug output must never contain the password"
        );
    }

    #[test]
    fn test_record_display_shows_site_not_password() {
        let rec = record("xoxb-secret");
        let display_output = format!("{}", rec);
        assert!(display_output.contains("example.com"));
        assert!(display_output.contains("alice"));
        assert!(!display_output.contains("xoxb-secret"));
    }

    #[test]
    fn test_fields_debug_redacts_password() {
        let fields = CredentialFields::new("github.com", "bob", "ghp_abc");
        let debug_output = format!("{:?}", fields);
        assert!(debug_output.contains("github.com"));
        assert!(!debug_output.contains("ghp_abc"));
    }

    #[test]
    fn test_missing_fields_reports_each_empty_value() {
        let fields = CredentialFields::new("  ", "bob", "");
        assert_eq!(fields.missing(), vec!["site", "password"]);

        let full = CredentialFields::new("a", "b", "c");
        assert!(full.missing().is_empty());
    }

    #[test]
    fn test_password_with_only_spaces_counts_as_present() {
        let fields = CredentialFields::new("a", "b", "   ");
        assert!(fields.missing().is_empty());
    }

    #[test]
    fn test_record_fields_round_trip_into_form() {
        let rec = record("p1");
        let fields = rec.fields();
        assert_eq!(fields, CredentialFields::new("example.com", "alice", "p1"));
        assert_eq!(rec.password(), "p1");
    }

    #[test]
    fn test_ownership_check() {
        let rec = record("p1");
        assert!(rec.is_owned_by(Some(&OwnerId::new("uid-a"))));
        assert!(!rec.is_owned_by(Some(&OwnerId::new("uid-b"))));
        assert!(!rec.is_owned_by(None));
    }
}
