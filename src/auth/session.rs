// Pass Protector - Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::OwnerId;

/// How the current identity was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anonymous,
    Email,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Anonymous => f.write_str("anonymous"),
            ProviderKind::Email => f.write_str("email"),
        }
    }
}

/// An authenticated identity. `uid` is stable for the identity's lifetime and
/// is what records are owned by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub provider: ProviderKind,
    pub display_name: Option<String>,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(uid: impl Into<String>, provider: ProviderKind, display_name: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            provider,
            display_name,
            signed_in_at: Utc::now(),
        }
    }

    pub fn owner_id(&self) -> OwnerId {
        OwnerId::new(&self.uid)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_name {
            Some(ref name) => write!(f, "{} ({}, uid {})", name, self.provider, self.uid),
            None => write!(f, "{} user (uid {})", self.provider, self.uid),
        }
    }
}
