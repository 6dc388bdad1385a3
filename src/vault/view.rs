// Pass Protector - Vault view state
//
// Everything a front end needs between two user actions: the draft form,
// whether it is creating or editing, the last listing and pending notices.
// Every write is followed by a full re-list; nothing is patched locally.

use std::fmt;

use uuid::Uuid;

use crate::auth::Session;
use crate::config::Tenancy;
use crate::store::{CredentialFields, CredentialRecord, CredentialStore, OwnerId};

use super::{Clipboard, VaultError};

/// Whether a save creates a new record or rewrites an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Creating,
    Editing(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Site,
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CopyField {
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NoticeLevel::Info => write!(f, "✓ {}", self.message),
            NoticeLevel::Error => write!(f, "✗ {}", self.message),
        }
    }
}

/// One line of the password table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based position in the current listing. Display only.
    pub index: usize,
    pub id: Uuid,
    pub site: String,
    pub username: String,
    pub password: String,
}

/// One `*` per character.
pub fn mask_password(password: &str) -> String {
    "*".repeat(password.chars().count())
}

pub struct VaultView {
    tenancy: Tenancy,
    session: Option<Session>,
    form: CredentialFields,
    mode: EditMode,
    records: Vec<CredentialRecord>,
    loading: bool,
    password_visible: bool,
    notices: Vec<Notice>,
}

impl VaultView {
    pub fn new(tenancy: Tenancy) -> Self {
        Self {
            tenancy,
            session: None,
            form: CredentialFields::default(),
            mode: EditMode::Creating,
            records: Vec::new(),
            loading: false,
            password_visible: false,
            notices: Vec::new(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    pub fn tenancy(&self) -> Tenancy {
        self.tenancy
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn form(&self) -> &CredentialFields {
        &self.form
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn password_visible(&self) -> bool {
        self.password_visible
    }

    /// Pending notices, oldest first. Draining them marks them shown.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ─── Session ─────────────────────────────────────────────────────────────

    /// React to a session notification. In per-user mode a present session
    /// triggers a listing; absence wipes the view without touching the store.
    pub fn apply_session(&mut self, session: Option<Session>, store: &dyn CredentialStore) {
        let same_identity =
            self.session.as_ref().map(|s| &s.uid) == session.as_ref().map(|s| &s.uid);
        self.session = session;

        if self.tenancy == Tenancy::Shared {
            return;
        }

        if self.session.is_some() {
            if !same_identity {
                self.reset_form();
            }
            // Errors are already turned into a notice.
            let _ = self.refresh(store);
        } else {
            self.reset_form();
            self.records.clear();
            self.loading = false;
        }
    }

    fn owner(&self) -> Result<Option<OwnerId>, VaultError> {
        match self.tenancy {
            Tenancy::Shared => Ok(None),
            Tenancy::PerUser => self
                .session
                .as_ref()
                .map(|s| Some(s.owner_id()))
                .ok_or(VaultError::NotSignedIn),
        }
    }

    // ─── Listing ─────────────────────────────────────────────────────────────

    /// Replace the listing with a fresh read. Without a session in per-user
    /// mode there is nothing to read and the store is not called.
    pub fn refresh(&mut self, store: &dyn CredentialStore) -> Result<(), VaultError> {
        let owner = match self.owner() {
            Ok(owner) => owner,
            Err(VaultError::NotSignedIn) => {
                self.records.clear();
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.loading = true;
        let result = store.list(owner.as_ref());
        self.loading = false;

        match result {
            Ok(records) => {
                self.records = records;
                Ok(())
            }
            Err(e) => {
                self.notices
                    .push(Notice::error(format!("Could not load passwords: {}", e)));
                Err(e.into())
            }
        }
    }

    /// Display rows for the current listing, masked unless visibility is on.
    pub fn rows(&self) -> Vec<Row> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| Row {
                index: i + 1,
                id: record.id,
                site: record.site.clone(),
                username: record.username.clone(),
                password: if self.password_visible {
                    record.password().to_string()
                } else {
                    mask_password(record.password())
                },
            })
            .collect()
    }

    pub fn toggle_password_visibility(&mut self) -> bool {
        self.password_visible = !self.password_visible;
        self.password_visible
    }

    /// The draft password as the form would show it.
    pub fn form_password_display(&self) -> String {
        if self.password_visible {
            self.form.password.clone()
        } else {
            mask_password(&self.form.password)
        }
    }

    // ─── Form ────────────────────────────────────────────────────────────────

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Site => self.form.site = value,
            Field::Username => self.form.username = value,
            Field::Password => self.form.password = value,
        }
    }

    /// Load a listed record into the form and switch to editing it.
    pub fn select_for_edit(&mut self, id: Uuid) -> Result<(), VaultError> {
        match self.records.iter().find(|r| r.id == id) {
            Some(record) => {
                self.form = record.fields();
                self.mode = EditMode::Editing(id);
                Ok(())
            }
            None => {
                let err = VaultError::UnknownRecord(id);
                self.notices.push(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn cancel_edit(&mut self) {
        self.reset_form();
    }

    fn reset_form(&mut self) {
        self.form.clear();
        self.mode = EditMode::Creating;
    }

    // ─── Writes ──────────────────────────────────────────────────────────────

    /// Create or update from the form, depending on the edit mode. On
    /// success the form resets and the listing is re-read; on failure both
    /// the form and the mode are kept so the user can retry.
    pub fn save(&mut self, store: &dyn CredentialStore) -> Result<Uuid, VaultError> {
        match self.write_form(store) {
            Ok(id) => {
                self.reset_form();
                self.notices.push(Notice::info("Password Saved Successfully"));
                let _ = self.refresh(store);
                Ok(id)
            }
            Err(e) => {
                self.notices
                    .push(Notice::error(format!("Could not save password: {}", e)));
                Err(e)
            }
        }
    }

    fn write_form(&self, store: &dyn CredentialStore) -> Result<Uuid, VaultError> {
        let owner = self.owner()?;

        let missing = self.form.missing();
        if !missing.is_empty() {
            return Err(VaultError::MissingFields(missing));
        }

        match self.mode {
            EditMode::Creating => Ok(store.create(&self.form, owner.as_ref())?),
            EditMode::Editing(id) => {
                store.update(&id, &self.form, owner.as_ref())?;
                Ok(id)
            }
        }
    }

    /// Delete a record and re-read. Deleting an id that is already gone
    /// reports `false` and is otherwise harmless.
    pub fn delete(&mut self, id: Uuid, store: &dyn CredentialStore) -> Result<bool, VaultError> {
        match self.delete_record(id, store) {
            Ok(existed) => {
                if self.mode == EditMode::Editing(id) {
                    self.reset_form();
                }
                if existed {
                    self.notices.push(Notice::info("Password Deleted"));
                } else {
                    self.notices.push(Notice::info("Password entry was already gone"));
                }
                let _ = self.refresh(store);
                Ok(existed)
            }
            Err(e) => {
                self.notices
                    .push(Notice::error(format!("Could not delete password: {}", e)));
                Err(e)
            }
        }
    }

    fn delete_record(&self, id: Uuid, store: &dyn CredentialStore) -> Result<bool, VaultError> {
        let owner = self.owner()?;

        // Never delete another user's record by guessing its id.
        if owner.is_some() {
            if let Some(existing) = store.get(&id)? {
                if !existing.is_owned_by(owner.as_ref()) {
                    return Err(VaultError::UnknownRecord(id));
                }
            }
        }

        Ok(store.delete(&id)?)
    }

    /// Put the plain value of one field of a listed record on the clipboard.
    pub fn copy(
        &mut self,
        id: Uuid,
        field: CopyField,
        clipboard: &mut dyn Clipboard,
    ) -> Result<(), VaultError> {
        let result = match self.records.iter().find(|r| r.id == id) {
            Some(record) => match field {
                CopyField::Username => clipboard.write_text(&record.username),
                CopyField::Password => clipboard.write_text(record.password()),
            },
            None => Err(VaultError::UnknownRecord(id)),
        };

        match result {
            Ok(()) => {
                self.notices.push(Notice::info("Copied to Clipboard"));
                Ok(())
            }
            Err(e) => {
                self.notices.push(Notice::error(format!("Could not copy: {}", e)));
                Err(e)
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
