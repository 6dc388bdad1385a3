// Pass Protector - Credential Store Repository
//
// CRUD over the `passwords` collection. The adapter has no notion of an
// edit in progress: the caller picks `create` or `update`. An owner, when
// given, scopes reads and updates; `None` means no owner filter at all.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use super::db::Database;
use super::models::{CredentialFields, CredentialRecord, OwnerId};
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over credential storage operations.
pub trait CredentialStore {
    /// All records visible to `owner` (every record when `owner` is `None`).
    /// Newest first; the order carries no identity meaning.
    fn list(&self, owner: Option<&OwnerId>) -> Result<Vec<CredentialRecord>, StoreError>;

    /// Insert a new record. Returns the generated id.
    fn create(&self, fields: &CredentialFields, owner: Option<&OwnerId>) -> Result<Uuid, StoreError>;

    /// Replace all three fields of an existing record.
    /// Fails with `NotFound` if `id` does not exist under `owner`. The
    /// record keeps the owner it was created with.
    fn update(
        &self,
        id: &Uuid,
        fields: &CredentialFields,
        owner: Option<&OwnerId>,
    ) -> Result<(), StoreError>;

    /// Delete a record by id. Returns true if it existed.
    fn delete(&self, id: &Uuid) -> Result<bool, StoreError>;

    /// Look up a single record by id.
    fn get(&self, id: &Uuid) -> Result<Option<CredentialRecord>, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

const SELECT_COLUMNS: &str =
    "SELECT id, site, username, password, owner_id, created_at, updated_at FROM passwords";

pub struct SqliteCredentialStore<'a> {
    db: &'a Database,
}

impl<'a> SqliteCredentialStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRecord> {
        let id_str: String = row.get(0)?;
        let site: String = row.get(1)?;
        let username: String = row.get(2)?;
        let password: String = row.get(3)?;
        let owner_id: Option<String> = row.get(4)?;
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;

        let id = Uuid::parse_str(&id_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(CredentialRecord::new(
            id,
            CredentialFields::new(site, username, password),
            owner_id.map(OwnerId::new),
            parse_timestamp(5, &created_at_str)?,
            parse_timestamp(6, &updated_at_str)?,
        ))
    }
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

impl<'a> CredentialStore for SqliteCredentialStore<'a> {
    fn list(&self, owner: Option<&OwnerId>) -> Result<Vec<CredentialRecord>, StoreError> {
        let conn = self.db.conn();
        let mut records = Vec::new();

        match owner {
            Some(owner) => {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_COLUMNS} WHERE owner_id = ?1 ORDER BY rowid DESC"
                ))?;
                let rows = stmt.query_map(params![owner.as_str()], Self::row_to_record)?;
                for row in rows {
                    records.push(row?);
                }
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY rowid DESC"))?;
                let rows = stmt.query_map([], Self::row_to_record)?;
                for row in rows {
                    records.push(row?);
                }
            }
        }

        tracing::debug!(count = records.len(), owner = ?owner.map(OwnerId::as_str), "Listed credentials");
        Ok(records)
    }

    fn create(&self, fields: &CredentialFields, owner: Option<&OwnerId>) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        self.db.conn().execute(
            "INSERT INTO passwords
                (id, site, username, password, owner_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.to_string(),
                fields.site,
                fields.username,
                fields.password,
                owner.map(OwnerId::as_str),
                now,
                now,
            ],
        )?;

        tracing::info!(
            credential_id = %id,
            site = %fields.site,
            "Credential stored"
        );

        Ok(id)
    }

    fn update(
        &self,
        id: &Uuid,
        fields: &CredentialFields,
        owner: Option<&OwnerId>,
    ) -> Result<(), StoreError> {
        let affected = self.db.conn().execute(
            "UPDATE passwords
             SET site = ?2, username = ?3, password = ?4, updated_at = ?5
             WHERE id = ?1 AND (?6 IS NULL OR owner_id = ?6)",
            params![
                id.to_string(),
                fields.site,
                fields.username,
                fields.password,
                Utc::now().to_rfc3339(),
                owner.map(OwnerId::as_str),
            ],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound(*id));
        }

        tracing::info!(credential_id = %id, "Credential updated");
        Ok(())
    }

    fn delete(&self, id: &Uuid) -> Result<bool, StoreError> {
        let affected = self
            .db
            .conn()
            .execute("DELETE FROM passwords WHERE id = ?1", params![id.to_string()])?;

        if affected > 0 {
            tracing::info!(credential_id = %id, "Credential deleted");
        } else {
            tracing::debug!(credential_id = %id, "Delete of unknown credential ignored");
        }

        Ok(affected > 0)
    }

    fn get(&self, id: &Uuid) -> Result<Option<CredentialRecord>, StoreError> {
        let mut stmt = self
            .db
            .conn()
            .prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;

        let mut rows = stmt.query_map(params![id.to_string()], Self::row_to_record)?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(StoreError::Database(e)),
            None => Ok(None),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> OwnerId {
        OwnerId::new("uid-alice")
    }

    fn bob() -> OwnerId {
        OwnerId::new("uid-bob")
    }

    #[test]
    fn test_create_returns_v4_uuid() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        let id = store
            .create(&CredentialFields::new("github.com", "octo", "ghp_1"), None)
            .unwrap();
        assert_eq!(id.get_version(), Some(uuid::Version::Random));
    }

    #[test]
    fn test_create_then_list_shows_record_once() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        let fields = CredentialFields::new("example.com", "alice", "p1");
        let id = store.create(&fields, Some(&alice())).unwrap();

        let records = store.list(Some(&alice())).unwrap();
        let matching: Vec<_> = records.iter().filter(|r| r.id == id).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].fields(), fields);
        assert_eq!(matching[0].owner_id, Some(alice()));
    }

    #[test]
    fn test_update_replaces_all_fields_and_leaves_others() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        let target = store
            .create(&CredentialFields::new("a.com", "u1", "p1"), Some(&alice()))
            .unwrap();
        let other = store
            .create(&CredentialFields::new("b.com", "u2", "p2"), Some(&alice()))
            .unwrap();

        let replacement = CredentialFields::new("c.com", "u3", "p3");
        store.update(&target, &replacement, Some(&alice())).unwrap();

        let updated = store.get(&target).unwrap().unwrap();
        assert_eq!(updated.fields(), replacement);
        assert!(updated.updated_at >= updated.created_at);

        let untouched = store.get(&other).unwrap().unwrap();
        assert_eq!(untouched.fields(), CredentialFields::new("b.com", "u2", "p2"));
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        let missing = Uuid::new_v4();
        let err = store
            .update(&missing, &CredentialFields::new("a", "b", "c"), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == missing));
    }

    #[test]
    fn test_update_under_foreign_owner_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        let id = store
            .create(&CredentialFields::new("a.com", "alice", "p1"), Some(&alice()))
            .unwrap();

        let err = store
            .update(&id, &CredentialFields::new("a.com", "bob", "stolen"), Some(&bob()))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.get(&id).unwrap().unwrap().password(), "p1");
    }

    #[test]
    fn test_update_shared_record_without_owner() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        let id = store
            .create(&CredentialFields::new("a.com", "team", "p1"), None)
            .unwrap();
        store
            .update(&id, &CredentialFields::new("a.com", "team", "p2"), None)
            .unwrap();

        let rec = store.get(&id).unwrap().unwrap();
        assert_eq!(rec.password(), "p2");
        assert!(rec.owner_id.is_none());
    }

    #[test]
    fn test_unfiltered_update_keeps_owner() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        let id = store
            .create(&CredentialFields::new("a.com", "alice", "p1"), Some(&alice()))
            .unwrap();
        store
            .update(&id, &CredentialFields::new("a.com", "alice", "p2"), None)
            .unwrap();

        let rec = store.get(&id).unwrap().unwrap();
        assert_eq!(rec.password(), "p2");
        assert_eq!(rec.owner_id, Some(alice()));
    }

    #[test]
    fn test_delete_removes_only_target() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        let doomed = store
            .create(&CredentialFields::new("a.com", "u", "p"), None)
            .unwrap();
        let kept = store
            .create(&CredentialFields::new("b.com", "u", "p"), None)
            .unwrap();

        assert!(store.delete(&doomed).unwrap());

        let ids: Vec<Uuid> = store.list(None).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![kept]);
    }

    #[test]
    fn test_delete_nonexistent_returns_false_and_keeps_records() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        store
            .create(&CredentialFields::new("a.com", "u", "p"), None)
            .unwrap();

        assert!(!store.delete(&Uuid::new_v4()).unwrap());
        assert_eq!(store.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_repeated_delete_is_harmless() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        let id = store
            .create(&CredentialFields::new("a.com", "u", "p"), None)
            .unwrap();
        assert!(store.delete(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
    }

    #[test]
    fn test_owner_filter_isolates_interleaved_creates() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        for i in 0..5 {
            let owner = if i % 2 == 0 { alice() } else { bob() };
            store
                .create(
                    &CredentialFields::new(format!("site{i}.com"), "user", "pw"),
                    Some(&owner),
                )
                .unwrap();
        }

        let for_alice = store.list(Some(&alice())).unwrap();
        let for_bob = store.list(Some(&bob())).unwrap();

        assert_eq!(for_alice.len(), 3);
        assert_eq!(for_bob.len(), 2);
        assert!(for_alice.iter().all(|r| r.owner_id == Some(alice())));
        assert!(for_bob.iter().all(|r| r.owner_id == Some(bob())));

        // Unfiltered listing sees both tenants.
        assert_eq!(store.list(None).unwrap().len(), 5);
    }

    #[test]
    fn test_list_is_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);

        let first = store
            .create(&CredentialFields::new("first.com", "u", "p"), None)
            .unwrap();
        let second = store
            .create(&CredentialFields::new("second.com", "u", "p"), None)
            .unwrap();

        let ids: Vec<Uuid> = store.list(None).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn test_corrupt_timestamp_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);
        let id = store
            .create(&CredentialFields::new("a.com", "u", "p"), None)
            .unwrap();
        db.conn()
            .execute(
                "UPDATE passwords SET updated_at = 'yesterday' WHERE id = ?1",
                params![id.to_string()],
            )
            .unwrap();

        assert!(matches!(store.list(None), Err(StoreError::Database(_))));
        assert!(matches!(store.get(&id), Err(StoreError::Database(_))));
    }

    #[test]
    fn test_get_nonexistent_returns_none() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);
        assert!(store.get(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_full_crud_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCredentialStore::new(&db);
        let owner = alice();

        let id = store
            .create(&CredentialFields::new("example.com", "alice", "p1"), Some(&owner))
            .unwrap();

        let listed = store.list(Some(&owner)).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].password(), "p1");

        store
            .update(&id, &CredentialFields::new("example.com", "alice", "p2"), Some(&owner))
            .unwrap();

        let listed = store.list(Some(&owner)).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].password(), "p2");

        assert!(store.delete(&id).unwrap());
        assert!(store.list(Some(&owner)).unwrap().is_empty());
    }
}
