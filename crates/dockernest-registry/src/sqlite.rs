//! SQLite-backed ownership registry.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use dockernest_common::types::{RecordId, RuntimeId, UserId};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{RegistryError, Result};
use crate::record::{NewWorkloadRecord, WorkloadRecord};
use crate::store::OwnershipRegistry;

/// `AUTOINCREMENT` keeps record ids from ever being reused.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS workloads (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL,
    image       TEXT    NOT NULL,
    runtime_id  TEXT    UNIQUE,
    owner_id    INTEGER NOT NULL,
    created_at  TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS workloads_owner ON workloads (owner_id);
";

const SELECT_COLUMNS: &str = "SELECT id, name, image, runtime_id, owner_id, created_at FROM workloads";

/// Registry persisted in a single `SQLite` database.
#[derive(Debug)]
pub struct SqliteRegistry {
    conn: Mutex<Connection>,
}

impl SqliteRegistry {
    /// Opens (creating if needed) the database at `path` and applies the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database cannot be opened or initialized.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RegistryError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let conn = Connection::open(path)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "wal", |row| row.get(0))?;
        tracing::info!(path = %path.display(), "opened workload registry");
        Self::init(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RegistryError::Unavailable {
            message: "registry connection lock poisoned".to_string(),
        })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<WorkloadRecord> {
    Ok(WorkloadRecord::from_parts(
        RecordId::new(row.get(0)?),
        row.get(1)?,
        row.get(2)?,
        row.get::<_, Option<String>>(3)?.map(RuntimeId::new),
        UserId::new(row.get(4)?),
        row.get(5)?,
    ))
}

impl OwnershipRegistry for SqliteRegistry {
    fn find_by_owner(&self, owner: UserId) -> Result<Vec<WorkloadRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE owner_id = ?1 ORDER BY id"))?;
        let rows = stmt.query_map(params![owner.get()], record_from_row)?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn find_owned(&self, owner: UserId, id: RecordId) -> Result<Option<WorkloadRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1 AND owner_id = ?2"),
                params![id.get(), owner.get()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn insert(&self, record: NewWorkloadRecord) -> Result<WorkloadRecord> {
        let created_at = chrono::Utc::now().to_rfc3339();
        let conn = self.conn()?;
        let _ = conn.execute(
            "INSERT INTO workloads (name, image, runtime_id, owner_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.name,
                record.image,
                record.runtime_id.as_str(),
                record.owner.get(),
                created_at
            ],
        )?;
        let id = RecordId::new(conn.last_insert_rowid());
        tracing::debug!(record_id = %id, owner = %record.owner, "workload record inserted");
        Ok(record.into_record(id, created_at))
    }

    fn delete(&self, record: &WorkloadRecord) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM workloads WHERE id = ?1 AND owner_id = ?2",
            params![record.id().get(), record.owner().get()],
        )?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(owner: i64, name: &str, runtime_id: &str) -> NewWorkloadRecord {
        NewWorkloadRecord {
            owner: UserId::new(owner),
            name: name.into(),
            image: "nginx".into(),
            runtime_id: RuntimeId::new(runtime_id),
        }
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let registry = SqliteRegistry::open_in_memory().unwrap();
        let a = registry.insert(new_record(1, "a", "r1")).unwrap();
        let b = registry.insert(new_record(1, "b", "r2")).unwrap();
        assert!(b.id() > a.id());
        assert_eq!(a.runtime_id().map(RuntimeId::as_str), Some("r1"));
    }

    #[test]
    fn lookups_are_scoped_by_owner() {
        let registry = SqliteRegistry::open_in_memory().unwrap();
        let mine = registry.insert(new_record(1, "web", "r1")).unwrap();
        let _ = registry.insert(new_record(2, "web", "r2")).unwrap();

        assert_eq!(registry.find_by_owner(UserId::new(1)).unwrap(), vec![mine.clone()]);
        assert!(registry.find_owned(UserId::new(2), mine.id()).unwrap().is_none());
        assert_eq!(
            registry.find_owned(UserId::new(1), mine.id()).unwrap(),
            Some(mine)
        );
    }

    #[test]
    fn delete_is_idempotent() {
        let registry = SqliteRegistry::open_in_memory().unwrap();
        let record = registry.insert(new_record(1, "web", "r1")).unwrap();
        assert!(registry.delete(&record).unwrap());
        assert!(!registry.delete(&record).unwrap());
        assert!(registry.find_by_owner(UserId::new(1)).unwrap().is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let registry = SqliteRegistry::open_in_memory().unwrap();
        let first = registry.insert(new_record(1, "a", "r1")).unwrap();
        assert!(registry.delete(&first).unwrap());
        let second = registry.insert(new_record(1, "a", "r2")).unwrap();
        assert!(second.id() > first.id());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("registry.db");
        let id = {
            let registry = SqliteRegistry::open(&path).unwrap();
            registry.insert(new_record(3, "db", "r9")).unwrap().id()
        };
        let reopened = SqliteRegistry::open(&path).unwrap();
        let record = reopened.find_owned(UserId::new(3), id).unwrap().unwrap();
        assert_eq!(record.name(), "db");
        assert!(!record.created_at().is_empty());
    }

    #[test]
    fn duplicate_runtime_id_is_rejected() {
        let registry = SqliteRegistry::open_in_memory().unwrap();
        let _ = registry.insert(new_record(1, "a", "same")).unwrap();
        let err = registry.insert(new_record(1, "b", "same")).unwrap_err();
        assert!(matches!(err, RegistryError::Storage { .. }));
    }
}
