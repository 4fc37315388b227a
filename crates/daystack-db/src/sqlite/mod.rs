pub(crate) mod migrations;
pub(crate) mod queries;

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::Connection;

use daystack_core::{Attachment, OwnerRef};

use crate::{DbError, Registry};

/// Extension trait that converts `rusqlite::Result<T>` into
/// `Result<T, DbError>`. `.to_db()?` is the shortest way to do the mapping
/// inside the query modules.
pub(crate) trait SqliteResultExt<T> {
    fn to_db(self) -> Result<T, DbError>;
}

impl<T> SqliteResultExt<T> for rusqlite::Result<T> {
    fn to_db(self) -> Result<T, DbError> {
        self.map_err(map_sqlite_err)
    }
}

pub(crate) fn map_sqlite_err(e: rusqlite::Error) -> DbError {
    DbError::Internal(e.to_string())
}

#[derive(Clone)]
pub struct SqliteRegistry {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRegistry {
    pub fn open_path(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(map_sqlite_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )
        .map_err(map_sqlite_err)?;
        let registry = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        registry.run_migrations()?;
        tracing::debug!(path = %path.display(), "attachment registry opened");
        Ok(registry)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_err)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(map_sqlite_err)?;
        let registry = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        registry.run_migrations()?;
        Ok(registry)
    }

    pub fn open_default() -> Result<Self, DbError> {
        let dir = crate::data_dir();
        std::fs::create_dir_all(&dir)?;
        Self::open_path(&dir.join("daystack.db"))
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Connection) -> Result<T, DbError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Internal("lock poisoned".into()))?;
        f(&conn)
    }

    fn run_migrations(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            migrations::run(conn)?;
            Ok(())
        })
    }
}

#[async_trait]
impl Registry for SqliteRegistry {
    async fn insert(
        &self,
        record: &Attachment,
        data: Bytes,
        thumbnail: Option<Bytes>,
    ) -> Result<(), DbError> {
        let db = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || {
            db.insert_sync(&record, &data, thumbnail.as_deref())
        })
        .await
        .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn get(&self, id: &str) -> Result<Attachment, DbError> {
        let db = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || db.get_sync(&id))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn list_by_owner(&self, owner: &OwnerRef) -> Result<Vec<Attachment>, DbError> {
        let db = self.clone();
        let owner = owner.clone();
        tokio::task::spawn_blocking(move || db.list_by_owner_sync(&owner))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let db = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || db.delete_sync(&id))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn delete_by_owner(&self, owner: &OwnerRef) -> Result<u64, DbError> {
        let db = self.clone();
        let owner = owner.clone();
        tokio::task::spawn_blocking(move || db.delete_by_owner_sync(&owner))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn read_blob(&self, id: &str) -> Result<Bytes, DbError> {
        let db = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || db.read_blob_sync(&id))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }

    async fn read_thumbnail(&self, id: &str) -> Result<Option<Bytes>, DbError> {
        let db = self.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || db.read_thumbnail_sync(&id))
            .await
            .map_err(|e| DbError::Internal(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_runs_migrations() {
        let db = SqliteRegistry::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get(0))
                .map_err(map_sqlite_err)?;
            assert!(count > 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn open_path_creates_file_and_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("nested/daystack.db");
        assert!(!db_path.exists());

        let _db = SqliteRegistry::open_path(&db_path).unwrap();
        assert!(db_path.exists());
    }
}
