mod sqlite;

pub use sqlite::SqliteRegistry;

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use daystack_core::{Attachment, OwnerRef};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Internal(String),
}

/// The queryable index of attachment records plus their co-located blobs.
///
/// Implementations must make an inserted record and its blob visible
/// atomically: a reader either sees both or neither. The manager is the only
/// caller of the mutating methods.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Persist a record together with its original bytes and optional
    /// thumbnail in one atomic step. Fails if the id already exists.
    async fn insert(
        &self,
        record: &Attachment,
        data: Bytes,
        thumbnail: Option<Bytes>,
    ) -> Result<(), DbError>;

    /// Fetch a record by id. `DbError::NotFound` when absent.
    async fn get(&self, id: &str) -> Result<Attachment, DbError>;

    /// Records for one owner, newest first; creation-time ties break by
    /// insertion order (later insert first).
    async fn list_by_owner(&self, owner: &OwnerRef) -> Result<Vec<Attachment>, DbError>;

    /// Remove a record and its blobs. Returns whether a row was actually
    /// removed; repeat calls on the same id are a no-op.
    async fn delete(&self, id: &str) -> Result<bool, DbError>;

    /// Remove every attachment of one owner (owner entity destroyed).
    /// Returns the number of records removed.
    async fn delete_by_owner(&self, owner: &OwnerRef) -> Result<u64, DbError>;

    /// Original bytes for a record. `DbError::NotFound` when the id is gone.
    async fn read_blob(&self, id: &str) -> Result<Bytes, DbError>;

    /// Thumbnail bytes, `None` when generation was skipped or failed.
    async fn read_thumbnail(&self, id: &str) -> Result<Option<Bytes>, DbError>;
}

/// Default data directory: `$XDG_DATA_HOME/daystack` or
/// `~/.local/share/daystack`.
pub fn data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("daystack")
}
