use thiserror::Error;

use daystack_db::DbError;

#[derive(Debug, Error)]
pub enum AttachError {
    /// Source bytes could not be obtained (revoked permission, moved file,
    /// empty picker result). Aborts the remaining items of a batch add.
    #[error("read failed: {0}")]
    Read(String),

    /// Persistence failed; the attempted attachment was not created.
    #[error("write failed: {0}")]
    Write(String),

    /// The referenced id no longer exists.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<DbError> for AttachError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => AttachError::NotFound(msg),
            other => AttachError::Write(other.to_string()),
        }
    }
}
