use bytes::Bytes;
use rusqlite::{params, OptionalExtension, Row};

use daystack_core::owner::OwnerKind;
use daystack_core::{Attachment, OwnerRef};

use super::super::{SqliteRegistry, SqliteResultExt};
use crate::DbError;

fn row_to_attachment(row: &Row) -> rusqlite::Result<Attachment> {
    let kind_str: String = row.get("owner_kind")?;
    Ok(Attachment {
        id: row.get("id")?,
        owner: OwnerRef {
            kind: OwnerKind::from_str(&kind_str).unwrap_or(OwnerKind::Task),
            id: row.get("owner_id")?,
        },
        file_name: row.get("file_name")?,
        file_type: row.get("file_type")?,
        mime_type: row.get("mime_type")?,
        size_bytes: row.get("size_bytes")?,
        is_image: row.get("is_image")?,
        created_at: row.get("created_at")?,
    })
}

impl SqliteRegistry {
    /// Record + blobs in one transaction. Readers never see the row without
    /// its data or the data without its row.
    pub fn insert_sync(
        &self,
        record: &Attachment,
        data: &[u8],
        thumbnail: Option<&[u8]>,
    ) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction().to_db()?;
            let seq: i64 = tx
                .query_row(
                    "SELECT COALESCE(MAX(seq), 0) + 1 FROM attachments",
                    [],
                    |r| r.get(0),
                )
                .to_db()?;
            tx.execute(
                "INSERT INTO attachments
                     (id, owner_kind, owner_id, file_name, file_type, mime_type,
                      size_bytes, is_image, seq, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.owner.kind.as_str(),
                    record.owner.id,
                    record.file_name,
                    record.file_type,
                    record.mime_type,
                    record.size_bytes,
                    record.is_image,
                    seq,
                    record.created_at,
                ],
            )
            .to_db()?;
            tx.execute(
                "INSERT INTO attachment_blobs (attachment_id, data, thumbnail)
                 VALUES (?1, ?2, ?3)",
                params![record.id, data, thumbnail],
            )
            .to_db()?;
            tx.commit().to_db()
        })
    }

    pub fn get_sync(&self, id: &str) -> Result<Attachment, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM attachments WHERE id = ?1",
                params![id],
                row_to_attachment,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    DbError::NotFound(format!("attachment {id}"))
                }
                other => DbError::Internal(other.to_string()),
            })
        })
    }

    pub fn list_by_owner_sync(&self, owner: &OwnerRef) -> Result<Vec<Attachment>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT * FROM attachments
                     WHERE owner_kind = ?1 AND owner_id = ?2
                     ORDER BY created_at DESC, seq DESC",
                )
                .to_db()?;
            let attachments = stmt
                .query_map(params![owner.kind.as_str(), owner.id], row_to_attachment)
                .to_db()?
                .collect::<Result<Vec<_>, _>>()
                .to_db()?;
            Ok(attachments)
        })
    }

    pub fn delete_sync(&self, id: &str) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            // Blobs cascade with the row.
            let removed = conn
                .execute("DELETE FROM attachments WHERE id = ?1", params![id])
                .to_db()?;
            Ok(removed > 0)
        })
    }

    pub fn delete_by_owner_sync(&self, owner: &OwnerRef) -> Result<u64, DbError> {
        self.with_conn(|conn| {
            let removed = conn
                .execute(
                    "DELETE FROM attachments WHERE owner_kind = ?1 AND owner_id = ?2",
                    params![owner.kind.as_str(), owner.id],
                )
                .to_db()?;
            Ok(removed as u64)
        })
    }

    pub fn read_blob_sync(&self, id: &str) -> Result<Bytes, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT data FROM attachment_blobs WHERE attachment_id = ?1",
                params![id],
                |r| r.get::<_, Vec<u8>>(0),
            )
            .map(Bytes::from)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    DbError::NotFound(format!("blob for attachment {id}"))
                }
                other => DbError::Internal(other.to_string()),
            })
        })
    }

    pub fn read_thumbnail_sync(&self, id: &str) -> Result<Option<Bytes>, DbError> {
        self.with_conn(|conn| {
            let thumb = conn
                .query_row(
                    "SELECT thumbnail FROM attachment_blobs WHERE attachment_id = ?1",
                    params![id],
                    |r| r.get::<_, Option<Vec<u8>>>(0),
                )
                .optional()
                .to_db()?;
            Ok(thumb.flatten().map(Bytes::from))
        })
    }
}
