use rusqlite::Connection;

use super::SqliteResultExt;
use crate::DbError;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    // Idempotent baseline schema. The blob table lives next to the record
    // table so one transaction covers both.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS attachments (
            id          TEXT PRIMARY KEY,
            owner_kind  TEXT NOT NULL
                            CHECK(owner_kind IN ('task', 'habit', 'goal', 'event')),
            owner_id    TEXT NOT NULL,
            file_name   TEXT NOT NULL,
            file_type   TEXT NOT NULL DEFAULT '',
            mime_type   TEXT NOT NULL DEFAULT 'application/octet-stream',
            size_bytes  INTEGER NOT NULL DEFAULT 0,
            is_image    INTEGER NOT NULL DEFAULT 0,
            seq         INTEGER NOT NULL,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_attachments_owner
            ON attachments(owner_kind, owner_id);

        CREATE TABLE IF NOT EXISTS attachment_blobs (
            attachment_id TEXT PRIMARY KEY
                              REFERENCES attachments(id) ON DELETE CASCADE,
            data          BLOB NOT NULL,
            thumbnail     BLOB
        );
        ",
    )
    .to_db()?;

    // Versioned migrations
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .to_db()?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at)
         VALUES (1, datetime('now'))",
        [],
    )
    .to_db()?;

    Ok(())
}
