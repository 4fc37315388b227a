use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filetype;
use crate::owner::OwnerRef;

/// One attachment record. Immutable once created; the only mutation the
/// pipeline supports is deletion. Original and thumbnail bytes live in the
/// registry's blob table, keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub owner: OwnerRef,
    pub file_name: String,
    pub file_type: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub is_image: bool,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    /// Build a record for freshly read source bytes. `file_type` and
    /// `mime_type` are derived from the name here and fixed for the record's
    /// lifetime; `size_bytes` must be the byte length of the original data.
    pub fn new(
        owner: OwnerRef,
        file_name: impl Into<String>,
        size_bytes: i64,
        is_image: bool,
    ) -> Self {
        let file_name = file_name.into();
        let file_type = filetype::normalize_extension(&file_name).unwrap_or_default();
        let mime_type = filetype::mime_type(&file_name).to_string();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner,
            file_name,
            file_type,
            mime_type,
            size_bytes,
            is_image,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_type_and_mime_from_name() {
        let att = Attachment::new(OwnerRef::task("t1"), "receipt.PDF", 512, false);
        assert_eq!(att.file_type, "pdf");
        assert_eq!(att.mime_type, "application/pdf");
        assert_eq!(att.size_bytes, 512);
        assert!(!att.is_image);
    }

    #[test]
    fn ids_are_unique_per_record() {
        let a = Attachment::new(OwnerRef::task("t1"), "a.png", 1, true);
        let b = Attachment::new(OwnerRef::task("t1"), "a.png", 1, true);
        assert_ne!(a.id, b.id);
    }
}
