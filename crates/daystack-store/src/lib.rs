use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Internal(String),
}

/// Staging area for preview hand-off.
///
/// A staged file lives at `<base>/<attachment-id>/<file-name>` so the viewer
/// sees the original name. Staged files are transient: the caller owns their
/// lifetime and discards them when the preview session ends. Nothing here
/// touches the registry.
pub struct ExportStore {
    base_dir: PathBuf,
}

impl ExportStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Staging area under the OS temp dir, shared per process.
    pub fn in_temp() -> Self {
        Self::new(std::env::temp_dir().join("daystack-exports"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn staging_dir(&self, attachment_id: &str) -> PathBuf {
        self.base_dir.join(attachment_id)
    }

    /// Write `data` to the staging location and return its path.
    /// Overwrites any previous staging of the same attachment.
    pub async fn stage(
        &self,
        attachment_id: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<PathBuf, StoreError> {
        let dir = self.staging_dir(attachment_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Internal(format!("mkdir {}: {e}", dir.display())))?;
        // Picker-provided names can carry directory components; only the
        // final component lands inside the staging dir.
        let name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let path = dir.join(name);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| StoreError::Internal(format!("write {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "staged export");
        Ok(path)
    }

    /// Drop one attachment's staged files. No-op if nothing is staged.
    pub async fn discard(&self, attachment_id: &str) -> Result<(), StoreError> {
        let dir = self.staging_dir(attachment_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Internal(format!(
                "discard {}: {e}",
                dir.display()
            ))),
        }
    }

    /// Drop the whole staging area (end of a preview session).
    pub async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_dir_all(&self.base_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Internal(format!(
                "clear {}: {e}",
                self.base_dir.display()
            ))),
        }
    }
}
