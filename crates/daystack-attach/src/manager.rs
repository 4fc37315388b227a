use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use bytes::Bytes;
use tokio::sync::{watch, Mutex as AsyncMutex};

use daystack_core::{filetype, Attachment, OwnerRef};
use daystack_db::{DbError, Registry};
use daystack_store::ExportStore;

use crate::error::AttachError;
use crate::source::PhotoSource;
use crate::thumbnail;

/// Sole entry point for mutating the attachment registry.
///
/// Constructed once at the composition root and passed to whatever needs it.
/// Adds against one owner serialize through a per-owner mutex; adds against
/// different owners run concurrently. UI-facing state (busy flag, change
/// revision) is published through watch channels so observers never block
/// the pipeline.
pub struct AttachmentManager {
    registry: Arc<dyn Registry>,
    exports: ExportStore,
    owner_locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    adds_in_flight: AtomicUsize,
    busy_tx: watch::Sender<bool>,
    revision_tx: watch::Sender<u64>,
}

impl AttachmentManager {
    pub fn new(registry: Arc<dyn Registry>, exports: ExportStore) -> Self {
        let (busy_tx, _) = watch::channel(false);
        let (revision_tx, _) = watch::channel(0);
        Self {
            registry,
            exports,
            owner_locks: StdMutex::new(HashMap::new()),
            adds_in_flight: AtomicUsize::new(0),
            busy_tx,
            revision_tx,
        }
    }

    /// True while any add is in flight. Callers use this to disable
    /// duplicate submission and to decide whether to auto-dismiss a picker.
    pub fn is_adding(&self) -> bool {
        self.adds_in_flight.load(Ordering::SeqCst) > 0
    }

    /// Watch the busy flag instead of polling it.
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy_tx.subscribe()
    }

    /// Revision counter bumped after every successful mutation; list views
    /// re-query when it moves.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }

    // -- Add pipelines --

    /// Add one picked photo. The handle's bytes are read here; a handle
    /// that errors or yields nothing fails with `AttachError::Read`.
    pub async fn add_photo(
        &self,
        owner: &OwnerRef,
        source: &dyn PhotoSource,
    ) -> Result<Attachment, AttachError> {
        let _busy = self.begin_add();
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;
        self.add_photo_locked(owner, source).await
    }

    /// Add a batch of picked photos, strictly one at a time. The first
    /// failure aborts the remaining items; records persisted before the
    /// failure stay.
    pub async fn add_photos(
        &self,
        owner: &OwnerRef,
        sources: &[Box<dyn PhotoSource>],
    ) -> Result<Vec<Attachment>, AttachError> {
        let _busy = self.begin_add();
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;
        let mut added = Vec::with_capacity(sources.len());
        for source in sources {
            match self.add_photo_locked(owner, source.as_ref()).await {
                Ok(att) => added.push(att),
                Err(e) => {
                    tracing::warn!(owner = %owner, added = added.len(), "batch add aborted: {e}");
                    return Err(e);
                }
            }
        }
        Ok(added)
    }

    /// Add a file picked from the filesystem. Type and mime come from the
    /// extension; only recognized image extensions enter the thumbnail
    /// pipeline.
    pub async fn add_file(
        &self,
        owner: &OwnerRef,
        path: &Path,
    ) -> Result<Attachment, AttachError> {
        let _busy = self.begin_add();
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| AttachError::Read(format!("{}: {e}", path.display())))?;
        let is_image = filetype::is_image(&file_name);
        self.persist(owner, &file_name, Bytes::from(data), is_image)
            .await
    }

    /// Direct path for camera captures: bytes are already decoded and are
    /// always classified as an image.
    pub async fn add_image_bytes(
        &self,
        owner: &OwnerRef,
        data: Bytes,
        file_name: &str,
    ) -> Result<Attachment, AttachError> {
        let _busy = self.begin_add();
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;
        if data.is_empty() {
            return Err(AttachError::Read(format!("{file_name}: empty capture")));
        }
        self.persist(owner, file_name, data, true).await
    }

    async fn add_photo_locked(
        &self,
        owner: &OwnerRef,
        source: &dyn PhotoSource,
    ) -> Result<Attachment, AttachError> {
        let file_name = source.file_name();
        let data = match source.load().await {
            Ok(Some(data)) if !data.is_empty() => data,
            Ok(_) => {
                return Err(AttachError::Read(format!(
                    "{file_name}: source yielded no data"
                )))
            }
            Err(e) => return Err(AttachError::Read(format!("{file_name}: {e}"))),
        };
        self.persist(owner, &file_name, data, true).await
    }

    /// Thumbnail (images only), then record + blobs in one atomic insert.
    /// Runs inside `spawn_blocking` for the CPU-bound and storage steps, so
    /// a caller dropping its future mid-add cannot leave a partial write.
    async fn persist(
        &self,
        owner: &OwnerRef,
        file_name: &str,
        data: Bytes,
        is_image: bool,
    ) -> Result<Attachment, AttachError> {
        let thumbnail = if is_image {
            let bytes = data.clone();
            tokio::task::spawn_blocking(move || thumbnail::create_thumbnail(&bytes))
                .await
                .map_err(|e| AttachError::Write(e.to_string()))?
                .map(Bytes::from)
        } else {
            None
        };

        let record = Attachment::new(owner.clone(), file_name, data.len() as i64, is_image);
        self.registry.insert(&record, data, thumbnail).await?;
        self.bump_revision();
        tracing::info!(owner = %owner, id = %record.id, file = %record.file_name, "attachment added");
        Ok(record)
    }

    // -- Export --

    /// Materialize the original bytes to a transient location for the
    /// preview surface. Returns `None` when the blob is gone or the staging
    /// write fails; never mutates the registry. The staged file's lifetime
    /// belongs to the caller.
    pub async fn export(&self, attachment: &Attachment) -> Option<PathBuf> {
        let data = match self.registry.read_blob(&attachment.id).await {
            Ok(data) => data,
            Err(DbError::NotFound(_)) => {
                tracing::debug!(id = %attachment.id, "export of deleted attachment");
                return None;
            }
            Err(e) => {
                tracing::warn!(id = %attachment.id, "export read failed: {e}");
                return None;
            }
        };
        match self
            .exports
            .stage(&attachment.id, &attachment.file_name, &data)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(id = %attachment.id, "export stage failed: {e}");
                None
            }
        }
    }

    // -- Delete --

    /// Remove a record and release its blobs. Returns whether anything was
    /// removed; a second call on the same id reports `false` rather than
    /// erroring.
    pub async fn delete(&self, id: &str) -> Result<bool, AttachError> {
        let removed = self.registry.delete(id).await?;
        if removed {
            self.bump_revision();
            tracing::info!(id, "attachment deleted");
        } else {
            tracing::debug!(id, "delete of unknown attachment ignored");
        }
        // Any staged preview copy is stale either way.
        if let Err(e) = self.exports.discard(id).await {
            tracing::warn!(id, "discarding staged export failed: {e}");
        }
        Ok(removed)
    }

    /// Cascade used when the owning entity itself is destroyed.
    pub async fn delete_owner(&self, owner: &OwnerRef) -> Result<u64, AttachError> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;
        let records = self.registry.list_by_owner(owner).await?;
        let removed = self.registry.delete_by_owner(owner).await?;
        if removed > 0 {
            self.bump_revision();
            tracing::info!(owner = %owner, removed, "owner attachments purged");
        }
        for record in records {
            if let Err(e) = self.exports.discard(&record.id).await {
                tracing::warn!(id = %record.id, "discarding staged export failed: {e}");
            }
        }
        Ok(removed)
    }

    // -- Read-through accessors --

    pub async fn list(&self, owner: &OwnerRef) -> Result<Vec<Attachment>, AttachError> {
        Ok(self.registry.list_by_owner(owner).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Attachment, AttachError> {
        Ok(self.registry.get(id).await?)
    }

    pub async fn thumbnail(&self, id: &str) -> Result<Option<Bytes>, AttachError> {
        Ok(self.registry.read_thumbnail(id).await?)
    }

    pub async fn original(&self, id: &str) -> Result<Bytes, AttachError> {
        Ok(self.registry.read_blob(id).await?)
    }

    // -- Internals --

    fn owner_lock(&self, owner: &OwnerRef) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .owner_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(owner.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn begin_add(&self) -> BusyGuard<'_> {
        self.adds_in_flight.fetch_add(1, Ordering::SeqCst);
        self.busy_tx.send_replace(true);
        BusyGuard { manager: self }
    }

    fn bump_revision(&self) {
        self.revision_tx.send_modify(|rev| *rev += 1);
    }
}

/// Clears the busy flag when the last in-flight add finishes, including on
/// error paths.
struct BusyGuard<'a> {
    manager: &'a AttachmentManager,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.manager.adds_in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.manager.busy_tx.send_replace(false);
        }
    }
}
