use async_trait::async_trait;
use bytes::Bytes;

/// A lazily-readable item handed over by the photo picker.
///
/// Pickers yield handles, not bytes; reading happens inside the add
/// pipeline so a revoked or vanished asset surfaces at the point of use.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Name recorded on the attachment, e.g. "IMG_0042.jpeg".
    fn file_name(&self) -> String;

    /// Read the full image bytes. `Ok(None)` means the handle yielded no
    /// data; both that and `Err` abort the item with a read error.
    async fn load(&self) -> std::io::Result<Option<Bytes>>;
}
