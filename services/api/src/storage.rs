//! Binary storage for uploaded images
//!
//! Metadata lives in the repository, the bytes live behind a [`BlobStore`].
//! The reference returned by `put` is what ends up in `Image::filename`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

pub mod local;
pub mod object;

pub use local::LocalBlobStore;
pub use object::{ObjectBlobStore, ObjectStorageConfig};

#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Store `data` and return the reference under which it can be found again.
    async fn put(
        &self,
        owner: Option<&str>,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> anyhow::Result<String>;

    /// Remove a previously stored blob. Removing a missing blob is not an error.
    async fn delete(&self, reference: &str) -> anyhow::Result<()>;

    /// Whether `reference` points into this store, as opposed to an external URL
    fn owns(&self, reference: &str) -> bool;
}

/// Shared handle to the active blob store
pub type DynBlobStore = Arc<dyn BlobStore>;
