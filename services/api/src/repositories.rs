//! Repositories for gallery metadata
//!
//! Every backing store implements [`GalleryRepository`]; the rest of the
//! service only ever holds an `Arc<dyn GalleryRepository>`.

use std::sync::Arc;

use async_trait::async_trait;
use common::{Image, NewImage, NewUser, RepositoryResult, UpdateUser, User};
use serde::Serialize;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// Outcome of one item of a batch delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    pub id: Uuid,
    pub deleted: bool,
}

/// CRUD contract over users and images
#[async_trait]
pub trait GalleryRepository: Send + Sync + 'static {
    /// Persist a new user. Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User>;

    async fn get_user(&self, id: &str) -> RepositoryResult<Option<User>>;

    /// Merge the provided fields and refresh `updated_at`.
    async fn update_user(&self, id: &str, changes: UpdateUser) -> RepositoryResult<Option<User>>;

    /// All images, most recent upload first.
    async fn get_images(&self) -> RepositoryResult<Vec<Image>>;

    async fn get_image(&self, id: Uuid) -> RepositoryResult<Option<Image>>;

    /// Assign an id and upload time, default the category, and persist.
    async fn create_image(&self, image: NewImage) -> RepositoryResult<Image>;

    /// Returns `false` when the id is unknown.
    async fn delete_image(&self, id: Uuid) -> RepositoryResult<bool>;

    /// Delete several images, reporting each one. Not atomic.
    async fn delete_images(&self, ids: &[Uuid]) -> RepositoryResult<Vec<DeleteResult>> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let deleted = self.delete_image(*id).await?;
            results.push(DeleteResult { id: *id, deleted });
        }
        Ok(results)
    }
}

/// Shared handle to the active repository
pub type DynRepository = Arc<dyn GalleryRepository>;
