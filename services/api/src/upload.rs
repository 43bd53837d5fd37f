//! Upload handling: validation, binary persistence and metadata creation

use std::path::Path;

use bytes::Bytes;
use chrono::Utc;
use common::{Category, Image, NewImage, RepositoryError, UpdateUser, User};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::repositories::DynRepository;
use crate::storage::DynBlobStore;

/// Maximum number of files accepted by one gallery upload request
pub const MAX_FILES_PER_REQUEST: usize = 10;

const MIB: usize = 1024 * 1024;

/// Size ceiling applied to every file of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl UploadPolicy {
    pub const GALLERY: UploadPolicy = UploadPolicy { max_bytes: 10 * MIB };
    pub const AVATAR: UploadPolicy = UploadPolicy { max_bytes: 5 * MIB };
}

/// One file of a multipart upload
#[derive(Debug, Clone)]
pub struct FilePart {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Invalid file type for {name}: only images are allowed")]
    InvalidFileType { name: String },

    #[error("File {name} is too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { name: String, size: usize, limit: usize },

    #[error("Too many files: at most {0} files per upload")]
    TooManyFiles(usize),

    #[error("No files uploaded")]
    NoFiles,

    #[error("User not found")]
    UserNotFound,

    #[error("Failed to store file: {0}")]
    Storage(anyhow::Error),

    #[error("Failed to save image metadata: {0}")]
    Repository(#[from] RepositoryError),
}

/// A file turned away by validation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedFile {
    pub original_name: String,
    pub reason: String,
}

/// Result of a gallery upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    /// Created records, in input order
    pub images: Vec<Image>,
    pub rejected: Vec<RejectedFile>,
}

/// Check one file against a policy
pub fn validate(part: &FilePart, policy: UploadPolicy) -> Result<(), UploadError> {
    if !part.content_type.starts_with("image/") {
        return Err(UploadError::InvalidFileType {
            name: part.original_name.clone(),
        });
    }

    if part.bytes.len() > policy.max_bytes {
        return Err(UploadError::FileTooLarge {
            name: part.original_name.clone(),
            size: part.bytes.len(),
            limit: policy.max_bytes,
        });
    }

    Ok(())
}

/// `{unix millis}-{random}{.ext}`, keeping the original extension
pub fn generate_filename(original_name: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    format!("{}-{}{}", Utc::now().timestamp_millis(), suffix, extension)
}

/// Validates uploads, stores the bytes and records the metadata
#[derive(Clone)]
pub struct UploadHandler {
    repository: DynRepository,
    blobs: DynBlobStore,
}

impl UploadHandler {
    pub fn new(repository: DynRepository, blobs: DynBlobStore) -> Self {
        Self { repository, blobs }
    }

    /// Handle a gallery upload.
    ///
    /// Invalid files are rejected one by one; when nothing is left to store the
    /// first rejection is returned as the error. Accepted files are stored in
    /// order and the first storage failure aborts the remainder of the batch.
    pub async fn upload(
        &self,
        parts: Vec<FilePart>,
        owner: Option<&str>,
    ) -> Result<UploadOutcome, UploadError> {
        if parts.is_empty() {
            return Err(UploadError::NoFiles);
        }
        if parts.len() > MAX_FILES_PER_REQUEST {
            return Err(UploadError::TooManyFiles(MAX_FILES_PER_REQUEST));
        }

        let mut accepted = Vec::with_capacity(parts.len());
        let mut rejections = Vec::new();
        for part in parts {
            match validate(&part, UploadPolicy::GALLERY) {
                Ok(()) => accepted.push(part),
                Err(e) => rejections.push(e),
            }
        }

        if accepted.is_empty() {
            return Err(rejections.remove(0));
        }

        let mut images = Vec::with_capacity(accepted.len());
        for part in accepted {
            images.push(self.store(part, owner).await?);
        }

        info!(
            "Uploaded {} images ({} rejected)",
            images.len(),
            rejections.len()
        );

        let rejected = rejections
            .into_iter()
            .map(|e| RejectedFile {
                original_name: match &e {
                    UploadError::InvalidFileType { name } => name.clone(),
                    UploadError::FileTooLarge { name, .. } => name.clone(),
                    _ => String::new(),
                },
                reason: e.to_string(),
            })
            .collect();

        Ok(UploadOutcome { images, rejected })
    }

    async fn store(&self, part: FilePart, owner: Option<&str>) -> Result<Image, UploadError> {
        let filename = generate_filename(&part.original_name);
        let size = part.bytes.len() as i64;

        let reference = self
            .blobs
            .put(owner, &filename, &part.content_type, part.bytes)
            .await
            .map_err(|e| {
                error!("Failed to store {}: {:#}", part.original_name, e);
                UploadError::Storage(e)
            })?;

        let category = Category::from_filename(&part.original_name);
        let image = self
            .repository
            .create_image(NewImage {
                filename: reference,
                original_name: part.original_name,
                mime_type: part.content_type,
                size,
                category: Some(category),
                user_id: owner.map(str::to_string),
            })
            .await?;

        Ok(image)
    }

    /// Replace a user's avatar, returning the updated profile.
    ///
    /// The previous avatar is removed best-effort once the profile points at
    /// the new one, unless it lives outside the blob store.
    pub async fn upload_avatar(&self, user_id: &str, part: FilePart) -> Result<User, UploadError> {
        validate(&part, UploadPolicy::AVATAR)?;

        let previous = self
            .repository
            .get_user(user_id)
            .await?
            .ok_or(UploadError::UserNotFound)?
            .avatar_url;

        let filename = generate_filename(&part.original_name);
        let reference = self
            .blobs
            .put(Some(user_id), &filename, &part.content_type, part.bytes)
            .await
            .map_err(UploadError::Storage)?;

        let user = self
            .repository
            .update_user(
                user_id,
                UpdateUser {
                    avatar_url: Some(reference),
                    ..Default::default()
                },
            )
            .await?
            .ok_or(UploadError::UserNotFound)?;

        if let Some(previous) = previous.filter(|p| self.blobs.owns(p)) {
            if let Err(e) = self.blobs.delete(&previous).await {
                warn!("Failed to delete previous avatar {}: {:#}", previous, e);
            }
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::repositories::{GalleryRepository, MemoryRepository};
    use crate::storage::LocalBlobStore;
    use crate::storage::testing::FlakyBlobStore;
    use common::NewUser;

    fn part(name: &str, content_type: &str, len: usize) -> FilePart {
        FilePart {
            original_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from(vec![0u8; len]),
        }
    }

    fn handler(dir: &Path) -> (UploadHandler, Arc<MemoryRepository>) {
        let repository = Arc::new(MemoryRepository::new());
        let handler = UploadHandler::new(repository.clone(), Arc::new(LocalBlobStore::new(dir)));
        (handler, repository)
    }

    #[test]
    fn test_validate_size_boundary() {
        let exact = part("a.png", "image/png", 10 * MIB);
        assert!(validate(&exact, UploadPolicy::GALLERY).is_ok());

        let over = part("a.png", "image/png", 10 * MIB + 1);
        assert!(matches!(
            validate(&over, UploadPolicy::GALLERY),
            Err(UploadError::FileTooLarge { size, limit, .. }) if size == 10 * MIB + 1 && limit == 10 * MIB
        ));

        let avatar = part("me.png", "image/png", 5 * MIB + 1);
        assert!(validate(&avatar, UploadPolicy::AVATAR).is_err());
    }

    #[test]
    fn test_validate_mime_type() {
        let text = part("notes.txt", "text/plain", 10);
        assert!(matches!(
            validate(&text, UploadPolicy::GALLERY),
            Err(UploadError::InvalidFileType { .. })
        ));
        assert!(validate(&part("a.webp", "image/webp", 10), UploadPolicy::GALLERY).is_ok());
    }

    #[test]
    fn test_generate_filename_keeps_extension() {
        let name = generate_filename("holiday.JPG");
        assert!(name.ends_with(".JPG"));
        let (millis, rest) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert!(rest.trim_end_matches(".JPG").parse::<u32>().is_ok());

        assert!(!generate_filename("no_extension").contains('.'));
        assert!(!generate_filename("weird.p/ng").contains('/'));
        assert_ne!(generate_filename("a.png"), generate_filename("a.png"));
    }

    #[tokio::test]
    async fn test_upload_records_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, repository) = handler(dir.path());

        let outcome = handler
            .upload(
                vec![
                    part("sunset_nature_hike.png", "image/png", 2048),
                    part("formal_portrait.jpg", "image/jpeg", 1024),
                ],
                Some("user-1"),
            )
            .await
            .unwrap();

        assert!(outcome.rejected.is_empty());
        let names: Vec<_> = outcome.images.iter().map(|i| i.original_name.as_str()).collect();
        assert_eq!(names, ["sunset_nature_hike.png", "formal_portrait.jpg"]);
        assert_eq!(outcome.images[0].category, Category::Nature);
        assert_eq!(outcome.images[0].size, 2048);
        assert_eq!(outcome.images[1].category, Category::Portrait);
        assert_eq!(outcome.images[1].mime_type, "image/jpeg");
        assert_eq!(outcome.images[1].user_id.as_deref(), Some("user-1"));

        let stored = repository.get_images().await.unwrap();
        assert_eq!(stored.len(), 2);
        for image in &outcome.images {
            assert!(dir.path().join(&image.filename).exists());
        }
    }

    #[tokio::test]
    async fn test_invalid_files_are_rejected_individually() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, repository) = handler(dir.path());

        let outcome = handler
            .upload(
                vec![
                    part("notes.txt", "text/plain", 10),
                    part("tree.png", "image/png", 10),
                ],
                None,
            )
            .await
            .unwrap();

        assert_eq!(outcome.images.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].original_name, "notes.txt");
        assert_eq!(repository.get_images().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_all_invalid_produces_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, repository) = handler(dir.path());

        let err = handler
            .upload(vec![part("notes.txt", "text/plain", 10)], None)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::InvalidFileType { .. }));
        assert!(repository.get_images().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_remaining_files() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(MemoryRepository::new());
        let blobs = Arc::new(FlakyBlobStore::new(dir.path()).failing_put_at(2));
        let handler = UploadHandler::new(repository.clone(), blobs.clone());

        let err = handler
            .upload(
                vec![
                    part("a.png", "image/png", 1),
                    part("b.png", "image/png", 1),
                    part("c.png", "image/png", 1),
                ],
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Storage(_)));
        assert_eq!(blobs.put_calls(), 2);
        let stored = repository.get_images().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].original_name, "a.png");
    }

    #[tokio::test]
    async fn test_file_count_limits() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, _) = handler(dir.path());

        let err = handler.upload(Vec::new(), None).await.unwrap_err();
        assert!(matches!(err, UploadError::NoFiles));

        let parts = (0..=MAX_FILES_PER_REQUEST)
            .map(|i| part(&format!("{i}.png"), "image/png", 1))
            .collect();
        let err = handler.upload(parts, None).await.unwrap_err();
        assert!(matches!(err, UploadError::TooManyFiles(10)));
    }

    #[tokio::test]
    async fn test_concurrent_uploads_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, repository) = handler(dir.path());

        let (a, b) = tokio::join!(
            handler.upload(vec![part("same.png", "image/png", 3)], Some("user-1")),
            handler.upload(vec![part("same.png", "image/png", 5)], Some("user-1")),
        );
        let (a, b) = (a.unwrap().images.remove(0), b.unwrap().images.remove(0));

        assert_ne!(a.id, b.id);
        assert_ne!(a.filename, b.filename);
        assert_eq!(repository.get_images().await.unwrap().len(), 2);
        assert_eq!(std::fs::read(dir.path().join(&a.filename)).unwrap().len(), 3);
        assert_eq!(std::fs::read(dir.path().join(&b.filename)).unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_upload_avatar_updates_profile() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, repository) = handler(dir.path());

        let err = handler
            .upload_avatar("ghost", part("me.png", "image/png", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UserNotFound));

        repository
            .create_user(NewUser {
                id: "user-1".to_string(),
                email: "user@example.com".to_string(),
                full_name: None,
                avatar_url: None,
            })
            .await
            .unwrap();

        let user = handler
            .upload_avatar("user-1", part("me.png", "image/png", 10))
            .await
            .unwrap();
        let avatar = user.avatar_url.unwrap();
        assert!(avatar.ends_with(".png"));
        assert!(dir.path().join(&avatar).exists());
    }

    #[tokio::test]
    async fn test_replacing_avatar_removes_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, repository) = handler(dir.path());
        repository
            .create_user(NewUser {
                id: "user-1".to_string(),
                email: "user@example.com".to_string(),
                full_name: None,
                avatar_url: Some("https://provider.example.com/me.png".to_string()),
            })
            .await
            .unwrap();

        let first = handler
            .upload_avatar("user-1", part("me.png", "image/png", 10))
            .await
            .unwrap()
            .avatar_url
            .unwrap();
        let second = handler
            .upload_avatar("user-1", part("me2.png", "image/png", 10))
            .await
            .unwrap()
            .avatar_url
            .unwrap();

        assert!(!dir.path().join(&first).exists());
        assert!(dir.path().join(&second).exists());
    }

    #[tokio::test]
    async fn test_avatar_replacement_survives_failed_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(MemoryRepository::new());
        let blobs = Arc::new(FlakyBlobStore::new(dir.path()).failing_delete());
        let handler = UploadHandler::new(repository.clone(), blobs);
        repository
            .create_user(NewUser {
                id: "user-1".to_string(),
                email: "user@example.com".to_string(),
                full_name: None,
                avatar_url: Some("1700000000000-1.png".to_string()),
            })
            .await
            .unwrap();

        let user = handler
            .upload_avatar("user-1", part("me.png", "image/png", 10))
            .await
            .unwrap();
        assert_ne!(user.avatar_url.as_deref(), Some("1700000000000-1.png"));
    }
}
