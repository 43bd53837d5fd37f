//! In-memory repository, lives as long as the process

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{Image, NewImage, NewUser, RepositoryError, RepositoryResult, UpdateUser, User};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::GalleryRepository;

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, User>,
    images: HashMap<Uuid, Image>,
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<&str>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id.as_str()) != except)
    }
}

/// Repository backed by process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GalleryRepository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let mut state = self.state.write().await;

        if state.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict(format!(
                "user {} already exists",
                user.id
            )));
        }
        if state.email_taken(&user.email, None) {
            return Err(RepositoryError::Conflict(format!(
                "email {} already exists",
                user.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id.clone(), user.clone());

        Ok(user)
    }

    async fn get_user(&self, id: &str) -> RepositoryResult<Option<User>> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn update_user(&self, id: &str, changes: UpdateUser) -> RepositoryResult<Option<User>> {
        let mut state = self.state.write().await;

        if let Some(email) = changes.email.as_deref() {
            if state.users.contains_key(id) && state.email_taken(email, Some(id)) {
                return Err(RepositoryError::Conflict(format!(
                    "email {email} already exists"
                )));
            }
        }

        let Some(user) = state.users.get_mut(id) else {
            return Ok(None);
        };

        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = Some(full_name);
        }
        if let Some(avatar_url) = changes.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn get_images(&self) -> RepositoryResult<Vec<Image>> {
        let mut images: Vec<Image> = self.state.read().await.images.values().cloned().collect();
        images.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(images)
    }

    async fn get_image(&self, id: Uuid) -> RepositoryResult<Option<Image>> {
        Ok(self.state.read().await.images.get(&id).cloned())
    }

    async fn create_image(&self, image: NewImage) -> RepositoryResult<Image> {
        let image = Image {
            id: Uuid::new_v4(),
            filename: image.filename,
            original_name: image.original_name,
            mime_type: image.mime_type,
            size: image.size,
            category: image.category.unwrap_or_default(),
            uploaded_at: Utc::now(),
            user_id: image.user_id,
        };

        self.state
            .write()
            .await
            .images
            .insert(image.id, image.clone());

        Ok(image)
    }

    async fn delete_image(&self, id: Uuid) -> RepositoryResult<bool> {
        Ok(self.state.write().await.images.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::contract;

    #[tokio::test]
    async fn test_image_contract() {
        contract::exercise_images(&MemoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_user_contract() {
        contract::exercise_users(&MemoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_email_change_to_taken_address_conflicts() {
        let repo = MemoryRepository::new();
        for (id, email) in [("a", "a@example.com"), ("b", "b@example.com")] {
            repo.create_user(NewUser {
                id: id.to_string(),
                email: email.to_string(),
                full_name: None,
                avatar_url: None,
            })
            .await
            .unwrap();
        }

        let result = repo
            .update_user(
                "b",
                UpdateUser {
                    email: Some("a@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        // keeping your own address is not a conflict
        let same = repo
            .update_user(
                "b",
                UpdateUser {
                    email: Some("b@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn test_images_newest_first() {
        let repo = MemoryRepository::new();
        let mut ids = Vec::new();
        for name in ["one", "two", "three"] {
            let image = repo
                .create_image(NewImage {
                    filename: format!("{name}.png"),
                    original_name: format!("{name}.png"),
                    mime_type: "image/png".to_string(),
                    size: 1,
                    category: None,
                    user_id: None,
                })
                .await
                .unwrap();
            ids.push(image.id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let listed: Vec<Uuid> = repo.get_images().await.unwrap().iter().map(|i| i.id).collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }
}
