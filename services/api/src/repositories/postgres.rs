//! PostgreSQL repository for gallery metadata

use async_trait::async_trait;
use common::{Category, Image, NewImage, NewUser, RepositoryResult, UpdateUser, User};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{DeleteResult, GalleryRepository};

const USER_COLUMNS: &str = "id, email, full_name, avatar_url, created_at, updated_at";
const IMAGE_COLUMNS: &str =
    "id, filename, original_name, mime_type, size, category, uploaded_at, user_id";

/// Repository backed by PostgreSQL
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Create a new repository over an initialised pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn image_from_row(row: &PgRow) -> Image {
    let category: String = row.get("category");
    let category = category.parse::<Category>().unwrap_or_else(|e| {
        warn!("{}, falling back to landscape", e);
        Category::default()
    });

    Image {
        id: row.get("id"),
        filename: row.get("filename"),
        original_name: row.get("original_name"),
        mime_type: row.get("mime_type"),
        size: row.get("size"),
        category,
        uploaded_at: row.get("uploaded_at"),
        user_id: row.get("user_id"),
    }
}

/// Pair requested ids with the rows actually removed. A repeated id only
/// counts as deleted the first time, as with sequential deletes.
fn match_deleted(ids: &[Uuid], mut deleted: Vec<Uuid>) -> Vec<DeleteResult> {
    ids.iter()
        .map(|id| {
            let found = deleted.iter().position(|d| d == id);
            if let Some(position) = found {
                deleted.swap_remove(position);
            }
            DeleteResult {
                id: *id,
                deleted: found.is_some(),
            }
        })
        .collect()
}

#[async_trait]
impl GalleryRepository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, email, full_name, avatar_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(&row))
    }

    async fn get_user(&self, id: &str) -> RepositoryResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn update_user(&self, id: &str, changes: UpdateUser) -> RepositoryResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                full_name = COALESCE($3, full_name),
                avatar_url = COALESCE($4, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.full_name)
        .bind(&changes.avatar_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn get_images(&self) -> RepositoryResult<Vec<Image>> {
        let rows = sqlx::query(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images ORDER BY uploaded_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(image_from_row).collect())
    }

    async fn get_image(&self, id: Uuid) -> RepositoryResult<Option<Image>> {
        let row = sqlx::query(&format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(image_from_row))
    }

    async fn create_image(&self, image: NewImage) -> RepositoryResult<Image> {
        let category = image.category.unwrap_or_default();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO images (id, filename, original_name, mime_type, size, category, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {IMAGE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&image.filename)
        .bind(&image.original_name)
        .bind(&image.mime_type)
        .bind(image.size)
        .bind(category.as_str())
        .bind(&image.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(image_from_row(&row))
    }

    async fn delete_image(&self, id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_images(&self, ids: &[Uuid]) -> RepositoryResult<Vec<DeleteResult>> {
        let deleted: Vec<Uuid> =
            sqlx::query_scalar("DELETE FROM images WHERE id = ANY($1) RETURNING id")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        debug!("Deleted {} of {} images", deleted.len(), ids.len());

        Ok(match_deleted(ids, deleted))
    }
}
