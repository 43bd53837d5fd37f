//! API service routes

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::{TypedHeader, extract::WithRejection};
use common::{Image, UpdateUser, User};
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::UserId,
    models::{
        BatchDeleteRequest, BatchDeleteResponse, CreateUserRequest, MessageResponse,
        UploadResponse,
    },
    state::AppState,
    upload::{FilePart, MAX_FILES_PER_REQUEST, UploadError, UploadPolicy},
    validation::{validate_new_user, validate_update_user},
};

const MIB: usize = 1024 * 1024;
// Leave room for multipart framing on top of the per-file policies.
const GALLERY_UPLOAD_BODY_LIMIT: usize =
    MAX_FILES_PER_REQUEST * UploadPolicy::GALLERY.max_bytes + MIB;
const AVATAR_UPLOAD_BODY_LIMIT: usize = UploadPolicy::AVATAR.max_bytes + MIB;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let gallery_upload = Router::new()
        .route("/api/images/upload", post(upload_images))
        .route_layer(DefaultBodyLimit::max(GALLERY_UPLOAD_BODY_LIMIT));

    let avatar_upload = Router::new()
        .route("/api/users/:id/avatar", post(upload_avatar))
        .route_layer(DefaultBodyLimit::max(AVATAR_UPLOAD_BODY_LIMIT));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/api/config", get(client_config))
        .route("/api/users", post(create_user))
        .route("/api/users/:id", get(get_user).put(update_user))
        .route("/api/images", get(list_images).delete(delete_images))
        .route("/api/images/:id", get(get_image).delete(delete_image))
        .merge(gallery_upload)
        .merge(avatar_upload);

    if let Some(dir) = state.upload_dir.as_ref() {
        router = router.nest_service("/uploads", ServeDir::new(dir));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "gallery-api"
    }))
}

/// Identity provider connection info for the client
pub async fn client_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.client_config)
}

/// Create a user relayed from the identity provider
pub async fn create_user(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateUserRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let new_user = payload.into_new_user().map_err(ApiError::BadRequest)?;
    validate_new_user(&new_user).map_err(ApiError::BadRequest)?;

    let user = state.repository.create_user(new_user).await?;
    info!("Created user {}", user.id);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<Json<User>> {
    let user = state
        .repository
        .get_user(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user))
}

/// Merge profile changes into a user
pub async fn update_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
    WithRejection(Json(changes), _): WithRejection<Json<UpdateUser>, ApiError>,
) -> ApiResult<Json<User>> {
    validate_update_user(&changes).map_err(ApiError::BadRequest)?;

    let user = state
        .repository
        .update_user(&id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user))
}

/// Replace a user's avatar (multipart field `avatar`)
pub async fn upload_avatar(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<Json<User>> {
    let part = read_files(&mut multipart, "avatar", 1)
        .await?
        .pop()
        .ok_or(UploadError::NoFiles)?;

    let user = state.uploads.upload_avatar(&id, part).await?;
    Ok(Json(user))
}

/// All images, newest first
pub async fn list_images(State(state): State<AppState>) -> ApiResult<Json<Vec<Image>>> {
    Ok(Json(state.repository.get_images().await?))
}

/// Get an image by ID
pub async fn get_image(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<Json<Image>> {
    let image = state
        .repository
        .get_image(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    Ok(Json(image))
}

/// Upload up to ten images (multipart field `images`)
pub async fn upload_images(
    State(state): State<AppState>,
    user: Option<TypedHeader<UserId>>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<Json<UploadResponse>> {
    let parts = read_files(&mut multipart, "images", MAX_FILES_PER_REQUEST).await?;
    let owner = user.as_ref().map(|TypedHeader(id)| id.as_str());

    let outcome = state.uploads.upload(parts, owner).await?;

    Ok(Json(UploadResponse {
        images: outcome.images,
        rejected: outcome.rejected,
    }))
}

/// Delete an image record, then best-effort its binary
pub async fn delete_image(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> ApiResult<Json<MessageResponse>> {
    let image = state
        .repository
        .get_image(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Image not found"))?;

    if !state.repository.delete_image(id).await? {
        return Err(ApiError::not_found("Image not found"));
    }

    purge_binary(&state, &image).await;
    Ok(Json(MessageResponse::new("Image deleted successfully")))
}

/// Delete several images, reporting each one
pub async fn delete_images(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<BatchDeleteRequest>, ApiError>,
) -> ApiResult<Json<BatchDeleteResponse>> {
    let mut images = HashMap::new();
    for id in &payload.ids {
        if let Some(image) = state.repository.get_image(*id).await? {
            images.insert(*id, image);
        }
    }

    let results = state.repository.delete_images(&payload.ids).await?;

    for result in results.iter().filter(|r| r.deleted) {
        if let Some(image) = images.get(&result.id) {
            purge_binary(&state, image).await;
        }
    }

    Ok(Json(BatchDeleteResponse { results }))
}

/// Binary removal never blocks removal of the record
async fn purge_binary(state: &AppState, image: &Image) {
    if let Err(e) = state.blobs.delete(&image.filename).await {
        warn!(
            "Failed to delete binary {} of image {}: {:#}",
            image.filename, image.id, e
        );
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::bad_request(format!("Failed to parse multipart upload: {}", err.body_text()))
    }
}

/// Collect the file fields named `name`, at most `max_files` of them
async fn read_files(
    multipart: &mut Multipart,
    name: &str,
    max_files: usize,
) -> ApiResult<Vec<FilePart>> {
    let mut parts = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(name) {
            continue;
        }

        if parts.len() == max_files {
            return Err(UploadError::TooManyFiles(max_files).into());
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        parts.push(FilePart {
            original_name,
            content_type,
            bytes,
        });
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use std::path::Path as FsPath;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, header};
    use bytes::Bytes;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::ClientConfig;
    use crate::repositories::testing::FailingDeleteRepository;
    use crate::repositories::{DynRepository, GalleryRepository, MemoryRepository};
    use crate::storage::testing::FlakyBlobStore;
    use crate::storage::{DynBlobStore, LocalBlobStore};

    fn app_state(repository: DynRepository, blobs: DynBlobStore, dir: &FsPath) -> AppState {
        AppState::new(
            repository,
            blobs,
            ClientConfig::default(),
            Some(dir.to_path_buf()),
        )
    }

    async fn stored(state: &AppState, names: &[&str]) -> Vec<Image> {
        let parts = names
            .iter()
            .map(|name| FilePart {
                original_name: name.to_string(),
                content_type: "image/png".to_string(),
                bytes: Bytes::from_static(b"png"),
            })
            .collect();
        state.uploads.upload(parts, None).await.unwrap().images
    }

    async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> StatusCode {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = create_router(state.clone())
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn test_failed_record_delete_keeps_binary() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(FailingDeleteRepository::default());
        let state = app_state(
            repository.clone(),
            Arc::new(LocalBlobStore::new(dir.path())),
            dir.path(),
        );
        let images = stored(&state, &["a.png", "b.png"]).await;

        let uri = format!("/api/images/{}", images[0].id);
        let status = send(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let ids: Vec<Uuid> = images.iter().map(|i| i.id).collect();
        let status = send(
            &state,
            "DELETE",
            "/api/images",
            Some(serde_json::json!({ "ids": ids })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        for image in &images {
            assert!(repository.inner.get_image(image.id).await.unwrap().is_some());
            assert!(dir.path().join(&image.filename).exists());
        }
    }

    #[tokio::test]
    async fn test_failed_binary_delete_still_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(MemoryRepository::new());
        let state = app_state(
            repository.clone(),
            Arc::new(FlakyBlobStore::new(dir.path()).failing_delete()),
            dir.path(),
        );
        let images = stored(&state, &["a.png", "b.png", "c.png"]).await;

        let uri = format!("/api/images/{}", images[0].id);
        assert_eq!(send(&state, "DELETE", &uri, None).await, StatusCode::OK);
        assert!(repository.get_image(images[0].id).await.unwrap().is_none());

        let status = send(
            &state,
            "DELETE",
            "/api/images",
            Some(serde_json::json!({ "ids": [images[1].id, images[2].id] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(repository.get_images().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_delete_purges_only_deleted_records() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(MemoryRepository::new());
        let state = app_state(
            repository.clone(),
            Arc::new(LocalBlobStore::new(dir.path())),
            dir.path(),
        );
        let images = stored(&state, &["a.png"]).await;

        let status = send(
            &state,
            "DELETE",
            "/api/images",
            Some(serde_json::json!({ "ids": [images[0].id, images[0].id, Uuid::new_v4()] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!dir.path().join(&images[0].filename).exists());
        assert!(repository.get_images().await.unwrap().is_empty());
    }
}
