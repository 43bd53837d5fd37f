//! REST bindings for the gallery API

use common::{Image, NewUser, UpdateUser, User};
use reqwest::{
    Client, RequestBuilder, Response, Url,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::models::{
    BatchDeleteReport, ClientConfig, DeleteOutcome, DeleteOutcomes, ErrorBody, UploadFile,
    UploadReport,
};

const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct GalleryClient {
    client: Client,
    base_url: Url,
}

impl GalleryClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> ClientResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Where the browser fetches an image binary from
    pub fn image_url(&self, image: &Image) -> String {
        image.source_url(self.base_url.as_str())
    }

    /// Where the browser fetches a user's avatar from, if one is set
    pub fn avatar_url(&self, user: &User) -> Option<String> {
        user.avatar_source(self.base_url.as_str())
    }

    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };

        Err(ClientError::Api { status, message })
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        Ok(self.send(request).await?.json::<T>().await?)
    }

    /// `None` when the server answers 404
    async fn find_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ClientResult<Option<T>> {
        match self.get_json(request).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn config(&self) -> ClientResult<ClientConfig> {
        self.get_json(self.client.get(self.endpoint(&["api", "config"])?))
            .await
    }

    /// All images, newest first
    pub async fn list_images(&self) -> ClientResult<Vec<Image>> {
        self.get_json(self.client.get(self.endpoint(&["api", "images"])?))
            .await
    }

    pub async fn get_image(&self, id: Uuid) -> ClientResult<Option<Image>> {
        let id = id.to_string();
        let url = self.endpoint(&["api", "images", id.as_str()])?;
        self.find_json(self.client.get(url)).await
    }

    /// Upload files, attributed to `user_id` when signed in
    pub async fn upload_images(
        &self,
        files: Vec<UploadFile>,
        user_id: Option<&str>,
    ) -> ClientResult<UploadReport> {
        let mut form = Form::new();
        for file in files {
            form = form.part("images", file_part(file)?);
        }

        let mut request = self
            .client
            .post(self.endpoint(&["api", "images", "upload"])?)
            .multipart(form);
        if let Some(user_id) = user_id {
            request = request.header(USER_ID_HEADER, user_id);
        }

        self.get_json(request).await
    }

    pub async fn delete_image(&self, id: Uuid) -> ClientResult<()> {
        let id = id.to_string();
        let url = self.endpoint(&["api", "images", id.as_str()])?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    /// Delete images one request at a time.
    ///
    /// Nothing is rolled back: a failure leaves earlier deletions in place and
    /// the remaining ids are still attempted.
    pub async fn delete_images(&self, ids: &[Uuid]) -> BatchDeleteReport {
        let mut report = BatchDeleteReport::default();
        for id in ids {
            match self.delete_image(*id).await {
                Ok(()) => {
                    debug!("Deleted image {}", id);
                    report.deleted.push(*id);
                }
                Err(e) => {
                    warn!("Failed to delete image {}: {}", id, e);
                    report.failed.push(*id);
                }
            }
        }
        report
    }

    /// Delete images in a single request, one outcome per id
    pub async fn delete_images_batch(&self, ids: &[Uuid]) -> ClientResult<Vec<DeleteOutcome>> {
        let request = self
            .client
            .delete(self.endpoint(&["api", "images"])?)
            .json(&json!({ "ids": ids }));

        let outcomes: DeleteOutcomes = self.get_json(request).await?;
        Ok(outcomes.results)
    }

    pub async fn create_user(&self, user: &NewUser) -> ClientResult<User> {
        let request = self
            .client
            .post(self.endpoint(&["api", "users"])?)
            .json(user);
        self.get_json(request).await
    }

    pub async fn get_user(&self, id: &str) -> ClientResult<Option<User>> {
        let url = self.endpoint(&["api", "users", id])?;
        self.find_json(self.client.get(url)).await
    }

    pub async fn update_user(&self, id: &str, changes: &UpdateUser) -> ClientResult<User> {
        let url = self.endpoint(&["api", "users", id])?;
        self.get_json(self.client.put(url).json(changes)).await
    }

    pub async fn upload_avatar(&self, user_id: &str, file: UploadFile) -> ClientResult<User> {
        let form = Form::new().part("avatar", file_part(file)?);
        let url = self.endpoint(&["api", "users", user_id, "avatar"])?;
        self.get_json(self.client.post(url).multipart(form)).await
    }
}

fn file_part(file: UploadFile) -> ClientResult<Part> {
    Ok(Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(&file.mime_type)?)
}
