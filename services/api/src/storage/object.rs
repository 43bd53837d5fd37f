use anyhow::anyhow;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
    primitives::ByteStream,
};
use bytes::Bytes;
use tracing::{debug, info};

use super::BlobStore;

const ANONYMOUS_FOLDER: &str = "anonymous";

/// Connection details for an S3-compatible bucket with public read access
#[derive(Debug, Clone)]
pub struct ObjectStorageConfig {
    /// S3 API endpoint
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    /// Base URL under which objects of the bucket are publicly readable
    pub public_url: String,
}

impl ObjectStorageConfig {
    /// Objects are grouped in one folder per owner
    pub fn object_key(&self, owner: Option<&str>, filename: &str) -> String {
        let folder = owner
            .filter(|o| !o.is_empty())
            .map(|o| {
                o.chars()
                    .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                    .collect::<String>()
            })
            .unwrap_or_else(|| ANONYMOUS_FOLDER.to_string());

        format!("{}/{}", folder, filename)
    }

    pub fn public_reference(&self, key: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), key)
    }

    /// Inverse of [`Self::public_reference`]
    pub fn key_from_reference<'a>(&self, reference: &'a str) -> Option<&'a str> {
        reference
            .strip_prefix(self.public_url.trim_end_matches('/'))
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
    }
}

/// Stores blobs in a managed bucket, references are public URLs
#[derive(Clone)]
pub struct ObjectBlobStore {
    client: Client,
    config: ObjectStorageConfig,
}

impl ObjectBlobStore {
    pub async fn connect(config: ObjectStorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "gallery-api",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint.clone())
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        info!(
            "Object storage client initialized for bucket {} at {}",
            config.bucket, config.endpoint
        );

        Self {
            client: Client::from_conf(s3_config),
            config,
        }
    }
}

#[async_trait]
impl BlobStore for ObjectBlobStore {
    async fn put(
        &self,
        owner: Option<&str>,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> anyhow::Result<String> {
        let key = self.config.object_key(owner, filename);

        debug!("Storing image in bucket @ {}", &key);
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await?;

        Ok(self.config.public_reference(&key))
    }

    async fn delete(&self, reference: &str) -> anyhow::Result<()> {
        let key = self
            .config
            .key_from_reference(reference)
            .ok_or_else(|| anyhow!("{} is not an object of this bucket", reference))?;

        debug!("Purging file in bucket @ {}", key);
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await?;

        Ok(())
    }

    fn owns(&self, reference: &str) -> bool {
        self.config.key_from_reference(reference).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ObjectStorageConfig {
        ObjectStorageConfig {
            endpoint: "https://project.supabase.co/storage/v1/s3".to_string(),
            region: "us-east-1".to_string(),
            bucket: "gallery".to_string(),
            access_key: "key".to_string(),
            secret_key: "secret".to_string(),
            public_url: "https://project.supabase.co/storage/v1/object/public/gallery/".to_string(),
        }
    }

    #[test]
    fn test_object_key_uses_owner_folder() {
        let cfg = config();
        assert_eq!(cfg.object_key(Some("user-1"), "1-2.png"), "user-1/1-2.png");
        assert_eq!(cfg.object_key(None, "1-2.png"), "anonymous/1-2.png");
        assert_eq!(cfg.object_key(Some(""), "1-2.png"), "anonymous/1-2.png");
        assert_eq!(cfg.object_key(Some("../x"), "1-2.png"), "___x/1-2.png");
    }

    #[test]
    fn test_reference_round_trip() {
        let cfg = config();
        let reference = cfg.public_reference("user-1/1-2.png");
        assert_eq!(
            reference,
            "https://project.supabase.co/storage/v1/object/public/gallery/user-1/1-2.png"
        );
        assert_eq!(cfg.key_from_reference(&reference), Some("user-1/1-2.png"));
        assert_eq!(cfg.key_from_reference("https://elsewhere.com/a.png"), None);
        assert_eq!(cfg.key_from_reference("1-2.png"), None);
    }
}
