//! Service configuration, read from the process environment

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::storage::ObjectStorageConfig;

/// Flat settings, one field per recognised environment variable
///
/// `DATABASE_URL` maps to `database_url`, `OBJECT_STORAGE_BUCKET` to
/// `object_storage_bucket` and so on.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// PostgreSQL connection string; in-memory metadata when absent
    pub database_url: Option<String>,

    /// Local directory for uploaded binaries
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    pub object_storage_url: Option<String>,
    #[serde(default = "default_region")]
    pub object_storage_region: String,
    pub object_storage_bucket: Option<String>,
    pub object_storage_access_key: Option<String>,
    pub object_storage_secret_key: Option<String>,
    pub object_storage_public_url: Option<String>,

    /// Identity provider connection info handed to the client
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
}

/// Where image and user metadata lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataBackend {
    Memory,
    Postgres { database_url: String },
}

/// Where uploaded binaries live
#[derive(Debug, Clone)]
pub enum BlobBackend {
    Local { directory: PathBuf },
    ObjectStorage(ObjectStorageConfig),
}

/// Auth-provider connection info exposed at `/api/config`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3001
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Settings {
    /// Read settings from the environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_builder(config::Config::builder())
    }

    /// Layer the environment on top of an existing builder (defaults, overrides)
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize::<Settings>()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn metadata_backend(&self) -> MetadataBackend {
        match non_empty(&self.database_url) {
            Some(url) => MetadataBackend::Postgres {
                database_url: url.to_string(),
            },
            None => MetadataBackend::Memory,
        }
    }

    /// Object storage only when every connection detail is present
    pub fn blob_backend(&self) -> BlobBackend {
        match self.object_storage() {
            Some(cfg) => BlobBackend::ObjectStorage(cfg),
            None => BlobBackend::Local {
                directory: self.upload_dir.clone(),
            },
        }
    }

    fn object_storage(&self) -> Option<ObjectStorageConfig> {
        Some(ObjectStorageConfig {
            endpoint: non_empty(&self.object_storage_url)?.to_string(),
            region: self.object_storage_region.clone(),
            bucket: non_empty(&self.object_storage_bucket)?.to_string(),
            access_key: non_empty(&self.object_storage_access_key)?.to_string(),
            secret_key: non_empty(&self.object_storage_secret_key)?.to_string(),
            public_url: non_empty(&self.object_storage_public_url)?.to_string(),
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
