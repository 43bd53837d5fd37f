//! Application state shared across handlers

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use common::database::{DatabaseConfig, health_check, init_pool, migrate};
use tracing::info;

use crate::{
    config::{BlobBackend, ClientConfig, MetadataBackend, Settings},
    repositories::{DynRepository, MemoryRepository, PostgresRepository},
    storage::{DynBlobStore, LocalBlobStore, ObjectBlobStore},
    upload::UploadHandler,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repository: DynRepository,
    pub blobs: DynBlobStore,
    pub uploads: UploadHandler,
    pub client_config: ClientConfig,
    /// Directory served under `/uploads` when binaries are kept on local disk
    pub upload_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(
        repository: DynRepository,
        blobs: DynBlobStore,
        client_config: ClientConfig,
        upload_dir: Option<PathBuf>,
    ) -> Self {
        let uploads = UploadHandler::new(repository.clone(), blobs.clone());
        Self {
            repository,
            blobs,
            uploads,
            client_config,
            upload_dir,
        }
    }

    /// In-memory metadata with binaries in `upload_dir`
    pub fn in_memory(upload_dir: impl Into<PathBuf>) -> Self {
        let upload_dir = upload_dir.into();
        Self::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(LocalBlobStore::new(upload_dir.clone())),
            ClientConfig::default(),
            Some(upload_dir),
        )
    }

    /// Build the state for the backends selected by the settings
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let repository: DynRepository = match settings.metadata_backend() {
            MetadataBackend::Memory => {
                info!("Using in-memory metadata store");
                Arc::new(MemoryRepository::new())
            }
            MetadataBackend::Postgres { database_url } => {
                let pool = init_pool(&DatabaseConfig::new(database_url)).await?;

                if health_check(&pool).await? {
                    info!("Database connection successful");
                } else {
                    anyhow::bail!("Failed to connect to database");
                }

                migrate(&pool).await?;
                info!("Using PostgreSQL metadata store");
                Arc::new(PostgresRepository::new(pool))
            }
        };

        let (blobs, upload_dir): (DynBlobStore, Option<PathBuf>) = match settings.blob_backend() {
            BlobBackend::Local { directory } => {
                tokio::fs::create_dir_all(&directory).await?;
                info!("Storing uploads on local disk in {:?}", directory);
                (Arc::new(LocalBlobStore::new(directory.clone())), Some(directory))
            }
            BlobBackend::ObjectStorage(cfg) => {
                info!("Storing uploads in object storage bucket {}", cfg.bucket);
                (Arc::new(ObjectBlobStore::connect(cfg).await), None)
            }
        };

        Ok(Self::new(
            repository,
            blobs,
            settings.client_config(),
            upload_dir,
        ))
    }
}
