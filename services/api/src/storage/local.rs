use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::BlobStore;

/// Stores blobs as flat files in one directory, served under `/uploads`
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    directory: PathBuf,
}

impl LocalBlobStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn resolve(&self, reference: &str) -> anyhow::Result<PathBuf> {
        let is_plain = !reference.is_empty()
            && reference != "."
            && reference != ".."
            && !reference.contains(['/', '\\']);

        if is_plain {
            Ok(self.directory.join(reference))
        } else {
            Err(anyhow!("refusing to resolve storage reference {:?}", reference))
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        _owner: Option<&str>,
        filename: &str,
        _content_type: &str,
        data: Bytes,
    ) -> anyhow::Result<String> {
        let path = self.resolve(filename)?;

        debug!("Storing image @ {:?}", &path);
        match tokio::fs::write(&path, &data).await {
            Ok(()) => {}
            Err(ref e) if e.kind() == ErrorKind::NotFound => {
                tokio::fs::create_dir_all(&self.directory).await?;
                tokio::fs::write(&path, &data).await?;
            }
            Err(other) => return Err(other.into()),
        }

        Ok(filename.to_string())
    }

    async fn delete(&self, reference: &str) -> anyhow::Result<()> {
        let path = self.resolve(reference)?;

        debug!("Purging image @ {:?}", &path);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(other) => Err(other.into()),
        }
    }

    fn owns(&self, reference: &str) -> bool {
        self.resolve(reference).is_ok()
    }
}
