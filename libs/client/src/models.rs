use common::Image;
use serde::Deserialize;
use uuid::Uuid;

/// Identity provider connection info served by `/api/config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
}

/// A file picked for upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedUpload {
    pub original_name: String,
    pub reason: String,
}

/// Body of a successful upload
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReport {
    pub images: Vec<Image>,
    #[serde(default)]
    pub rejected: Vec<RejectedUpload>,
}

/// Outcome of a client-driven batch delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDeleteReport {
    pub deleted: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

impl BatchDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One entry of a server-side batch delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeleteOutcome {
    pub id: Uuid,
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteOutcomes {
    pub results: Vec<DeleteOutcome>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
