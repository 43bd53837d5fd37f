//! Toast notifications summarizing one operation each

use tracing::warn;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }

    pub fn uploaded(count: usize) -> Self {
        Self::success("Upload complete", format!("{} {} uploaded", count, plural(count)))
    }

    /// Batch uploads fail as a whole from the user's point of view
    pub fn upload_failed(err: &ClientError) -> Self {
        warn!("Upload failed: {}", err);
        Self::error("Upload failed", "Some files could not be uploaded")
    }

    pub fn deleted(count: usize) -> Self {
        Self::success("Deleted", format!("{} {} deleted", count, plural(count)))
    }

    /// No per-item detail, whatever part of the batch failed
    pub fn delete_failed() -> Self {
        Self::error("Delete failed", "Some images could not be deleted")
    }

    pub fn load_failed(err: &ClientError) -> Self {
        warn!("Failed to load images: {}", err);
        Self::error("Could not load images", "Please try again")
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "image" } else { "images" }
}
