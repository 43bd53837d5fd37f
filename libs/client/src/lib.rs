//! Gallery client: REST bindings plus the view state behind the gallery screen
//!
//! Everything here is local and ephemeral. The image list is refetched after
//! every mutation and filtering happens over the fetched list.

pub mod actions;
pub mod api;
pub mod error;
pub mod filter;
pub mod gallery;
pub mod models;
pub mod notification;

pub use api::GalleryClient;
pub use error::{ClientError, ClientResult};
pub use filter::{CategoryFilter, GalleryFilter};
pub use gallery::{Gallery, ViewMode};
pub use models::{BatchDeleteReport, ClientConfig, UploadFile, UploadReport};
pub use notification::{Notification, NotificationKind};
