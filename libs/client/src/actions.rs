//! Workflows pairing REST calls with the local view state.
//!
//! Every mutation is followed by a refetch so the gallery never shows a
//! stale list.

use uuid::Uuid;

use crate::api::GalleryClient;
use crate::gallery::Gallery;
use crate::models::UploadFile;
use crate::notification::Notification;

/// Refetch the image list
pub async fn refresh(client: &GalleryClient, gallery: &mut Gallery) -> Result<(), Notification> {
    match client.list_images().await {
        Ok(images) => {
            gallery.replace_images(images);
            Ok(())
        }
        Err(e) => Err(Notification::load_failed(&e)),
    }
}

pub async fn upload(
    client: &GalleryClient,
    gallery: &mut Gallery,
    files: Vec<UploadFile>,
    user_id: Option<&str>,
) -> Notification {
    let notification = match client.upload_images(files, user_id).await {
        Ok(report) if report.rejected.is_empty() => Notification::uploaded(report.images.len()),
        Ok(_) => Notification::error("Upload failed", "Some files could not be uploaded"),
        Err(e) => Notification::upload_failed(&e),
    };

    after_mutation(client, gallery, notification).await
}

pub async fn delete_one(client: &GalleryClient, gallery: &mut Gallery, id: Uuid) -> Notification {
    let notification = match client.delete_image(id).await {
        Ok(()) => Notification::deleted(1),
        Err(_) => Notification::delete_failed(),
    };

    after_mutation(client, gallery, notification).await
}

/// Delete the selection one image at a time, then leave selection mode
pub async fn delete_selected(client: &GalleryClient, gallery: &mut Gallery) -> Notification {
    let ids = gallery.selected_ids();
    if ids.is_empty() {
        return Notification::error("Nothing selected", "Select images to delete first");
    }

    let report = client.delete_images(&ids).await;
    let notification = if report.is_complete() {
        Notification::deleted(report.deleted.len())
    } else {
        Notification::delete_failed()
    };

    if gallery.selection_mode() {
        gallery.toggle_selection_mode();
    }

    after_mutation(client, gallery, notification).await
}

/// A failed refetch outranks the operation's own result
async fn after_mutation(
    client: &GalleryClient,
    gallery: &mut Gallery,
    notification: Notification,
) -> Notification {
    match refresh(client, gallery).await {
        Ok(()) => notification,
        Err(failed) => failed,
    }
}
