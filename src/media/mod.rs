//! Image host adapter
//!
//! Uploads are propagated failures; deletions are best-effort and never
//! block the surrounding workflow.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::aggregates::{CommittedImage, PendingImage};
use crate::{CatalogError, Result};

pub mod cloudinary;
pub mod memory;

pub use cloudinary::{CloudinaryConfig, CloudinaryImageStore};
pub use memory::InMemoryImageStore;

/// Folder product images are uploaded into.
pub const PRODUCT_IMAGES_FOLDER: &str = "product-images";

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image host rejected the request: {0}")]
    Rejected(String),

    #[error("Image host not configured for {0}")]
    Unconfigured(&'static str),
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: &PendingImage, folder: &str) -> std::result::Result<CommittedImage, MediaError>;
    async fn delete(&self, id: &str) -> std::result::Result<(), MediaError>;
}

/// Deletes an image, logging and swallowing any failure.
pub async fn delete_best_effort(store: &dyn ImageStore, image: &CommittedImage) {
    match store.delete(&image.id).await {
        Ok(()) => debug!(image_id = %image.id, name = %image.name, "Deleted image"),
        Err(e) => warn!(image_id = %image.id, name = %image.name, error = %e, "Failed to delete image, leaving it on the host"),
    }
}

/// Uploads pending images one at a time and appends them to `current`.
///
/// Files whose content type is not an image, or whose name is already in
/// `current`, are skipped. A failed upload stops the loop; images uploaded
/// before it stay on the host.
pub async fn upload_pending(
    store: &dyn ImageStore,
    folder: &str,
    current: Vec<CommittedImage>,
    pending: Vec<PendingImage>,
) -> Result<Vec<CommittedImage>> {
    let mut images = current;
    for file in pending {
        if !file.is_image() {
            debug!(name = %file.name, content_type = %file.content_type, "Skipping non-image upload");
            continue;
        }
        if images.iter().any(|image| image.name == file.name) {
            debug!(name = %file.name, "Image already uploaded");
            continue;
        }
        let uploaded = store
            .upload(&file, folder)
            .await
            .map_err(|e| CatalogError::Upload(format!("{}: {e}", file.name)))?;
        images.push(uploaded);
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str) -> PendingImage { PendingImage::new(name, "image/png", vec![1u8, 2, 3]) }

    #[tokio::test]
    async fn uploads_sequentially_and_skips_known_names() {
        let store = InMemoryImageStore::new();
        let existing = CommittedImage { id: "old".into(), name: "a.png".into(), url: "https://img/a.png".into() };

        let images = upload_pending(
            &store,
            PRODUCT_IMAGES_FOLDER,
            vec![existing.clone()],
            vec![png("a.png"), png("b.png"), PendingImage::new("notes.txt", "text/plain", vec![0u8]), png("c.png")],
        )
        .await
        .unwrap();

        let names: Vec<_> = images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
        assert_eq!(images[0], existing);
        assert_eq!(store.uploaded_names().await, vec!["b.png".to_string(), "c.png".to_string()]);
    }

    #[tokio::test]
    async fn failed_upload_keeps_earlier_uploads() {
        let store = InMemoryImageStore::new().failing_uploads_for("b.png");

        let err = upload_pending(&store, PRODUCT_IMAGES_FOLDER, vec![], vec![png("a.png"), png("b.png"), png("c.png")])
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Upload(_)));
        assert_eq!(store.uploaded_names().await, vec!["a.png".to_string()]);
    }

    #[tokio::test]
    async fn best_effort_delete_swallows_failures() {
        let store = InMemoryImageStore::new().with_failing_deletes();
        let image = CommittedImage { id: "x".into(), name: "x.png".into(), url: "u".into() };
        delete_best_effort(&store, &image).await;
        assert!(store.deleted_ids().await.is_empty());
    }
}
