//! In-process image host for development and tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ImageStore, MediaError};
use crate::domain::aggregates::{CommittedImage, PendingImage};

#[derive(Debug, Default)]
pub struct InMemoryImageStore {
    hosted: Mutex<BTreeMap<String, CommittedImage>>,
    uploads: Mutex<Vec<String>>,
    deletions: Mutex<Vec<String>>,
    fail_upload_of: Option<String>,
    fail_deletes: bool,
}

impl InMemoryImageStore {
    pub fn new() -> Self { Self::default() }

    /// Rejects uploads of the named file.
    pub fn failing_uploads_for(mut self, name: impl Into<String>) -> Self {
        self.fail_upload_of = Some(name.into());
        self
    }

    /// Rejects every deletion.
    pub fn with_failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    /// Registers an image as already hosted.
    pub async fn host(&self, image: CommittedImage) { self.hosted.lock().await.insert(image.id.clone(), image); }

    pub async fn is_hosted(&self, id: &str) -> bool { self.hosted.lock().await.contains_key(id) }

    /// Names of successfully uploaded files, in upload order.
    pub async fn uploaded_names(&self) -> Vec<String> { self.uploads.lock().await.clone() }

    /// Ids of successfully deleted images, in deletion order.
    pub async fn deleted_ids(&self) -> Vec<String> { self.deletions.lock().await.clone() }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn upload(&self, image: &PendingImage, folder: &str) -> Result<CommittedImage, MediaError> {
        if self.fail_upload_of.as_deref() == Some(image.name.as_str()) {
            return Err(MediaError::Rejected(format!("upload of {} refused", image.name)));
        }
        let id = format!("{folder}/{}", Uuid::new_v4().simple());
        let committed = CommittedImage {
            url: format!("memory://{id}/{}", image.name),
            id: id.clone(),
            name: image.name.clone(),
        };
        self.hosted.lock().await.insert(id, committed.clone());
        self.uploads.lock().await.push(image.name.clone());
        Ok(committed)
    }

    async fn delete(&self, id: &str) -> Result<(), MediaError> {
        if self.fail_deletes {
            return Err(MediaError::Rejected(format!("delete of {id} refused")));
        }
        self.hosted.lock().await.remove(id);
        self.deletions.lock().await.push(id.to_string());
        Ok(())
    }
}
