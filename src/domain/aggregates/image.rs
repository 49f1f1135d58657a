//! Product images
//!
//! A [`PendingImage`] only exists between the editor and the image host. Stored
//! records can only hold a [`CommittedImage`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Image accepted from the editor but not yet uploaded.
#[derive(Clone, Debug)]
pub struct PendingImage {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl PendingImage {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self { name: name.into(), content_type: content_type.into(), bytes: bytes.into() }
    }

    pub fn is_image(&self) -> bool { self.content_type.starts_with("image/") }
}

/// Image held by the host. `name` is the original filename and the
/// de-duplication key within one product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedImage {
    pub id: String,
    pub name: String,
    #[serde(alias = "src")]
    pub url: String,
}

/// Editor-side reference from a variant to one of the product images.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef { pub name: String }

impl From<&CommittedImage> for ImageRef {
    fn from(image: &CommittedImage) -> Self { Self { name: image.name.clone() } }
}
