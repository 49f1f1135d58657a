//! Cloudinary image host.
//!
//! Uploads use an unsigned upload preset. Deletion needs the signed `destroy`
//! endpoint, so it only works when an API key and secret are configured.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{ImageStore, MediaError};
use crate::domain::aggregates::{CommittedImage, PendingImage};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

#[derive(Clone)]
pub struct CloudinaryImageStore {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct UploadResponse { public_id: String, secure_url: String }

#[derive(Deserialize)]
struct DestroyResponse { result: String }

impl CloudinaryImageStore {
    pub fn new(config: CloudinaryConfig) -> Self { Self { config, client: reqwest::Client::new() } }

    fn endpoint(&self, action: &str) -> String { format!("{API_BASE}/{}/image/{action}", self.config.cloud_name) }
}

/// Request signature: sorted `key=value` pairs joined by `&`, followed by the
/// API secret, hashed with SHA-256.
fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    async fn upload(&self, image: &PendingImage, folder: &str) -> Result<CommittedImage, MediaError> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.name.clone())
            .mime_str(&image.content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.config.upload_preset.clone())
            .text("folder", folder.to_string());

        let response = self.client.post(self.endpoint("upload")).multipart(form).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected(format!("{status}: {body}")));
        }
        let uploaded: UploadResponse = response.json().await?;
        tracing::info!(public_id = %uploaded.public_id, name = %image.name, "Uploaded image");
        Ok(CommittedImage { id: uploaded.public_id, name: image.name.clone(), url: uploaded.secure_url })
    }

    async fn delete(&self, id: &str) -> Result<(), MediaError> {
        let (Some(api_key), Some(api_secret)) = (&self.config.api_key, &self.config.api_secret) else {
            return Err(MediaError::Unconfigured("image deletion"));
        };
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(&[("public_id", id), ("timestamp", timestamp.as_str())], api_secret);
        let form = [
            ("public_id", id),
            ("timestamp", timestamp.as_str()),
            ("api_key", api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self.client.post(self.endpoint("destroy")).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(MediaError::Rejected(format!("destroy {id}: {}", response.status())));
        }
        let destroyed: DestroyResponse = response.json().await?;
        match destroyed.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Rejected(format!("destroy {id}: {other}"))),
        }
    }
}
