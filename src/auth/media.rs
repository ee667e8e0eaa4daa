// Media upload collaborator and its Cloudinary implementation

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, error};

use crate::auth::error::AuthError;
use crate::config::MediaConfig;

/// A file received from the client, held in memory
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Where the media host stored an upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    pub url: String,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("upload response carried no usable url")]
    MissingUrl,
}

impl From<UploadError> for AuthError {
    fn from(err: UploadError) -> Self {
        error!("Media upload failed: {}", err);
        AuthError::UploadFailure(err.to_string())
    }
}

/// Stores a file somewhere reachable and returns its url
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, file: MediaFile) -> Result<UploadedMedia, UploadError>;
}

#[derive(Debug, Deserialize)]
struct CloudinaryUploadResponse {
    secure_url: Option<String>,
}

/// Signed uploads against the Cloudinary upload API
pub struct CloudinaryUploader {
    client: reqwest::Client,
    config: MediaConfig,
}

impl CloudinaryUploader {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1_1/{}/auto/upload",
            self.config.base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// SHA-256 over the params sorted by key, joined as `k=v&k=v`, followed by the api secret
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    async fn upload(&self, file: MediaFile) -> Result<UploadedMedia, UploadError> {
        let mut params = vec![("timestamp", Utc::now().timestamp().to_string())];
        if let Some(folder) = &self.config.folder {
            params.push(("folder", folder.clone()));
        }
        let signature = self.sign(&params);

        let mut part = Part::bytes(file.bytes).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }

        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .part("file", part);
        for (key, value) in params {
            form = form.text(key, value);
        }

        debug!("Uploading {} to media host", file.file_name);
        let response = self.client.post(self.endpoint()).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let payload: CloudinaryUploadResponse = response.json().await?;
        match payload.secure_url {
            Some(url) if !url.trim().is_empty() => Ok(UploadedMedia { url }),
            _ => Err(UploadError::MissingUrl),
        }
    }
}
