//! Image host client for product media uploads.
//!
//! Pushes uploaded files to the configured image host (a Cloudinary-style
//! HTTP upload endpoint) and returns the public CDN URL that gets stored on
//! the product. Only catalog management calls this.

use std::time::Duration;

use reqwest::multipart;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::MediaConfig;

/// Per-request timeout for uploads. Generous because product photography
/// can run to several megabytes.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors that can occur when interacting with the image host.
#[derive(Debug, Error)]
pub enum MediaError {
    /// No image host is configured.
    #[error("Image host is not configured")]
    Unconfigured,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Host returned an error response.
    #[error("Upload rejected: {status} - {message}")]
    Upstream { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

/// Image host client.
#[derive(Clone)]
pub struct MediaClient {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
}

impl MediaClient {
    /// Create a new image host client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            api_key: config.api_key.expose_secret().to_owned(),
        })
    }

    /// Upload one file and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Upstream` if the host rejects the upload, or a
    /// transport/parse error otherwise.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, MediaError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str(content_type)
            .map_err(|e| MediaError::Parse(format!("Invalid content type: {e}")))?;

        let form = multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Parse(e.to_string()))?;

        parsed
            .secure_url
            .or(parsed.url)
            .ok_or_else(|| MediaError::Parse("Response carried no URL".to_owned()))
    }
}
