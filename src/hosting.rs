//! Re-host product images at a public URL the platform can pull from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info, warn};
use reqwest::header::{CONTENT_LENGTH, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;

use crate::clock::Clock;

pub const DEFAULT_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";

/// Largest source image accepted for upload.
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
const DOWNLOAD_ATTEMPTS: u32 = 3;
const DOWNLOAD_RETRY_DELAY: Duration = Duration::from_secs(2);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

#[derive(Debug, Error)]
pub enum HostingError {
    #[error("product has no source image")]
    MissingSource,
    #[error("downloading {url} failed after {attempts} attempt(s): {reason}")]
    Download {
        url: String,
        attempts: u32,
        reason: String,
    },
    #[error("image is {0} bytes, larger than the 10 MiB limit")]
    TooLarge(u64),
    #[error("image upload failed: {0}")]
    Upload(#[from] reqwest::Error),
    #[error("image host rejected the upload: {0}")]
    Rejected(String),
}

/// Turns a source image reference into a publicly fetchable URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn host(&self, source_url: &str) -> Result<String, HostingError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    data: Option<UploadData>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

/// Downloads the source image into memory and uploads it to imgBB.
pub struct ImgbbHost {
    client: reqwest::Client,
    api_key: String,
    upload_url: String,
    clock: Arc<dyn Clock>,
}

impl ImgbbHost {
    pub fn new(api_key: impl Into<String>, clock: Arc<dyn Clock>) -> Result<Self, HostingError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            clock,
        })
    }

    pub fn with_upload_url(mut self, upload_url: impl Into<String>) -> Self {
        self.upload_url = upload_url.into();
        self
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, HostingError> {
        let mut last_reason = String::new();

        for attempt in 1..=DOWNLOAD_ATTEMPTS {
            if attempt > 1 {
                self.clock.sleep(DOWNLOAD_RETRY_DELAY).await;
            }

            match self.fetch_once(url).await {
                Ok(bytes) => {
                    debug!("downloaded {} bytes from {url}", bytes.len());
                    return Ok(bytes);
                }
                Err(FetchError::Fatal(e)) => return Err(e),
                Err(FetchError::Retryable(reason)) => {
                    warn!("image download attempt {attempt}/{DOWNLOAD_ATTEMPTS} failed: {reason}");
                    last_reason = reason;
                }
            }
        }

        Err(HostingError::Download {
            url: url.to_string(),
            attempts: DOWNLOAD_ATTEMPTS,
            reason: last_reason,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| FetchError::Retryable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Retryable(format!("HTTP {status}")));
        }

        let declared = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        if let Some(size) = declared.filter(|size| *size > MAX_IMAGE_BYTES) {
            return Err(FetchError::Fatal(HostingError::TooLarge(size)));
        }

        // Content-Length may be absent; enforce the cap while streaming.
        let mut image = Vec::with_capacity(declared.unwrap_or(0) as usize);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Retryable(e.to_string()))?
        {
            append_capped(&mut image, &chunk, MAX_IMAGE_BYTES)
                .map_err(|size| FetchError::Fatal(HostingError::TooLarge(size)))?;
        }
        Ok(image)
    }

    async fn upload(&self, image: &[u8]) -> Result<String, HostingError> {
        let encoded = STANDARD.encode(image);
        let response = self
            .client
            .post(&self.upload_url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[("image", encoded.as_str())])
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|_| HostingError::Rejected(format!("HTTP {status}: {body}")))?;

        match parsed {
            UploadResponse {
                success: true,
                data: Some(data),
                ..
            } if status.is_success() => Ok(data.url),
            UploadResponse { error, .. } => Err(HostingError::Rejected(format!(
                "HTTP {status}: {}",
                error.map(|e| e.to_string()).unwrap_or(body)
            ))),
        }
    }
}

/// Append `chunk` unless that would take `buffer` past `limit` bytes, in which
/// case the would-be size is returned and `buffer` is left untouched.
fn append_capped(buffer: &mut Vec<u8>, chunk: &[u8], limit: u64) -> Result<(), u64> {
    let size = (buffer.len() + chunk.len()) as u64;
    if size > limit {
        return Err(size);
    }
    buffer.extend_from_slice(chunk);
    Ok(())
}

enum FetchError {
    Retryable(String),
    Fatal(HostingError),
}

#[async_trait]
impl ImageHost for ImgbbHost {
    async fn host(&self, source_url: &str) -> Result<String, HostingError> {
        if source_url.trim().is_empty() {
            return Err(HostingError::MissingSource);
        }

        let image = self.download(source_url).await?;
        let hosted = self.upload(&image).await?;
        info!("image hosted at {hosted}");
        Ok(hosted)
    }
}
