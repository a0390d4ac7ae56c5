//! Platform content API: token grants, publish init and status fetch.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::credential::TokenGrant;

pub mod client;
pub mod publish;

#[cfg(test)]
pub mod mock;

pub use client::TikTokClient;
pub use publish::{PublishError, PublishOutcome, Publisher};

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Failures talking to the platform API.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("platform returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("platform rejected the request ({code}): {message}")]
    Api { code: String, message: String },
    #[error("malformed platform response: {0}")]
    Malformed(String),
}

/// Audience a post is published to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrivacyLevel {
    PublicToEveryone,
    MutualFollowFriends,
    FollowerOfCreator,
    /// New apps are restricted to private posts until audited.
    #[default]
    SelfOnly,
}

impl PrivacyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyLevel::PublicToEveryone => "PUBLIC_TO_EVERYONE",
            PrivacyLevel::MutualFollowFriends => "MUTUAL_FOLLOW_FRIENDS",
            PrivacyLevel::FollowerOfCreator => "FOLLOWER_OF_CREATOR",
            PrivacyLevel::SelfOnly => "SELF_ONLY",
        }
    }
}

impl std::str::FromStr for PrivacyLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PUBLIC_TO_EVERYONE" => Ok(PrivacyLevel::PublicToEveryone),
            "MUTUAL_FOLLOW_FRIENDS" => Ok(PrivacyLevel::MutualFollowFriends),
            "FOLLOWER_OF_CREATOR" => Ok(PrivacyLevel::FollowerOfCreator),
            "SELF_ONLY" => Ok(PrivacyLevel::SelfOnly),
            other => Err(format!("unknown privacy level `{other}`")),
        }
    }
}

/// Per-post flags sent alongside the caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostOptions {
    pub disable_comment: bool,
    pub auto_add_music: bool,
}

impl Default for PostOptions {
    fn default() -> Self {
        Self {
            disable_comment: false,
            auto_add_music: true,
        }
    }
}

/// Everything the publish-init call needs besides the access token.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub image_urls: Vec<String>,
    pub caption: String,
    pub privacy_level: PrivacyLevel,
    pub options: PostOptions,
}

/// Publish pipeline states reported by the status endpoint, plus the
/// caller-side `Timeout` and `Unknown` readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    ProcessingUpload,
    ProcessingDownload,
    /// Waiting for the account owner to finish the post from their inbox.
    SendToUserInbox,
    PublishComplete,
    Failed,
    /// Never reported by the platform; produced when the wait deadline passes.
    Timeout,
    /// The status could not be fetched or was not recognised.
    Unknown,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::ProcessingUpload => "PROCESSING_UPLOAD",
            PublishStatus::ProcessingDownload => "PROCESSING_DOWNLOAD",
            PublishStatus::SendToUserInbox => "SEND_TO_USER_INBOX",
            PublishStatus::PublishComplete => "PUBLISH_COMPLETE",
            PublishStatus::Failed => "FAILED",
            PublishStatus::Timeout => "TIMEOUT",
            PublishStatus::Unknown => "UNKNOWN",
        }
    }

    /// Whether the waiting loop stops on this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PublishStatus::PublishComplete | PublishStatus::Failed | PublishStatus::Timeout
        )
    }
}

impl From<&str> for PublishStatus {
    fn from(value: &str) -> Self {
        match value {
            "PROCESSING_UPLOAD" => PublishStatus::ProcessingUpload,
            "PROCESSING_DOWNLOAD" => PublishStatus::ProcessingDownload,
            "SEND_TO_USER_INBOX" => PublishStatus::SendToUserInbox,
            "PUBLISH_COMPLETE" => PublishStatus::PublishComplete,
            "FAILED" => PublishStatus::Failed,
            "TIMEOUT" => PublishStatus::Timeout,
            _ => PublishStatus::Unknown,
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reading of the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: PublishStatus,
    pub fail_reason: Option<String>,
}

impl StatusReport {
    pub fn new(status: PublishStatus) -> Self {
        Self {
            status,
            fail_reason: None,
        }
    }

    pub fn unknown() -> Self {
        Self::new(PublishStatus::Unknown)
    }

    pub fn with_fail_reason(mut self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        self.fail_reason = (!reason.is_empty()).then_some(reason);
        self
    }
}

/// Operations consumed from the platform's content API.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Exchange a refresh token for a new token pair.
    async fn refresh_token(&self, refresh_token: &str) -> PlatformResult<TokenGrant>;
    /// Exchange an authorization code obtained out of band for a token pair.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> PlatformResult<TokenGrant>;
    /// Submit a photo post; returns the platform-assigned publish id.
    async fn init_publish(
        &self,
        access_token: &str,
        request: &PublishRequest,
    ) -> PlatformResult<String>;
    /// Fetch the current status of a publish.
    async fn fetch_status(&self, access_token: &str, publish_id: &str)
    -> PlatformResult<StatusReport>;
}
