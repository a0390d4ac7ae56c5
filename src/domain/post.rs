use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Outcome recorded for a publish attempt.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Attempt created but not yet resolved.
    #[default]
    Pending,
    /// The platform reported the post as published.
    Published,
    /// Init was rejected, the platform failed the post, or polling timed out.
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Pending => "pending",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        }
    }
}

impl From<&str> for PostStatus {
    fn from(value: &str) -> Self {
        match value {
            "published" => PostStatus::Published,
            "failed" => PostStatus::Failed,
            _ => PostStatus::Pending,
        }
    }
}

impl From<PostStatus> for &'static str {
    fn from(value: PostStatus) -> Self {
        value.as_str()
    }
}

/// Immutable log entry describing one orchestration run that reached publishing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PostLog {
    pub id: i32,
    /// Product the attempt was made for.
    pub item_id: String,
    /// Full caption submitted to the platform.
    pub post_text: String,
    /// Public image URL submitted to the platform.
    pub hosted_image_url: Option<String>,
    /// Platform-assigned identifier, absent when init never succeeded.
    pub publish_id: Option<String>,
    pub status: PostStatus,
    pub posted_at: NaiveDateTime,
}

/// Payload required to append a log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPostLog {
    pub item_id: String,
    pub post_text: String,
    pub hosted_image_url: Option<String>,
    pub publish_id: Option<String>,
    pub status: PostStatus,
    pub posted_at: NaiveDateTime,
}

impl NewPostLog {
    /// Build a log entry for `item_id` stamped with `posted_at`.
    pub fn new(
        item_id: impl Into<String>,
        post_text: impl Into<String>,
        status: PostStatus,
        posted_at: NaiveDateTime,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            post_text: post_text.into(),
            hosted_image_url: None,
            publish_id: None,
            status,
            posted_at,
        }
    }

    /// Attach the hosted image URL.
    pub fn with_hosted_image_url(mut self, url: impl Into<String>) -> Self {
        self.hosted_image_url = Some(url.into());
        self
    }

    /// Attach the platform publish identifier when one was assigned.
    pub fn with_publish_id(mut self, publish_id: Option<impl Into<String>>) -> Self {
        self.publish_id = publish_id.map(|value| value.into());
        self
    }
}
