//! Publish state machine: submit a photo post, then poll until it settles.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

use super::{
    PlatformApi, PlatformError, PostOptions, PrivacyLevel, PublishRequest, PublishStatus,
    StatusReport,
};
use crate::clock::{Clock, elapsed_since};
use crate::credentials::TokenManager;

/// Shortest gap allowed between two status polls.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum PublishError {
    /// No token could be obtained; nothing was sent to the platform.
    #[error("no platform access token is available")]
    NoAccessToken,
    #[error("publish init rejected: {0}")]
    Rejected(#[from] PlatformError),
}

/// Result of waiting for a publish to reach a terminal status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub success: bool,
    pub status: PublishStatus,
    pub fail_reason: Option<String>,
}

impl PublishOutcome {
    fn complete() -> Self {
        Self {
            success: true,
            status: PublishStatus::PublishComplete,
            fail_reason: None,
        }
    }

    fn settled(report: StatusReport) -> Self {
        if report.status == PublishStatus::PublishComplete {
            return Self::complete();
        }
        Self {
            success: false,
            status: report.status,
            fail_reason: Some(report.fail_reason.unwrap_or_else(|| "Unknown".to_string())),
        }
    }

    fn timed_out(timeout: Duration) -> Self {
        Self {
            success: false,
            status: PublishStatus::Timeout,
            fail_reason: Some(format!(
                "publish did not finish within {}s",
                timeout.as_secs()
            )),
        }
    }
}

pub struct Publisher {
    api: Arc<dyn PlatformApi>,
    tokens: TokenManager,
    clock: Arc<dyn Clock>,
}

impl Publisher {
    pub fn new(api: Arc<dyn PlatformApi>, tokens: TokenManager, clock: Arc<dyn Clock>) -> Self {
        Self { api, tokens, clock }
    }

    /// Submit exactly one publish-init request. Never retried here.
    pub async fn init(
        &mut self,
        image_urls: &[String],
        caption: &str,
        privacy_level: PrivacyLevel,
        options: PostOptions,
    ) -> Result<String, PublishError> {
        let access_token = self
            .tokens
            .get_access_token()
            .await
            .ok_or(PublishError::NoAccessToken)?;

        let request = PublishRequest {
            image_urls: image_urls.to_vec(),
            caption: caption.to_string(),
            privacy_level,
            options,
        };

        info!(
            "initialising photo post with {} image(s), privacy {}",
            image_urls.len(),
            privacy_level.as_str()
        );
        let publish_id = self.api.init_publish(&access_token, &request).await?;
        info!("publish accepted: publish_id={publish_id}");
        Ok(publish_id)
    }

    /// Single status check. Any failure reads as `Unknown`.
    pub async fn poll(&mut self, publish_id: &str) -> StatusReport {
        let Some(access_token) = self.tokens.get_access_token().await else {
            warn!("cannot check publish {publish_id}: no access token");
            return StatusReport::unknown();
        };

        match self.api.fetch_status(&access_token, publish_id).await {
            Ok(report) => {
                info!("publish {publish_id} status: {}", report.status);
                report
            }
            Err(e) => {
                warn!("status check for {publish_id} failed: {e}");
                StatusReport::unknown()
            }
        }
    }

    /// Poll every `interval` until the post completes or fails, or until more
    /// than `timeout` has elapsed.
    ///
    /// Each round sleeps before polling, giving the platform time to pull the
    /// images. Failed polls do not count against anything but the deadline.
    pub async fn await_terminal(
        &mut self,
        publish_id: &str,
        timeout: Duration,
        interval: Duration,
    ) -> PublishOutcome {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let start = self.clock.now();

        while elapsed_since(self.clock.as_ref(), start) <= timeout {
            self.clock.sleep(interval).await;

            let report = self.poll(publish_id).await;
            if report.status.is_terminal() {
                return PublishOutcome::settled(report);
            }
            debug!("publish {publish_id} still in progress ({})", report.status);
        }

        warn!("publish {publish_id} timed out after {}s", timeout.as_secs());
        PublishOutcome::timed_out(timeout)
    }
}
