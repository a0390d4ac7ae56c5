//! HTTP client for the TikTok content posting API.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{
    PlatformApi, PlatformError, PlatformResult, PublishRequest, PublishStatus, StatusReport,
};
use crate::domain::credential::TokenGrant;

pub const DEFAULT_API_BASE_URL: &str = "https://open.tiktokapis.com";

const TOKEN_PATH: &str = "/v2/oauth/token/";
const CONTENT_INIT_PATH: &str = "/v2/post/publish/content/init/";
const STATUS_FETCH_PATH: &str = "/v2/post/publish/status/fetch/";

const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);
const INIT_TIMEOUT: Duration = Duration::from_secs(60);
const STATUS_TIMEOUT: Duration = Duration::from_secs(30);

/// `{"data": ..., "error": {"code": "ok", ...}}` wrapper used by the content API.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct InitData {
    publish_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    status: Option<String>,
    #[serde(default)]
    fail_reason: Option<String>,
}

/// The token endpoint answers either with a grant or with an OAuth error.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(flatten)]
    grant: Option<TokenGrant>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TikTokClient {
    client: reqwest::Client,
    base_url: String,
    client_key: String,
    client_secret: String,
}

impl TikTokClient {
    pub fn new(
        base_url: impl Into<String>,
        client_key: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> PlatformResult<Self> {
        let client = reqwest::Client::builder().timeout(INIT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_key: client_key.into(),
            client_secret: client_secret.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> PlatformResult<TokenGrant> {
        let response = self
            .client
            .post(self.url(TOKEN_PATH))
            .timeout(TOKEN_TIMEOUT)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PlatformError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| PlatformError::Malformed(e.to_string()))?;
        match parsed {
            TokenResponse {
                grant: Some(grant), ..
            } => Ok(grant),
            TokenResponse {
                error: Some(code),
                error_description,
                ..
            } => Err(PlatformError::Api {
                code,
                message: error_description.unwrap_or_default(),
            }),
            _ => Err(PlatformError::Malformed(
                "token response carries no access_token".into(),
            )),
        }
    }

    async fn content_request<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
        payload: &serde_json::Value,
        timeout: Duration,
        require_ok_code: bool,
    ) -> PlatformResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .timeout(timeout)
            .bearer_auth(access_token)
            .header("Content-Type", "application/json; charset=UTF-8")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("platform response from {path}: {status} {body}");

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(PlatformError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            Err(e) => return Err(PlatformError::Malformed(e.to_string())),
        };

        match envelope.error {
            Some(error) if error.code != "ok" => {
                return Err(PlatformError::Api {
                    code: error.code,
                    message: error.message,
                });
            }
            None if require_ok_code && status.is_success() => {
                return Err(PlatformError::Malformed(format!(
                    "{path} response has no error code"
                )));
            }
            _ => {}
        }

        if !status.is_success() {
            return Err(PlatformError::Status {
                status: status.as_u16(),
                body,
            });
        }

        envelope
            .data
            .ok_or_else(|| PlatformError::Malformed(format!("{path} response has no data")))
    }
}

#[async_trait]
impl PlatformApi for TikTokClient {
    async fn refresh_token(&self, refresh_token: &str) -> PlatformResult<TokenGrant> {
        self.token_request(&[
            ("client_key", self.client_key.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> PlatformResult<TokenGrant> {
        self.token_request(&[
            ("client_key", self.client_key.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ])
        .await
    }

    async fn init_publish(
        &self,
        access_token: &str,
        request: &PublishRequest,
    ) -> PlatformResult<String> {
        let payload = json!({
            "post_info": {
                "title": request.caption,
                "privacy_level": request.privacy_level.as_str(),
                "disable_comment": request.options.disable_comment,
                "auto_add_music": request.options.auto_add_music,
            },
            "source_info": {
                "source": "PULL_FROM_URL",
                "photo_images": request.image_urls,
            },
            "post_mode": "DIRECT_POST",
            "media_type": "PHOTO",
        });

        let data: InitData = self
            .content_request(CONTENT_INIT_PATH, access_token, &payload, INIT_TIMEOUT, true)
            .await?;

        data.publish_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PlatformError::Malformed("init response has no publish_id".into()))
    }

    async fn fetch_status(
        &self,
        access_token: &str,
        publish_id: &str,
    ) -> PlatformResult<StatusReport> {
        let payload = json!({ "publish_id": publish_id });
        let data: StatusData = self
            .content_request(STATUS_FETCH_PATH, access_token, &payload, STATUS_TIMEOUT, false)
            .await?;

        let status: PublishStatus = data.status.as_deref().unwrap_or_default().into();
        Ok(StatusReport::new(status).with_fail_reason(data.fail_reason.unwrap_or_default()))
    }
}
