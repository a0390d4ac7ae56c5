use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// Persisted platform credentials.
///
/// The file on disk is the source of truth between runs; any in-memory copy
/// is only a cache of the last load or refresh.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CredentialRecord {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Absolute expiry of `access_token`; `None` means it never expires.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "open_id")]
    pub account_id: Option<String>,
}

impl CredentialRecord {
    /// Whether the access token must not be used without a refresh.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if now > expires_at)
    }
}

/// Token pair returned by the platform's token endpoint.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default, alias = "open_id")]
    pub account_id: Option<String>,
}

impl TokenGrant {
    /// Turn the grant into a record issued at `now`, carrying over the
    /// refresh token and account of `previous` when the grant omits them.
    pub fn into_record(
        self,
        previous: Option<&CredentialRecord>,
        now: DateTime<Utc>,
    ) -> CredentialRecord {
        let lifetime = self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        CredentialRecord {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous.and_then(|record| record.refresh_token.clone())),
            expires_at: Some(now + Duration::seconds(lifetime)),
            account_id: self
                .account_id
                .or_else(|| previous.and_then(|record| record.account_id.clone())),
        }
    }
}
