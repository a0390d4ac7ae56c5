use std::sync::Arc;

use log::{info, warn};

use super::{CredentialError, CredentialResult, CredentialStore};
use crate::clock::Clock;
use crate::domain::credential::CredentialRecord;
use crate::platform::PlatformApi;

/// Hands out a usable access token, refreshing the stored record when it
/// has expired.
///
/// The manager is an owned value threaded through its callers; the record it
/// caches is only a copy of what was last loaded or written.
pub struct TokenManager {
    store: Box<dyn CredentialStore>,
    api: Arc<dyn PlatformApi>,
    clock: Arc<dyn Clock>,
    override_token: Option<String>,
    cached: Option<CredentialRecord>,
}

impl TokenManager {
    pub fn new(
        store: Box<dyn CredentialStore>,
        api: Arc<dyn PlatformApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            api,
            clock,
            override_token: None,
            cached: None,
        }
    }

    /// Use `token` for every call without looking at the stored record or
    /// its expiry. Empty values are ignored.
    pub fn with_override_token(mut self, token: Option<String>) -> Self {
        self.override_token = token.filter(|value| !value.trim().is_empty());
        self
    }

    /// Return a currently valid access token, or `None` when there is none
    /// and one could not be obtained.
    pub async fn get_access_token(&mut self) -> Option<String> {
        if let Some(token) = &self.override_token {
            return Some(token.clone());
        }

        let record = match self.store.load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!("no platform credentials are configured");
                return None;
            }
            Err(e) => {
                warn!("ignoring unreadable credential record: {e}");
                return None;
            }
        };
        self.cached = Some(record.clone());

        if record.is_expired(self.clock.now()) {
            info!("access token has expired, refreshing");
            return match self.refresh().await {
                Ok(refreshed) => Some(refreshed.access_token),
                Err(e) => {
                    warn!("token refresh failed: {e}");
                    None
                }
            };
        }

        Some(record.access_token)
    }

    /// Exchange the stored refresh token for a new pair and persist it.
    ///
    /// The stored record is only replaced once the platform has answered, so
    /// a failed refresh leaves the previous record in place.
    pub async fn refresh(&mut self) -> CredentialResult<CredentialRecord> {
        let current = match self.cached.clone() {
            Some(record) => record,
            None => self.store.load()?.ok_or(CredentialError::NotConfigured)?,
        };

        let refresh_token = current
            .refresh_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(CredentialError::MissingRefreshToken)?;

        let grant = self.api.refresh_token(refresh_token).await?;
        let record = grant.into_record(Some(&current), self.clock.now());
        self.store.save(&record)?;

        info!("platform access token refreshed");
        self.cached = Some(record.clone());
        Ok(record)
    }

    /// Persist the first record obtained from an authorization code.
    pub async fn store_authorization(
        &mut self,
        code: &str,
        redirect_uri: &str,
    ) -> CredentialResult<CredentialRecord> {
        let grant = self.api.exchange_code(code, redirect_uri).await?;
        let record = grant.into_record(None, self.clock.now());
        self.store.save(&record)?;

        info!("platform credentials stored");
        self.cached = Some(record.clone());
        Ok(record)
    }
}
