//! Runtime settings read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::domain::generated_post::PostStyle;
use crate::generator::DEFAULT_LANGUAGE;
use crate::generator::anthropic::DEFAULT_MODEL;
use crate::hosting::DEFAULT_UPLOAD_URL;
use crate::platform::PrivacyLevel;
use crate::platform::client::DEFAULT_API_BASE_URL;

const DEFAULT_DATABASE_URL: &str = "data/posts.db";
const DEFAULT_TOKENS_FILE: &str = "data/tiktok_tokens.json";
const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 120;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Groups of credentials a command depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Generation,
    Hosting,
    Platform,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub tokens_file: PathBuf,
    pub anthropic_api_key: String,
    pub anthropic_model: String,
    pub tiktok_client_key: String,
    pub tiktok_client_secret: String,
    pub tiktok_access_token: Option<String>,
    pub tiktok_api_base_url: String,
    pub imgbb_api_key: String,
    pub imgbb_upload_url: String,
    pub privacy_level: PrivacyLevel,
    pub publish_timeout: Duration,
    pub poll_interval: Duration,
    pub generation_max_retries: u32,
    pub post_style: PostStyle,
    pub post_language: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let text = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_url: text("DATABASE_URL", DEFAULT_DATABASE_URL),
            tokens_file: PathBuf::from(text("TOKENS_FILE", DEFAULT_TOKENS_FILE)),
            anthropic_api_key: text("ANTHROPIC_API_KEY", ""),
            anthropic_model: text("ANTHROPIC_MODEL", DEFAULT_MODEL),
            tiktok_client_key: text("TIKTOK_CLIENT_KEY", ""),
            tiktok_client_secret: text("TIKTOK_CLIENT_SECRET", ""),
            tiktok_access_token: get("TIKTOK_ACCESS_TOKEN"),
            tiktok_api_base_url: text("TIKTOK_API_BASE_URL", DEFAULT_API_BASE_URL),
            imgbb_api_key: text("IMGBB_API_KEY", ""),
            imgbb_upload_url: text("IMGBB_UPLOAD_URL", DEFAULT_UPLOAD_URL),
            privacy_level: parsed(get("PRIVACY_LEVEL"), "PRIVACY_LEVEL", PrivacyLevel::default())?,
            publish_timeout: Duration::from_secs(parsed(
                get("PUBLISH_TIMEOUT_SECS"),
                "PUBLISH_TIMEOUT_SECS",
                DEFAULT_PUBLISH_TIMEOUT_SECS,
            )?),
            poll_interval: Duration::from_secs(parsed(
                get("PUBLISH_POLL_INTERVAL_SECS"),
                "PUBLISH_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )?),
            generation_max_retries: parsed(
                get("GENERATION_MAX_RETRIES"),
                "GENERATION_MAX_RETRIES",
                DEFAULT_MAX_RETRIES,
            )?,
            post_style: parsed(get("POST_STYLE"), "POST_STYLE", PostStyle::default())?,
            post_language: text("POST_LANGUAGE", DEFAULT_LANGUAGE),
        })
    }

    /// Check that every credential needed by all commands is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.require(&[
            Requirement::Generation,
            Requirement::Hosting,
            Requirement::Platform,
        ])
    }

    /// Report all missing settings for the given requirements at once.
    pub fn require(&self, requirements: &[Requirement]) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        for requirement in requirements {
            let checks: Vec<(&'static str, &str)> = match requirement {
                Requirement::Generation => {
                    vec![("ANTHROPIC_API_KEY", self.anthropic_api_key.as_str())]
                }
                Requirement::Hosting => vec![("IMGBB_API_KEY", self.imgbb_api_key.as_str())],
                Requirement::Platform => vec![
                    ("TIKTOK_CLIENT_KEY", self.tiktok_client_key.as_str()),
                    ("TIKTOK_CLIENT_SECRET", self.tiktok_client_secret.as_str()),
                ],
            };
            missing.extend(
                checks
                    .iter()
                    .filter(|(_, value)| value.is_empty())
                    .map(|(key, _)| *key),
            );
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }
}

fn parsed<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.database_url, "data/posts.db");
        assert_eq!(config.tokens_file, PathBuf::from("data/tiktok_tokens.json"));
        assert_eq!(config.anthropic_model, DEFAULT_MODEL);
        assert_eq!(config.privacy_level, PrivacyLevel::SelfOnly);
        assert_eq!(config.publish_timeout, Duration::from_secs(120));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.generation_max_retries, 2);
        assert_eq!(config.post_style, PostStyle::Casual);
        assert_eq!(config.tiktok_access_token, None);
    }

    #[test]
    fn validate_lists_every_missing_key() {
        let config = config_from(&[("TIKTOK_CLIENT_KEY", "ck")]).unwrap();

        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing(vec![
                "ANTHROPIC_API_KEY",
                "IMGBB_API_KEY",
                "TIKTOK_CLIENT_SECRET",
            ]))
        );
    }

    #[test]
    fn require_checks_only_requested_groups() {
        let config =
            config_from(&[("ANTHROPIC_API_KEY", "a"), ("IMGBB_API_KEY", "i")]).unwrap();

        assert!(
            config
                .require(&[Requirement::Generation, Requirement::Hosting])
                .is_ok()
        );
        assert!(config.require(&[Requirement::Platform]).is_err());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[("TIKTOK_ACCESS_TOKEN", "  "), ("POST_STYLE", "")]).unwrap();
        assert_eq!(config.tiktok_access_token, None);
        assert_eq!(config.post_style, PostStyle::Casual);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = config_from(&[("PUBLISH_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "PUBLISH_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn enum_settings_are_parsed() {
        let config =
            config_from(&[("PRIVACY_LEVEL", "public_to_everyone"), ("POST_STYLE", "story")])
                .unwrap();
        assert_eq!(config.privacy_level, PrivacyLevel::PublicToEveryone);
        assert_eq!(config.post_style, PostStyle::Story);
    }
}
