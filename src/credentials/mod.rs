//! Platform credential lifecycle: persisted token record plus refresh.

use thiserror::Error;

use crate::platform::PlatformError;

pub mod manager;
pub mod store;

pub use manager::TokenManager;
pub use store::{CredentialStore, FileCredentialStore};

pub type CredentialResult<T> = Result<T, CredentialError>;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no platform credentials are stored")]
    NotConfigured,
    #[error("stored credentials have no refresh token")]
    MissingRefreshToken,
    #[error("credential file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("token endpoint call failed: {0}")]
    Platform(#[from] PlatformError),
}
