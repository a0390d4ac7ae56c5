//! Helpers for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use shop_poster::credentials::{CredentialResult, CredentialStore};
use shop_poster::db::{DbPool, establish_connection_pool, run_migrations};
use shop_poster::domain::credential::{CredentialRecord, TokenGrant};
use shop_poster::generator::{GeneratorError, TextGenerator};
use shop_poster::hosting::{HostingError, ImageHost};
use shop_poster::platform::{
    PlatformApi, PlatformError, PlatformResult, PublishRequest, PublishStatus, StatusReport,
};

/// Temporary database used in integration tests.
pub struct TestDb {
    filename: String,
    pool: DbPool,
}

impl TestDb {
    pub fn new(filename: &str) -> Self {
        std::fs::remove_file(filename).ok(); // Clean up old DB

        let pool =
            establish_connection_pool(filename).expect("Failed to establish SQLite connection.");
        run_migrations(&pool).expect("Migrations failed");
        TestDb {
            filename: filename.to_string(),
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        std::fs::remove_file(&self.filename).ok();
        std::fs::remove_file(format!("{}-shm", &self.filename)).ok();
        std::fs::remove_file(format!("{}-wal", &self.filename)).ok();
    }
}

/// Credential store holding one fixed, non-expiring token.
pub struct StaticCredentials;

impl CredentialStore for StaticCredentials {
    fn load(&self) -> CredentialResult<Option<CredentialRecord>> {
        Ok(Some(CredentialRecord {
            access_token: "test-token".into(),
            refresh_token: Some("test-refresh".into()),
            expires_at: None,
            account_id: Some("test-account".into()),
        }))
    }

    fn save(&self, _record: &CredentialRecord) -> CredentialResult<()> {
        Ok(())
    }
}

/// Platform double that accepts every init and replays a status script.
pub struct ScriptedPlatform {
    publish_id: String,
    statuses: Mutex<VecDeque<PublishStatus>>,
    pub init_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub captions: Mutex<Vec<String>>,
}

impl ScriptedPlatform {
    pub fn new(publish_id: &str, statuses: Vec<PublishStatus>) -> Self {
        Self {
            publish_id: publish_id.to_string(),
            statuses: Mutex::new(statuses.into()),
            init_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            captions: Mutex::new(Vec::new()),
        }
    }

    pub fn init_count(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn status_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformApi for ScriptedPlatform {
    async fn refresh_token(&self, _refresh_token: &str) -> PlatformResult<TokenGrant> {
        Err(PlatformError::Malformed("refresh not scripted".into()))
    }

    async fn exchange_code(&self, _code: &str, _redirect_uri: &str) -> PlatformResult<TokenGrant> {
        Err(PlatformError::Malformed("exchange not scripted".into()))
    }

    async fn init_publish(
        &self,
        _access_token: &str,
        request: &PublishRequest,
    ) -> PlatformResult<String> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.captions.lock().unwrap().push(request.caption.clone());
        Ok(self.publish_id.clone())
    }

    async fn fetch_status(
        &self,
        _access_token: &str,
        _publish_id: &str,
    ) -> PlatformResult<StatusReport> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PublishStatus::ProcessingUpload);
        Ok(StatusReport::new(status))
    }
}

/// Text generator returning the same reply for every prompt.
pub struct FixedReply {
    reply: String,
    pub calls: AtomicUsize,
}

impl FixedReply {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FixedReply {
    async fn complete(&self, _prompt: &str) -> Result<String, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Image host that maps every source to one hosted URL.
pub struct FixedHost(pub &'static str);

#[async_trait]
impl ImageHost for FixedHost {
    async fn host(&self, _source_url: &str) -> Result<String, HostingError> {
        Ok(self.0.to_string())
    }
}

pub const VALID_REPLY: &str = "Body:\nPR 首にかけるだけで涼しいネックファン！通勤もこれで快適。TikTok Shopでチェックしてね！\n\nHashtags:\n#ネックファン #夏 #ガジェット #涼しい #通勤 #PR";

pub const INVALID_REPLY: &str = "Body:\nPR Too few tags here.\n\nHashtags:\n#one #two";
