//! One publish cycle: select, host, generate, publish, record.
//!
//! This is the only layer that logs at error severity. Collaborators report
//! failures through their return values and the cycle decides what to do.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use crate::clock::Clock;
use crate::domain::generated_post::{GeneratedPost, PostStyle};
use crate::domain::post::{NewPostLog, PostStatus};
use crate::domain::product::Product;
use crate::generator::ContentGenerator;
use crate::hosting::ImageHost;
use crate::platform::{PostOptions, PrivacyLevel, PublishError, Publisher};
use crate::repository::{PostLogWriter, ProductReader, ProductWriter};
use crate::services::rotation;

/// Tunables for a publish cycle.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub style: PostStyle,
    pub max_retries: u32,
    pub privacy_level: PrivacyLevel,
    pub options: PostOptions,
    pub publish_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            style: PostStyle::default(),
            max_retries: crate::generator::DEFAULT_MAX_RETRIES,
            privacy_level: PrivacyLevel::default(),
            options: PostOptions::default(),
            publish_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// What the caller asked for.
#[derive(Debug, Clone, Default)]
pub struct PostRequest {
    /// Stop after generation without publishing or writing anything.
    pub dry_run: bool,
    /// Publish this product instead of the rotation pick.
    pub product_id: Option<String>,
}

/// Step a failed run stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Selection,
    Hosting,
    Generation,
    Publish,
    Recording,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Selection => "selection",
            Stage::Hosting => "image hosting",
            Stage::Generation => "generation",
            Stage::Publish => "publish",
            Stage::Recording => "recording",
        })
    }
}

/// Top-level result of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Published {
        item_id: String,
        publish_id: String,
    },
    DryRun {
        item_id: String,
        hosted_image_url: String,
        post: GeneratedPost,
    },
    NoCandidate,
    ConfigurationError(String),
    PipelineFailure {
        item_id: Option<String>,
        stage: Stage,
        reason: String,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Published { .. } | RunOutcome::DryRun { .. })
    }

    fn failure(product: Option<&Product>, stage: Stage, reason: impl Into<String>) -> Self {
        RunOutcome::PipelineFailure {
            item_id: product.map(|p| p.item_id.clone()),
            stage,
            reason: reason.into(),
        }
    }
}

/// Collaborators used by a publish cycle.
pub struct Pipeline {
    pub host: Arc<dyn ImageHost>,
    pub generator: ContentGenerator,
    pub publisher: Publisher,
    pub clock: Arc<dyn Clock>,
    pub settings: PipelineSettings,
}

/// Run one full cycle and report how it ended.
///
/// The store is written at most twice: one log entry once a publish was
/// attempted, and the statistics update after a confirmed publish.
pub async fn run_single_post<R>(repo: &R, pipeline: &mut Pipeline, request: PostRequest) -> RunOutcome
where
    R: ProductReader + ProductWriter + PostLogWriter + ?Sized,
{
    let outcome = run_cycle(repo, pipeline, &request).await;
    report(&outcome);
    outcome
}

async fn run_cycle<R>(repo: &R, pipeline: &mut Pipeline, request: &PostRequest) -> RunOutcome
where
    R: ProductReader + ProductWriter + PostLogWriter + ?Sized,
{
    let product = match select_product(repo, request.product_id.as_deref()) {
        Ok(Some(product)) => product,
        Ok(None) => return RunOutcome::NoCandidate,
        Err(outcome) => return outcome,
    };
    info!(
        "selected product {} ({}), posted {} time(s)",
        product.item_id, product.name, product.post_count
    );

    let Some(image_url) = product.image_url.as_deref().filter(|url| !url.is_empty()) else {
        return RunOutcome::failure(Some(&product), Stage::Hosting, "product has no image");
    };

    let hosted_image_url = match pipeline.host.host(image_url).await {
        Ok(url) => url,
        Err(e) => return RunOutcome::failure(Some(&product), Stage::Hosting, e.to_string()),
    };

    let settings = pipeline.settings.clone();
    let post = match pipeline
        .generator
        .generate(&product, settings.style, settings.max_retries)
        .await
    {
        Ok(post) => post,
        Err(e) => return RunOutcome::failure(Some(&product), Stage::Generation, e.to_string()),
    };

    if request.dry_run {
        return RunOutcome::DryRun {
            item_id: product.item_id,
            hosted_image_url,
            post,
        };
    }

    let publish_id = match pipeline
        .publisher
        .init(
            std::slice::from_ref(&hosted_image_url),
            &post.full_text,
            settings.privacy_level,
            settings.options,
        )
        .await
    {
        Ok(publish_id) => publish_id,
        Err(PublishError::NoAccessToken) => {
            return RunOutcome::ConfigurationError(PublishError::NoAccessToken.to_string());
        }
        Err(e @ PublishError::Rejected(_)) => {
            let entry = log_entry(&product, &post, &hosted_image_url, pipeline, PostStatus::Failed);
            if let Err(outcome) = append_log(repo, &product, entry) {
                return outcome;
            }
            return RunOutcome::failure(Some(&product), Stage::Publish, e.to_string());
        }
    };

    let result = pipeline
        .publisher
        .await_terminal(&publish_id, settings.publish_timeout, settings.poll_interval)
        .await;

    if !result.success {
        let entry = log_entry(&product, &post, &hosted_image_url, pipeline, PostStatus::Failed)
            .with_publish_id(Some(publish_id.as_str()));
        if let Err(outcome) = append_log(repo, &product, entry) {
            return outcome;
        }
        let reason = format!(
            "{}: {}",
            result.status,
            result.fail_reason.as_deref().unwrap_or("Unknown")
        );
        return RunOutcome::failure(Some(&product), Stage::Publish, reason);
    }

    let entry = log_entry(&product, &post, &hosted_image_url, pipeline, PostStatus::Published)
        .with_publish_id(Some(publish_id.as_str()));
    if let Err(outcome) = append_log(repo, &product, entry) {
        return outcome;
    }
    let posted_at = pipeline.clock.now().naive_utc();
    if let Err(e) = repo.record_successful_post(&product.item_id, posted_at) {
        return RunOutcome::failure(Some(&product), Stage::Recording, e.to_string());
    }

    RunOutcome::Published {
        item_id: product.item_id,
        publish_id,
    }
}

fn select_product<R>(repo: &R, product_id: Option<&str>) -> Result<Option<Product>, RunOutcome>
where
    R: ProductReader + ?Sized,
{
    match product_id {
        Some(item_id) => match repo.get_product_by_item_id(item_id) {
            Ok(Some(product)) => Ok(Some(product)),
            Ok(None) => Err(RunOutcome::PipelineFailure {
                item_id: Some(item_id.to_string()),
                stage: Stage::Selection,
                reason: "product not found".into(),
            }),
            Err(e) => Err(RunOutcome::failure(None, Stage::Selection, e.to_string())),
        },
        None => rotation::select_next(repo)
            .map_err(|e| RunOutcome::failure(None, Stage::Selection, e.to_string())),
    }
}

fn log_entry(
    product: &Product,
    post: &GeneratedPost,
    hosted_image_url: &str,
    pipeline: &Pipeline,
    status: PostStatus,
) -> NewPostLog {
    NewPostLog::new(
        product.item_id.as_str(),
        post.full_text.as_str(),
        status,
        pipeline.clock.now().naive_utc(),
    )
    .with_hosted_image_url(hosted_image_url)
}

fn append_log<R>(repo: &R, product: &Product, entry: NewPostLog) -> Result<(), RunOutcome>
where
    R: PostLogWriter + ?Sized,
{
    repo.append_post_log(&entry)
        .map(|_| ())
        .map_err(|e| RunOutcome::failure(Some(product), Stage::Recording, e.to_string()))
}

fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Published {
            item_id,
            publish_id,
        } => info!("published {item_id}: publish_id={publish_id}"),
        RunOutcome::DryRun {
            item_id,
            hosted_image_url,
            post,
        } => info!(
            "dry run for {item_id}, nothing published\nimage: {hosted_image_url}\ncaption:\n{}",
            post.full_text
        ),
        RunOutcome::NoCandidate => warn!("no active product is available for posting"),
        RunOutcome::ConfigurationError(reason) => error!("configuration error: {reason}"),
        RunOutcome::PipelineFailure {
            item_id,
            stage,
            reason,
        } => error!(
            "{stage} failed for {}: {reason}",
            item_id.as_deref().unwrap_or("<none>")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::credentials::{CredentialResult, CredentialStore, TokenManager};
    use crate::domain::credential::CredentialRecord;
    use crate::domain::post::PostLog;
    use crate::generator::mock::MockTextGenerator;
    use crate::hosting::HostingError;
    use crate::platform::mock::MockPlatformApi;
    use crate::platform::{PlatformApi, PlatformError, PublishStatus, StatusReport};
    use crate::repository::mock::MockStore;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};

    const VALID_REPLY: &str = "Body:\nPR Stay cool with this fan! Check it on TikTok Shop.\n\nHashtags:\n#fan #summer #gadget #cool #pr";

    struct StaticToken;

    impl CredentialStore for StaticToken {
        fn load(&self) -> CredentialResult<Option<CredentialRecord>> {
            Ok(Some(CredentialRecord {
                access_token: "token".into(),
                refresh_token: None,
                expires_at: None,
                account_id: None,
            }))
        }

        fn save(&self, _record: &CredentialRecord) -> CredentialResult<()> {
            Ok(())
        }
    }

    struct FixedHost(Result<&'static str, ()>);

    #[async_trait]
    impl ImageHost for FixedHost {
        async fn host(&self, _source_url: &str) -> Result<String, HostingError> {
            self.0
                .map(str::to_string)
                .map_err(|_| HostingError::Rejected("down".into()))
        }
    }

    fn product() -> Product {
        let ts = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Product {
            id: 1,
            item_id: "p1".into(),
            name: "Neck Fan".into(),
            price: Some(2980),
            image_url: Some("https://x/img.jpg".into()),
            category: None,
            description: None,
            affiliate_url: None,
            post_count: 0,
            last_posted_at: None,
            is_active: true,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn logged(entry: &NewPostLog) -> PostLog {
        PostLog {
            id: 1,
            item_id: entry.item_id.clone(),
            post_text: entry.post_text.clone(),
            hosted_image_url: entry.hosted_image_url.clone(),
            publish_id: entry.publish_id.clone(),
            status: entry.status,
            posted_at: entry.posted_at,
        }
    }

    fn pipeline(api: MockPlatformApi, text: MockTextGenerator, host: FixedHost) -> Pipeline {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        ));
        let api: Arc<dyn PlatformApi> = Arc::new(api);
        let tokens = TokenManager::new(Box::new(StaticToken), api.clone(), clock.clone());
        Pipeline {
            host: Arc::new(host),
            generator: ContentGenerator::new(Arc::new(text)),
            publisher: Publisher::new(api, tokens, clock.clone()),
            clock,
            settings: PipelineSettings {
                poll_interval: Duration::from_secs(1),
                publish_timeout: Duration::from_secs(10),
                ..PipelineSettings::default()
            },
        }
    }

    fn valid_text() -> MockTextGenerator {
        let mut text = MockTextGenerator::new();
        text.expect_complete()
            .returning(|_| Ok(VALID_REPLY.to_string()));
        text
    }

    fn store_with_product() -> MockStore {
        let mut repo = MockStore::default();
        repo.product_reader
            .expect_list_products()
            .returning(|_| Ok(vec![product()]));
        repo
    }

    #[tokio::test]
    async fn failed_publish_logs_failure_and_keeps_statistics() {
        let mut api = MockPlatformApi::new();
        api.expect_init_publish()
            .returning(|_, _| Ok("pub_9".into()));
        api.expect_fetch_status().returning(|_, _| {
            Ok(StatusReport::new(PublishStatus::Failed).with_fail_reason("spam_risk"))
        });
        let mut repo = store_with_product();
        repo.post_writer
            .expect_append_post_log()
            .withf(|entry| {
                entry.status == PostStatus::Failed && entry.publish_id.as_deref() == Some("pub_9")
            })
            .times(1)
            .returning(|entry| Ok(logged(entry)));
        repo.product_writer.expect_record_successful_post().times(0);
        let mut pipeline = pipeline(api, valid_text(), FixedHost(Ok("https://host/img.jpg")));

        let outcome = run_single_post(&repo, &mut pipeline, PostRequest::default()).await;

        assert!(
            matches!(outcome, RunOutcome::PipelineFailure { stage: Stage::Publish, ref reason, .. } if reason.contains("spam_risk")),
            "got: {outcome:?}"
        );
    }

    #[tokio::test]
    async fn rejected_init_logs_failure_without_publish_id() {
        let mut api = MockPlatformApi::new();
        api.expect_init_publish().times(1).returning(|_, _| {
            Err(PlatformError::Api {
                code: "access_token_invalid".into(),
                message: "bad token".into(),
            })
        });
        api.expect_fetch_status().times(0);
        let mut repo = store_with_product();
        repo.post_writer
            .expect_append_post_log()
            .withf(|entry| entry.status == PostStatus::Failed && entry.publish_id.is_none())
            .times(1)
            .returning(|entry| Ok(logged(entry)));
        let mut pipeline = pipeline(api, valid_text(), FixedHost(Ok("https://host/img.jpg")));

        let outcome = run_single_post(&repo, &mut pipeline, PostRequest::default()).await;

        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn hosting_failure_stops_before_generation() {
        let mut text = MockTextGenerator::new();
        text.expect_complete().times(0);
        let mut repo = store_with_product();
        repo.post_writer.expect_append_post_log().times(0);
        let mut pipeline = pipeline(MockPlatformApi::new(), text, FixedHost(Err(())));

        let outcome = run_single_post(&repo, &mut pipeline, PostRequest::default()).await;

        assert!(matches!(
            outcome,
            RunOutcome::PipelineFailure {
                stage: Stage::Hosting,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn product_without_image_fails() {
        let mut repo = MockStore::default();
        repo.product_reader
            .expect_get_product_by_item_id()
            .returning(|_| {
                let mut product = product();
                product.image_url = None;
                Ok(Some(product))
            });
        let mut pipeline = pipeline(
            MockPlatformApi::new(),
            MockTextGenerator::new(),
            FixedHost(Ok("unused")),
        );
        let request = PostRequest {
            dry_run: false,
            product_id: Some("p1".into()),
        };

        let outcome = run_single_post(&repo, &mut pipeline, request).await;

        assert!(matches!(
            outcome,
            RunOutcome::PipelineFailure {
                stage: Stage::Hosting,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unknown_product_id_fails_selection() {
        let mut repo = MockStore::default();
        repo.product_reader
            .expect_get_product_by_item_id()
            .returning(|_| Ok(None));
        let mut pipeline = pipeline(
            MockPlatformApi::new(),
            MockTextGenerator::new(),
            FixedHost(Ok("unused")),
        );
        let request = PostRequest {
            dry_run: false,
            product_id: Some("ghost".into()),
        };

        let outcome = run_single_post(&repo, &mut pipeline, request).await;

        assert_eq!(
            outcome,
            RunOutcome::PipelineFailure {
                item_id: Some("ghost".into()),
                stage: Stage::Selection,
                reason: "product not found".into(),
            }
        );
    }

    #[tokio::test]
    async fn empty_catalogue_is_no_candidate() {
        let mut repo = MockStore::default();
        repo.product_reader
            .expect_list_products()
            .returning(|_| Ok(vec![]));
        let mut pipeline = pipeline(
            MockPlatformApi::new(),
            MockTextGenerator::new(),
            FixedHost(Ok("unused")),
        );

        let outcome = run_single_post(&repo, &mut pipeline, PostRequest::default()).await;

        assert_eq!(outcome, RunOutcome::NoCandidate);
    }
}
