use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use shop_poster::clock::{Clock, SystemClock};
use shop_poster::config::{AppConfig, ConfigError, Requirement};
use shop_poster::credentials::{FileCredentialStore, TokenManager};
use shop_poster::db::{establish_connection_pool, run_migrations};
use shop_poster::forms::products::ImportProductsForm;
use shop_poster::generator::{AnthropicClient, ContentGenerator};
use shop_poster::hosting::ImgbbHost;
use shop_poster::platform::{PlatformApi, PostOptions, Publisher, TikTokClient};
use shop_poster::repository::DieselRepository;
use shop_poster::services::orchestrator::{
    Pipeline, PipelineSettings, PostRequest, RunOutcome, run_single_post,
};
use shop_poster::services::products::{deactivate_product, import_products, recent_posts};
use shop_poster::services::research::{
    format_recommendations, latest_recommendations, run_research,
};

const EXIT_FAILURE: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_NO_CANDIDATE: u8 = 3;

/// Completion budget for research replies, which carry a whole JSON list.
const RESEARCH_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Parser)]
#[command(version, about = "Publish affiliate products as TikTok photo posts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one publish cycle.
    Post {
        /// Stop after generating the caption; publish and record nothing.
        #[arg(long)]
        dry_run: bool,
        /// Publish this product instead of the rotation pick.
        #[arg(long)]
        product_id: Option<String>,
    },
    /// Create or upgrade the database schema.
    InitDb,
    /// Import products from a CSV file.
    Import { csv: PathBuf },
    /// Take a product out of the rotation.
    Deactivate { item_id: String },
    /// Show the most recent publish attempts.
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Ask the text service for trending products and store the list.
    Research {
        /// Show the last stored list instead of running new research.
        #[arg(long)]
        latest: bool,
    },
    /// Store platform credentials obtained from an authorization code.
    ExchangeCode {
        #[arg(long)]
        code: String,
        #[arg(long)]
        redirect_uri: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => return config_failure(e),
    };

    match cli.command {
        Command::Post {
            dry_run,
            product_id,
        } => post(&config, dry_run, product_id).await,
        Command::InitDb => match open_repository(&config) {
            Some(_) => {
                log::info!("database ready at {}", config.database_url);
                ExitCode::SUCCESS
            }
            None => ExitCode::from(EXIT_FAILURE),
        },
        Command::Import { csv } => import(&config, &csv),
        Command::Deactivate { item_id } => {
            let Some(repo) = open_repository(&config) else {
                return ExitCode::from(EXIT_FAILURE);
            };
            match deactivate_product(&repo, &item_id) {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    log::error!("cannot deactivate {item_id}: {e}");
                    ExitCode::from(EXIT_FAILURE)
                }
            }
        }
        Command::History { limit } => history(&config, limit),
        Command::Research { latest } => research(&config, latest).await,
        Command::ExchangeCode { code, redirect_uri } => {
            exchange_code(&config, &code, &redirect_uri).await
        }
    }
}

async fn post(config: &AppConfig, dry_run: bool, product_id: Option<String>) -> ExitCode {
    let requirements: &[Requirement] = if dry_run {
        &[Requirement::Generation, Requirement::Hosting]
    } else {
        &[
            Requirement::Generation,
            Requirement::Hosting,
            Requirement::Platform,
        ]
    };
    if let Err(e) = config.require(requirements) {
        return config_failure(e);
    }

    let Some(repo) = open_repository(config) else {
        return ExitCode::from(EXIT_FAILURE);
    };
    let Some(mut pipeline) = build_pipeline(config) else {
        return ExitCode::from(EXIT_FAILURE);
    };

    let request = PostRequest {
        dry_run,
        product_id,
    };
    match run_single_post(&repo, &mut pipeline, request).await {
        RunOutcome::Published { .. } | RunOutcome::DryRun { .. } => ExitCode::SUCCESS,
        RunOutcome::NoCandidate => ExitCode::from(EXIT_NO_CANDIDATE),
        RunOutcome::ConfigurationError(_) => ExitCode::from(EXIT_CONFIG),
        RunOutcome::PipelineFailure { .. } => ExitCode::from(EXIT_FAILURE),
    }
}

fn build_pipeline(config: &AppConfig) -> Option<Pipeline> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let platform = match TikTokClient::new(
        &config.tiktok_api_base_url,
        &config.tiktok_client_key,
        &config.tiktok_client_secret,
    ) {
        Ok(client) => Arc::new(client) as Arc<dyn PlatformApi>,
        Err(e) => {
            log::error!("cannot build platform client: {e}");
            return None;
        }
    };
    let text = match AnthropicClient::new(&config.anthropic_api_key, &config.anthropic_model) {
        Ok(client) => client,
        Err(e) => {
            log::error!("cannot build generation client: {e}");
            return None;
        }
    };
    let host = match ImgbbHost::new(&config.imgbb_api_key, clock.clone()) {
        Ok(host) => host.with_upload_url(&config.imgbb_upload_url),
        Err(e) => {
            log::error!("cannot build image host client: {e}");
            return None;
        }
    };

    let tokens = token_manager(config, platform.clone(), clock.clone());

    Some(Pipeline {
        host: Arc::new(host),
        generator: ContentGenerator::new(Arc::new(text)).with_language(&config.post_language),
        publisher: Publisher::new(platform, tokens, clock.clone()),
        clock,
        settings: PipelineSettings {
            style: config.post_style,
            max_retries: config.generation_max_retries,
            privacy_level: config.privacy_level,
            options: PostOptions::default(),
            publish_timeout: config.publish_timeout,
            poll_interval: config.poll_interval,
        },
    })
}

fn token_manager(
    config: &AppConfig,
    platform: Arc<dyn PlatformApi>,
    clock: Arc<dyn Clock>,
) -> TokenManager {
    TokenManager::new(
        Box::new(FileCredentialStore::new(&config.tokens_file)),
        platform,
        clock,
    )
    .with_override_token(config.tiktok_access_token.clone())
}

fn import(config: &AppConfig, csv: &Path) -> ExitCode {
    let form = match File::open(csv).and_then(ImportProductsForm::from_reader) {
        Ok(form) => form,
        Err(e) => {
            log::error!("cannot read {}: {e}", csv.display());
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    let Some(repo) = open_repository(config) else {
        return ExitCode::from(EXIT_FAILURE);
    };

    match import_products(&repo, form) {
        Ok(report) => {
            println!("imported: {}, failed: {}", report.imported, report.failed);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("import failed: {e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn history(config: &AppConfig, limit: usize) -> ExitCode {
    let Some(repo) = open_repository(config) else {
        return ExitCode::from(EXIT_FAILURE);
    };

    match recent_posts(&repo, limit) {
        Ok(entries) => {
            for entry in entries {
                println!(
                    "{}  {:<9}  {}  {}",
                    entry.posted_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.status.as_str(),
                    entry.item_id,
                    entry.publish_id.as_deref().unwrap_or("-"),
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("cannot read publish history: {e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn research(config: &AppConfig, latest: bool) -> ExitCode {
    if !latest && let Err(e) = config.require(&[Requirement::Generation]) {
        return config_failure(e);
    }
    let Some(repo) = open_repository(config) else {
        return ExitCode::from(EXIT_FAILURE);
    };

    if latest {
        return match latest_recommendations(&repo) {
            Ok(recommendations) => {
                println!("{}", format_recommendations(&recommendations));
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("cannot read stored research: {e}");
                ExitCode::from(EXIT_FAILURE)
            }
        };
    }

    let text = match AnthropicClient::new(&config.anthropic_api_key, &config.anthropic_model) {
        Ok(client) => client.with_max_tokens(RESEARCH_MAX_TOKENS),
        Err(e) => {
            log::error!("cannot build generation client: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    match run_research(&repo, &text, &SystemClock, &config.post_language).await {
        Ok(Some(log)) => {
            println!("{}", format_recommendations(&log.recommendations));
            ExitCode::SUCCESS
        }
        Ok(None) => {
            log::error!("research returned no usable recommendations");
            ExitCode::from(EXIT_FAILURE)
        }
        Err(e) => {
            log::error!("research failed: {e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn exchange_code(config: &AppConfig, code: &str, redirect_uri: &str) -> ExitCode {
    if let Err(e) = config.require(&[Requirement::Platform]) {
        return config_failure(e);
    }

    let platform: Arc<dyn PlatformApi> = match TikTokClient::new(
        &config.tiktok_api_base_url,
        &config.tiktok_client_key,
        &config.tiktok_client_secret,
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("cannot build platform client: {e}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    let mut tokens = token_manager(config, platform, Arc::new(SystemClock));

    match tokens.store_authorization(code, redirect_uri).await {
        Ok(record) => {
            log::info!(
                "credentials saved to {} for account {}",
                config.tokens_file.display(),
                record.account_id.as_deref().unwrap_or("<unknown>")
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("authorization code exchange failed: {e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Open the store, creating its directory and applying pending migrations.
fn open_repository(config: &AppConfig) -> Option<DieselRepository> {
    if let Some(parent) = Path::new(&config.database_url).parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = fs::create_dir_all(parent)
    {
        log::error!("cannot create {}: {e}", parent.display());
        return None;
    }

    let pool = match establish_connection_pool(&config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            return None;
        }
    };
    match run_migrations(&pool) {
        Ok(0) => {}
        Ok(applied) => log::info!("applied {applied} migration(s)"),
        Err(e) => {
            log::error!("{e}");
            return None;
        }
    }

    Some(DieselRepository::new(pool))
}

fn config_failure(error: ConfigError) -> ExitCode {
    log::error!("configuration error: {error}");
    ExitCode::from(EXIT_CONFIG)
}
