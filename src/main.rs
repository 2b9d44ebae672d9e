//! Env-driven ingestion runner.
//!
//! Configuration comes from `.env`/environment variables (see
//! [`docsilo::IngestConfig::from_env`]). Set `DOCSILO_PR` to a pull-request
//! number for incremental mode; otherwise the full documentation tree under
//! `DOCSILO_DOCS_PATH` is ingested.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::providers::openai::{self, TEXT_EMBEDDING_3_SMALL};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use docsilo::pipeline::{IngestionPipeline, PullRequestScanner, SeenTracker};
use docsilo::store::SqliteSectionStore;
use docsilo::types::IngestError;
use docsilo::{IngestConfig, RateLimitedRequester};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = IngestConfig::from_env();
    if config.owner.is_empty() || config.repo.is_empty() {
        return Err("DOCSILO_OWNER and DOCSILO_REPO must be set".into());
    }

    let http = Client::builder()
        .user_agent(concat!("docsilo/", env!("CARGO_PKG_VERSION")))
        .use_rustls_tls()
        .build()?;
    let requester = RateLimitedRequester::new(
        http,
        config.github_token.clone(),
        config.max_retries,
    );

    let embedding_model = openai::Client::from_env().embedding_model(
        &env::var("DOCSILO_EMBEDDING_MODEL")
            .unwrap_or_else(|_| TEXT_EMBEDDING_3_SMALL.to_string()),
    );

    let db_path = env::var("DOCSILO_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./docsilo.sqlite"));
    let store = Arc::new(SqliteSectionStore::open(&db_path, embedding_model).await?);

    let mut pipeline = IngestionPipeline::new(&config, requester.clone(), store.clone())?;
    if let Some(state_path) = &config.seen_state {
        let tracker = SeenTracker::new(state_path);
        tracker.load().await?;
        pipeline = pipeline.with_tracker(tracker);
    }

    let summary = match env::var("DOCSILO_PR").ok().and_then(|n| n.parse::<u64>().ok()) {
        Some(number) => {
            info!(number, "scanning pull request");
            let scanner = PullRequestScanner::new(&config, requester, pipeline);
            scanner.scan_pull_request(number).await
        }
        None => {
            info!(
                owner = %config.owner,
                repo = %config.repo,
                root = %config.docs_path,
                "ingesting documentation tree"
            );
            pipeline.run(&config.docs_path).await
        }
    };

    let stored: Result<usize, IngestError> = store.count().await;
    info!(%summary, total_sections = stored.unwrap_or(0), db = %db_path.display(), "run complete");
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
