//! Meet Oracle
//!
//! Gathers recent results and biographies for a field of athletes, turns
//! them into a race-preview prompt and returns the language model's
//! predicted finishing order.

mod cache;
mod config;
mod disciplines;
mod enrichment;
mod error;
mod fetcher;
mod llm;
mod metadata;
mod models;
mod pipeline;
mod prompt;
mod resolver;
mod routes;
mod stats;
#[cfg(test)]
mod testing;
mod window;

use anyhow::{Context, Result};
use cache::{AthleteCache, CacheStore, JsonFileStore, MemoryStore};
use config::Config;
use enrichment::{Enricher, WikiClient};
use fetcher::RetryingFetcher;
use llm::ChatClient;
use metadata::{ApiMetadata, MetadataCache, MetadataSource, SiteScraper, StaticMetadata};
use pipeline::{MatchService, PipelineSettings};
use resolver::AthleteResolver;
use routes::AppState;
use stats::GraphQlStats;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("meet_oracle=info".parse()?))
        .init();

    info!("Meet Oracle v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Invalid configuration")?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let fetcher = Arc::new(RetryingFetcher::new(client, config.fetch_rate_limit_per_minute));

    let source: Arc<dyn MetadataSource> = match &config.stats_endpoint {
        Some((endpoint, api_key)) => {
            info!("Using configured statistics endpoint {}", endpoint);
            Arc::new(StaticMetadata(ApiMetadata {
                endpoint: endpoint.clone(),
                api_key: api_key.clone(),
            }))
        }
        None => {
            info!("Discovering statistics endpoint from {}", config.metadata_page_url);
            Arc::new(SiteScraper::new(fetcher.clone(), config.metadata_page_url.clone())?)
        }
    };
    let metadata = Arc::new(MetadataCache::new(
        source,
        Duration::from_secs(config.metadata_max_age_secs),
    ));

    let store: Arc<dyn CacheStore> = match &config.cache_path {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(MemoryStore::default()),
    };
    let cache = AthleteCache::load(store)
        .await
        .context("Failed to load athlete cache")?;
    info!("Athlete cache loaded ({} athletes)", cache.len().await);

    let resolver = AthleteResolver::new(Arc::new(GraphQlStats::new(fetcher.clone())), cache);
    let enricher = Enricher::new(
        Arc::new(WikiClient::new(
            fetcher.clone(),
            &config.wikidata_url,
            &config.wikipedia_url,
            config.bio_extract_chars,
        )),
        config.enrich_char_ceiling,
    );
    let llm = Arc::new(ChatClient::new(
        fetcher.client().clone(),
        &config.llm_base_url,
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    ));
    let settings = PipelineSettings {
        max_athletes: config.max_athletes,
        default_temperature: config.default_temperature,
        persist_cache: config.persist_cache,
    };

    let service = MatchService::new(metadata.clone(), resolver, enricher, llm, settings);
    let app = routes::router(AppState {
        service: Arc::new(service),
        metadata,
    });

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down...");
        })
        .await?;

    Ok(())
}
