use crate::error::{PipelineError, Result};
use crate::fetcher::RetryingFetcher;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Statistics provider endpoint and its public API key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetadata {
    pub endpoint: String,
    pub api_key: String,
}

#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self) -> Result<ApiMetadata>;
}

/// Fixed endpoint/key pair taken from configuration
pub struct StaticMetadata(pub ApiMetadata);

#[async_trait]
impl MetadataSource for StaticMetadata {
    async fn fetch(&self) -> Result<ApiMetadata> {
        Ok(self.0.clone())
    }
}

/// Discovers the GraphQL endpoint and key from the provider's public web
/// app: the page itself is searched first, then each script bundle it loads.
pub struct SiteScraper {
    fetcher: Arc<RetryingFetcher>,
    page_url: String,
    script_src: Regex,
    endpoint: Regex,
    api_key: Regex,
}

impl SiteScraper {
    pub fn new(fetcher: Arc<RetryingFetcher>, page_url: String) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| PipelineError::Metadata(e.to_string()))
        };
        Ok(Self {
            fetcher,
            page_url,
            script_src: compile(r#"<script[^>]+src="([^"]+\.js)""#)?,
            endpoint: compile(r"https://graphql-prod-[0-9]+\.prod\.aws\.worldathletics\.org/graphql")?,
            api_key: compile(r"da2-[a-z0-9]{26}")?,
        })
    }

    fn extract(&self, text: &str) -> (Option<String>, Option<String>) {
        (
            self.endpoint.find(text).map(|m| m.as_str().to_string()),
            self.api_key.find(text).map(|m| m.as_str().to_string()),
        )
    }

    fn absolute(&self, src: &str) -> String {
        if src.starts_with("http://") || src.starts_with("https://") {
            return src.to_string();
        }
        let origin_end = self
            .page_url
            .find("://")
            .and_then(|scheme| {
                self.page_url[scheme + 3..]
                    .find('/')
                    .map(|path| scheme + 3 + path)
            })
            .unwrap_or(self.page_url.len());
        let origin = &self.page_url[..origin_end];
        if src.starts_with('/') {
            format!("{}{}", origin, src)
        } else {
            format!("{}/{}", origin, src)
        }
    }
}

#[async_trait]
impl MetadataSource for SiteScraper {
    async fn fetch(&self) -> Result<ApiMetadata> {
        let page = self.fetcher.get_text(&self.page_url).await?;
        let (mut endpoint, mut api_key) = self.extract(&page);

        for caps in self.script_src.captures_iter(&page) {
            if endpoint.is_some() && api_key.is_some() {
                break;
            }
            let script_url = self.absolute(&caps[1]);
            let script = self.fetcher.get_text(&script_url).await?;
            let (found_endpoint, found_key) = self.extract(&script);
            endpoint = endpoint.or(found_endpoint);
            api_key = api_key.or(found_key);
        }

        match (endpoint, api_key) {
            (Some(endpoint), Some(api_key)) => {
                info!("Discovered statistics endpoint {}", endpoint);
                Ok(ApiMetadata { endpoint, api_key })
            }
            _ => Err(PipelineError::Metadata(format!(
                "endpoint or key not found on {}",
                self.page_url
            ))),
        }
    }
}

struct Cached {
    value: ApiMetadata,
    fetched_at: Instant,
}

/// Holds the current endpoint metadata and refreshes it once it is older
/// than `max_age`.
///
/// At most one refresh is in flight. Callers that arrive during a refresh
/// wait for it and take its outcome; when that refresh fails they get the
/// previous value if there is one.
pub struct MetadataCache {
    source: Arc<dyn MetadataSource>,
    max_age: Duration,
    current: RwLock<Option<Cached>>,
    refresh_lock: Mutex<()>,
    refreshes: AtomicU64,
}

impl MetadataCache {
    pub fn new(source: Arc<dyn MetadataSource>, max_age: Duration) -> Self {
        Self {
            source,
            max_age,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            refreshes: AtomicU64::new(0),
        }
    }

    pub async fn current(&self) -> Result<ApiMetadata> {
        if let Some(fresh) = self.fresh().await {
            return Ok(fresh);
        }

        let seen = self.refreshes.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        // The value may have been refreshed between the first check and `seen`.
        if let Some(fresh) = self.fresh().await {
            return Ok(fresh);
        }
        if self.refreshes.load(Ordering::Acquire) != seen {
            // A refresh finished while we were waiting; use whatever it left.
            return match self.last().await {
                Some(value) => Ok(value),
                None => Err(PipelineError::Metadata(
                    "concurrent refresh failed".to_string(),
                )),
            };
        }

        let outcome = self.source.fetch().await;
        let result = match outcome {
            Ok(value) => {
                *self.current.write().await = Some(Cached {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(value)
            }
            Err(e) => match self.last().await {
                Some(previous) => {
                    warn!("Metadata refresh failed, serving previous value: {}", e);
                    Ok(previous)
                }
                None => Err(e),
            },
        };
        self.refreshes.fetch_add(1, Ordering::AcqRel);
        result
    }

    async fn fresh(&self) -> Option<ApiMetadata> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.max_age)
            .map(|cached| cached.value.clone())
    }

    async fn last(&self) -> Option<ApiMetadata> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|cached| cached.value.clone())
    }
}
