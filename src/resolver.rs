use crate::cache::AthleteCache;
use crate::error::Result;
use crate::metadata::ApiMetadata;
use crate::models::{BasicInfo, YearResults};
use crate::stats::StatsProvider;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves athlete data through the cache, falling back to the provider.
#[derive(Clone)]
pub struct AthleteResolver {
    stats: Arc<dyn StatsProvider>,
    cache: AthleteCache,
}

impl AthleteResolver {
    pub fn new(stats: Arc<dyn StatsProvider>, cache: AthleteCache) -> Self {
        Self { stats, cache }
    }

    pub fn cache(&self) -> &AthleteCache {
        &self.cache
    }

    /// `None` means the provider has no such competitor; the athlete is
    /// left out of the prompt. Misses are not cached.
    pub async fn basic_info(&self, meta: &ApiMetadata, id: &str) -> Result<Option<BasicInfo>> {
        if let Some(info) = self.cache.basic_info(id).await {
            debug!("Basic info for {} served from cache", id);
            return Ok(Some(info));
        }

        let fetched = self.stats.basic_info(meta, id).await?;
        if let Some(info) = &fetched {
            self.cache.insert_basic_info(id, info.clone()).await;
        }
        Ok(fetched)
    }

    /// Results for one year. A provider miss is replaced by
    /// [`YearResults::synthesized`], and that stand-in is cached too.
    pub async fn year_results(&self, meta: &ApiMetadata, id: &str, year: i32) -> Result<YearResults> {
        if let Some(results) = self.cache.year(id, year).await {
            debug!("{} results for {} served from cache", year, id);
            return Ok(results);
        }

        let results = match self.stats.year_results(meta, id, year).await? {
            Some(results) => results,
            None => {
                info!("No {} results for {}, synthesizing empty year", year, id);
                YearResults::synthesized(year)
            }
        };
        self.cache.insert_year(id, year, results.clone()).await;
        Ok(results)
    }
}
