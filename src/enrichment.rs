use crate::error::Result;
use crate::fetcher::RetryingFetcher;
use crate::models::AthleteRequest;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Knowledge-base property holding the statistics provider's athlete id
pub const ATHLETE_ID_PROPERTY: &str = "P1146";

#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// First entity carrying any of `external_ids` under
    /// [`ATHLETE_ID_PROPERTY`]
    async fn find_entity(&self, external_ids: &[&str]) -> Result<Option<String>>;

    /// Title of the English encyclopedia article linked from the entity
    async fn article_title(&self, entity_id: &str) -> Result<Option<String>>;

    /// Plain-text intro extract of an article
    async fn summary(&self, title: &str) -> Result<Option<String>>;
}

/// Looks up an encyclopedia summary for an athlete. Each missing link in
/// the chain (no entity, no article, no extract) ends the lookup with `None`.
pub struct Enricher {
    kb: Arc<dyn KnowledgeBase>,
    char_ceiling: usize,
}

impl Enricher {
    pub fn new(kb: Arc<dyn KnowledgeBase>, char_ceiling: usize) -> Self {
        Self { kb, char_ceiling }
    }

    /// Whether another biography still fits, given the text accumulated so far
    pub fn within_budget(&self, accumulated_chars: usize) -> bool {
        accumulated_chars < self.char_ceiling
    }

    pub async fn biography(&self, athlete: &AthleteRequest) -> Result<Option<String>> {
        let mut ids = vec![athlete.id.as_str()];
        if let Some(secondary) = athlete.secondary_id.as_deref() {
            if secondary != athlete.id {
                ids.push(secondary);
            }
        }

        let Some(entity) = self.kb.find_entity(&ids).await? else {
            debug!("No knowledge-base entity for {}", athlete.id);
            return Ok(None);
        };
        let Some(title) = self.kb.article_title(&entity).await? else {
            debug!("Entity {} has no encyclopedia article", entity);
            return Ok(None);
        };
        self.kb.summary(&title).await
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, EntityWire>,
}

#[derive(Debug, Deserialize)]
struct EntityWire {
    #[serde(default)]
    sitelinks: HashMap<String, Sitelink>,
}

#[derive(Debug, Deserialize)]
struct Sitelink {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    extract: Option<String>,
}

/// Wikidata for entity lookup, Wikipedia for summaries
pub struct WikiClient {
    fetcher: Arc<RetryingFetcher>,
    wikidata_api: String,
    wikipedia_api: String,
    extract_chars: usize,
}

impl WikiClient {
    pub fn new(
        fetcher: Arc<RetryingFetcher>,
        wikidata_base: &str,
        wikipedia_base: &str,
        extract_chars: usize,
    ) -> Self {
        Self {
            fetcher,
            wikidata_api: format!("{}/w/api.php", wikidata_base.trim_end_matches('/')),
            wikipedia_api: format!("{}/w/api.php", wikipedia_base.trim_end_matches('/')),
            extract_chars,
        }
    }
}

#[async_trait]
impl KnowledgeBase for WikiClient {
    async fn find_entity(&self, external_ids: &[&str]) -> Result<Option<String>> {
        let statement = external_ids
            .iter()
            .map(|id| format!("{}={}", ATHLETE_ID_PROPERTY, id))
            .collect::<Vec<_>>()
            .join("|");
        let response: SearchResponse = self
            .fetcher
            .get_json(
                &self.wikidata_api,
                &[
                    ("action", "query".to_string()),
                    ("list", "search".to_string()),
                    ("format", "json".to_string()),
                    ("srsearch", format!("haswbstatement:{}", statement)),
                ],
            )
            .await?;

        Ok(response
            .query
            .and_then(|q| q.search.into_iter().next())
            .map(|hit| hit.title))
    }

    async fn article_title(&self, entity_id: &str) -> Result<Option<String>> {
        let mut response: EntitiesResponse = self
            .fetcher
            .get_json(
                &self.wikidata_api,
                &[
                    ("action", "wbgetentities".to_string()),
                    ("ids", entity_id.to_string()),
                    ("props", "sitelinks".to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        Ok(response
            .entities
            .remove(entity_id)
            .and_then(|mut entity| entity.sitelinks.remove("enwiki"))
            .map(|link| link.title))
    }

    async fn summary(&self, title: &str) -> Result<Option<String>> {
        let response: ExtractResponse = self
            .fetcher
            .get_json(
                &self.wikipedia_api,
                &[
                    ("format", "json".to_string()),
                    ("action", "query".to_string()),
                    ("prop", "extracts".to_string()),
                    ("exintro", "true".to_string()),
                    ("explaintext", "true".to_string()),
                    ("redirects", "1".to_string()),
                    ("exchars", self.extract_chars.to_string()),
                    ("titles", title.to_string()),
                ],
            )
            .await?;

        Ok(response
            .query
            .and_then(|q| q.pages.into_values().next())
            .and_then(|page| page.extract)
            .filter(|extract| !extract.trim().is_empty()))
    }
}
