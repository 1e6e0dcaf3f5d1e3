use anyhow::{anyhow, Result};
use std::env;
use std::str::FromStr;

/// Configuration
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub default_temperature: f32,
    /// Static endpoint/key pair; when absent the endpoint is scraped
    pub stats_endpoint: Option<(String, String)>,
    pub metadata_page_url: String,
    pub metadata_max_age_secs: u64,
    pub wikidata_url: String,
    pub wikipedia_url: String,
    pub bio_extract_chars: usize,
    pub enrich_char_ceiling: usize,
    pub cache_path: Option<String>,
    pub persist_cache: bool,
    pub fetch_rate_limit_per_minute: u32,
    pub max_athletes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Completion service key; DEEPSEEK_API_KEY kept for existing deployments
        let llm_api_key = match non_empty("LLM_API_KEY").or_else(|| non_empty("DEEPSEEK_API_KEY")) {
            Some(key) => key,
            None => return Err(anyhow!("LLM_API_KEY (or DEEPSEEK_API_KEY) must be set")),
        };

        let stats_endpoint = match (non_empty("STATS_ENDPOINT"), non_empty("STATS_API_KEY")) {
            (Some(endpoint), Some(key)) => Some((endpoint, key)),
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "STATS_ENDPOINT and STATS_API_KEY must be set together"
                ))
            }
        };

        Ok(Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed("PORT", 8080),
            llm_base_url: non_empty("LLM_BASE_URL")
                .unwrap_or_else(|| "https://api.deepseek.com/v1".to_string()),
            llm_api_key,
            llm_model: non_empty("LLM_MODEL").unwrap_or_else(|| "deepseek-chat".to_string()),
            default_temperature: parsed("DEFAULT_TEMPERATURE", 0.7),
            stats_endpoint,
            metadata_page_url: non_empty("METADATA_PAGE_URL")
                .unwrap_or_else(|| "https://worldathletics.org/athletes".to_string()),
            metadata_max_age_secs: parsed("METADATA_MAX_AGE_SECS", 3 * 60 * 60),
            wikidata_url: non_empty("WIKIDATA_URL")
                .unwrap_or_else(|| "https://www.wikidata.org".to_string()),
            wikipedia_url: non_empty("WIKIPEDIA_URL")
                .unwrap_or_else(|| "https://en.wikipedia.org".to_string()),
            bio_extract_chars: parsed("BIO_EXTRACT_CHARS", 1800),
            enrich_char_ceiling: parsed("ENRICH_CHAR_CEILING", 50_000),
            cache_path: non_empty("CACHE_PATH"),
            persist_cache: parsed("PERSIST_CACHE", false),
            fetch_rate_limit_per_minute: parsed("FETCH_RATE_LIMIT_PER_MINUTE", 600),
            max_athletes: parsed("MAX_ATHLETES", 25),
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parses `key`, falling back to `default` when unset or malformed
fn parsed<T: FromStr>(key: &str, default: T) -> T {
    non_empty(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_trims_and_falls_back() {
        env::set_var("MEET_ORACLE_TEST_FLAG", " true ");
        env::set_var("MEET_ORACLE_TEST_BAD_FLAG", "yes");
        env::set_var("MEET_ORACLE_TEST_PORT", "9090");

        assert!(parsed("MEET_ORACLE_TEST_FLAG", false));
        assert!(!parsed("MEET_ORACLE_TEST_BAD_FLAG", false));
        assert!(!parsed("MEET_ORACLE_TEST_UNSET_FLAG", false));
        assert_eq!(parsed::<u16>("MEET_ORACLE_TEST_PORT", 8080), 9090);
    }
}
