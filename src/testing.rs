//! In-memory stand-ins for the upstream services, recording every call.

use crate::enrichment::KnowledgeBase;
use crate::error::{PipelineError, Result};
use crate::llm::CompletionClient;
use crate::metadata::{ApiMetadata, MetadataSource};
use crate::models::{parse_provider_date, BasicInfo, PerformanceRecord, YearResults};
use crate::stats::StatsProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn meta() -> ApiMetadata {
    ApiMetadata {
        endpoint: "https://stats.test/graphql".to_string(),
        api_key: "da2-test".to_string(),
    }
}

#[derive(Default)]
pub struct FakeStats {
    athletes: HashMap<String, BasicInfo>,
    years: HashMap<(String, i32), YearResults>,
    basic_calls: AtomicUsize,
    year_calls: Mutex<Vec<(String, i32)>>,
}

impl FakeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_athlete(mut self, id: &str, given: &str, family: &str, birth: &str, country: &str) -> Self {
        self.athletes.insert(
            id.to_string(),
            BasicInfo {
                given_name: given.to_string(),
                family_name: family.to_string(),
                birth_date: parse_provider_date(birth),
                country_code: country.to_string(),
                secondary_id: None,
            },
        );
        self
    }

    /// `results` are `(date, discipline, mark)` at a fixed venue
    pub fn with_year(mut self, id: &str, year: i32, active: &[i32], results: &[(&str, &str, &str)]) -> Self {
        let results_by_date = results
            .iter()
            .map(|(date, discipline, mark)| PerformanceRecord {
                date: date.to_string(),
                discipline: discipline.to_string(),
                indoor: false,
                venue: "Hayward Field".to_string(),
                place: None,
                mark: mark.to_string(),
                wind: None,
                not_legal: false,
            })
            .collect();
        self.years.insert(
            (id.to_string(), year),
            YearResults {
                active_years: active.to_vec(),
                results_by_date,
            },
        );
        self
    }

    pub fn basic_calls(&self) -> usize {
        self.basic_calls.load(Ordering::SeqCst)
    }

    pub fn year_calls(&self) -> Vec<(String, i32)> {
        self.year_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatsProvider for FakeStats {
    async fn basic_info(&self, _meta: &ApiMetadata, id: &str) -> Result<Option<BasicInfo>> {
        self.basic_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.athletes.get(id).cloned())
    }

    async fn year_results(&self, _meta: &ApiMetadata, id: &str, year: i32) -> Result<Option<YearResults>> {
        self.year_calls.lock().unwrap().push((id.to_string(), year));
        Ok(self.years.get(&(id.to_string(), year)).cloned())
    }
}

struct Bio {
    entity: String,
    title: String,
    extract: String,
}

#[derive(Default)]
pub struct FakeKnowledgeBase {
    bios: HashMap<String, Bio>,
    searches: Mutex<Vec<Vec<String>>>,
    summary_calls: AtomicUsize,
}

impl FakeKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bio(mut self, external_id: &str, entity: &str, title: &str, extract: &str) -> Self {
        self.bios.insert(
            external_id.to_string(),
            Bio {
                entity: entity.to_string(),
                title: title.to_string(),
                extract: extract.to_string(),
            },
        );
        self
    }

    pub fn searches(&self) -> Vec<Vec<String>> {
        self.searches.lock().unwrap().clone()
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KnowledgeBase for FakeKnowledgeBase {
    async fn find_entity(&self, external_ids: &[&str]) -> Result<Option<String>> {
        self.searches
            .lock()
            .unwrap()
            .push(external_ids.iter().map(|id| id.to_string()).collect());
        Ok(external_ids
            .iter()
            .find_map(|id| self.bios.get(*id))
            .map(|bio| bio.entity.clone()))
    }

    async fn article_title(&self, entity_id: &str) -> Result<Option<String>> {
        Ok(self
            .bios
            .values()
            .find(|bio| bio.entity == entity_id)
            .map(|bio| bio.title.clone()))
    }

    async fn summary(&self, title: &str) -> Result<Option<String>> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .bios
            .values()
            .find(|bio| bio.title == title)
            .map(|bio| bio.extract.clone()))
    }
}

pub struct FakeCompletion {
    reply: String,
    failure: Mutex<Option<String>>,
    prompts: Mutex<Vec<(String, f32)>>,
}

impl FakeCompletion {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            failure: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_with(&self, detail: &str) {
        *self.failure.lock().unwrap() = Some(detail.to_string());
    }

    pub fn prompts(&self) -> Vec<(String, f32)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), temperature));
        let failure = self.failure.lock().unwrap().clone();
        match failure {
            Some(detail) => Err(PipelineError::Completion(detail)),
            None => Ok(self.reply.clone()),
        }
    }
}

pub struct FakeMetadataSource {
    delay: Duration,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeMetadataSource {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_from_now_on(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataSource for FakeMetadataSource {
    async fn fetch(&self) -> Result<ApiMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(PipelineError::Metadata("scrape failed".to_string()));
        }
        Ok(meta())
    }
}
