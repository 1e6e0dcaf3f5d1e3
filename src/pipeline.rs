use crate::disciplines;
use crate::enrichment::Enricher;
use crate::error::{PipelineError, Result};
use crate::llm::CompletionClient;
use crate::metadata::MetadataCache;
use crate::models::{AthleteRequest, Gender, MatchRequest};
use crate::prompt::{self, EventContext, PromptBlock};
use crate::resolver::AthleteResolver;
use crate::window;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_athletes: usize,
    pub default_temperature: f32,
    pub persist_cache: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_athletes: 25,
            default_temperature: 0.7,
            persist_cache: false,
        }
    }
}

/// Competition years accepted on input. The window builder looks back a few
/// years from the requested one, so the lower bound keeps that arithmetic sane.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// A request that passed validation
#[derive(Debug)]
pub struct ValidatedMatch {
    pub athletes: Vec<AthleteRequest>,
    pub discipline: String,
    pub gender: Gender,
    pub temperature: Option<f32>,
}

/// Checks discipline, gender and athlete list, and truncates the list to
/// `max_athletes` keeping input order. Performs no I/O.
pub fn validate(request: MatchRequest, max_athletes: usize) -> Result<ValidatedMatch> {
    let athletes = request
        .athletes
        .ok_or_else(|| PipelineError::invalid("No athletes"))?;

    let discipline = request.discipline.unwrap_or_default();
    if !disciplines::is_known(&discipline) {
        return Err(PipelineError::invalid("Invalid discipline"));
    }

    let gender = request
        .gender
        .as_deref()
        .and_then(Gender::parse)
        .ok_or_else(|| PipelineError::invalid("Invalid gender"))?;

    if athletes.iter().any(|a| !YEAR_RANGE.contains(&a.year)) {
        return Err(PipelineError::invalid("Invalid year"));
    }

    Ok(ValidatedMatch {
        athletes: athletes
            .into_iter()
            .take(max_athletes)
            .map(AthleteRequest::from)
            .collect(),
        discipline,
        gender,
        temperature: request.temperature,
    })
}

/// Drives one `/match` request: resolve each athlete, build their result
/// window and text block, enrich with biographies while under the character
/// ceiling, assemble the prompt and ask the completion service.
pub struct MatchService {
    metadata: Arc<MetadataCache>,
    resolver: AthleteResolver,
    enricher: Enricher,
    llm: Arc<dyn CompletionClient>,
    settings: PipelineSettings,
}

impl MatchService {
    pub fn new(
        metadata: Arc<MetadataCache>,
        resolver: AthleteResolver,
        enricher: Enricher,
        llm: Arc<dyn CompletionClient>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            metadata,
            resolver,
            enricher,
            llm,
            settings,
        }
    }

    pub async fn predict(&self, request: MatchRequest) -> Result<String> {
        let mut validated = validate(request, self.settings.max_athletes)?;
        let prompt = self.build_prompt(&mut validated).await?;

        let temperature = validated
            .temperature
            .unwrap_or(self.settings.default_temperature);
        let narrative = self.llm.complete(&prompt, temperature).await?;

        if self.settings.persist_cache {
            if let Err(e) = self.resolver.cache().persist().await {
                warn!("Failed to persist athlete cache: {}", e);
            }
        }

        Ok(narrative)
    }

    /// Assembles the full prompt, filling in each athlete's name and
    /// secondary id along the way.
    pub async fn build_prompt(&self, event: &mut ValidatedMatch) -> Result<String> {
        let meta = self.metadata.current().await?;
        let context = EventContext::new(&event.discipline, event.gender);
        let athlete_count = event.athletes.len();

        let mut blocks: Vec<PromptBlock> = Vec::new();
        for (idx, athlete) in event.athletes.iter_mut().enumerate() {
            let Some(info) = self.resolver.basic_info(&meta, &athlete.id).await? else {
                info!("No competitor record for {}, skipping", athlete.id);
                continue;
            };
            athlete.secondary_id = info.secondary_id.clone();

            let results =
                window::build_window(&self.resolver, &meta, &athlete.id, athlete.year, athlete_count)
                    .await?;

            let name = prompt::full_name(&info);
            info!("{} ({}): {} performances", name, athlete.id, results.len());
            athlete.full_name = Some(name);

            blocks.push(PromptBlock {
                athlete_id: athlete.id.clone(),
                text: prompt::athlete_block(idx + 1, &info, athlete.year, &results, &context),
            });
        }

        // Only athletes that made it into a block are enriched, in block order.
        for block_idx in 0..blocks.len() {
            let total = prompt::total_chars(&blocks);
            let athlete_id = &blocks[block_idx].athlete_id;
            if !self.enricher.within_budget(total) {
                info!(
                    "Skipping biography for {}: {} chars already accumulated",
                    athlete_id, total
                );
                continue;
            }

            let Some(athlete) = event.athletes.iter().find(|a| &a.id == athlete_id) else {
                continue;
            };
            if let Some(extract) = self.enricher.biography(athlete).await? {
                let name = athlete.full_name.as_deref().unwrap_or(&athlete.id);
                blocks[block_idx]
                    .text
                    .push_str(&prompt::biography_section(name, &extract));
            }
        }

        let assembled = prompt::assemble(&context, &blocks);
        info!(
            "Assembled prompt for {} of {} athletes ({} chars)",
            blocks.len(),
            athlete_count,
            assembled.chars().count()
        );
        Ok(assembled)
    }
}
