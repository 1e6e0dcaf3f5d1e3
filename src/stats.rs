//! Statistics provider (GraphQL) client.
//!
//! Response shapes are loosely typed upstream; everything is converted into
//! [`BasicInfo`] / [`YearResults`] here so nothing past this module sees the
//! wire format.

use crate::error::Result;
use crate::fetcher::RetryingFetcher;
use crate::metadata::ApiMetadata;
use crate::models::{parse_provider_date, scalar_to_string, BasicInfo, PerformanceRecord, YearResults};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// `Ok(None)` when the provider has no competitor record for `id`
    async fn basic_info(&self, meta: &ApiMetadata, id: &str) -> Result<Option<BasicInfo>>;

    /// `Ok(None)` when the provider has no results record for that year
    async fn year_results(&self, meta: &ApiMetadata, id: &str, year: i32) -> Result<Option<YearResults>>;
}

const BASIC_INFO_QUERY: &str = r#"
query GetCompetitorBasicInfo($id: Int, $urlSlug: String) {
  competitor: getSingleCompetitor(id: $id, urlSlug: $urlSlug) {
    basicData {
      givenName familyName birthDate iaafId aaId countryCode
    }
  }
}"#;

const RESULTS_BY_DATE_QUERY: &str = r#"
query GetSingleCompetitorResultsDate($id: Int, $resultsByYearOrderBy: String, $resultsByYear: Int) {
  getSingleCompetitorResultsDate(id: $id, resultsByYear: $resultsByYear, resultsByYearOrderBy: $resultsByYearOrderBy) {
    activeYears
    resultsByDate {
      date competition venue indoor discipline place mark wind notLegal
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct BasicInfoData {
    competitor: Option<CompetitorWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompetitorWire {
    basic_data: Option<BasicDataWire>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct BasicDataWire {
    given_name: Option<String>,
    family_name: Option<String>,
    birth_date: Option<String>,
    iaaf_id: Value,
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultsData {
    #[serde(rename = "getSingleCompetitorResultsDate")]
    results: Option<ResultsWire>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ResultsWire {
    active_years: Vec<Value>,
    results_by_date: Vec<ResultWire>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ResultWire {
    date: Option<String>,
    venue: Option<String>,
    indoor: Option<bool>,
    discipline: Option<String>,
    place: Value,
    mark: Value,
    wind: Value,
    not_legal: Option<bool>,
}

impl From<BasicDataWire> for BasicInfo {
    fn from(wire: BasicDataWire) -> Self {
        Self {
            given_name: wire.given_name.unwrap_or_default(),
            family_name: wire.family_name.unwrap_or_default(),
            birth_date: wire.birth_date.as_deref().and_then(parse_provider_date),
            country_code: wire.country_code.unwrap_or_default(),
            secondary_id: scalar_to_string(&wire.iaaf_id),
        }
    }
}

impl From<ResultWire> for PerformanceRecord {
    fn from(wire: ResultWire) -> Self {
        Self {
            date: wire.date.unwrap_or_default(),
            discipline: wire.discipline.unwrap_or_default(),
            indoor: wire.indoor.unwrap_or(false),
            venue: wire.venue.unwrap_or_default(),
            place: scalar_to_string(&wire.place),
            mark: scalar_to_string(&wire.mark).unwrap_or_default(),
            wind: scalar_to_string(&wire.wind),
            not_legal: wire.not_legal.unwrap_or(false),
        }
    }
}

impl From<ResultsWire> for YearResults {
    fn from(wire: ResultsWire) -> Self {
        Self {
            active_years: wire
                .active_years
                .iter()
                .filter_map(|y| scalar_to_string(y)?.parse().ok())
                .collect(),
            results_by_date: wire.results_by_date.into_iter().map(Into::into).collect(),
        }
    }
}

/// Numeric ids go over the wire as GraphQL `Int`s
fn id_variable(id: &str) -> Value {
    id.parse::<i64>().map(Value::from).unwrap_or_else(|_| json!(id))
}

pub struct GraphQlStats {
    fetcher: Arc<RetryingFetcher>,
}

impl GraphQlStats {
    pub fn new(fetcher: Arc<RetryingFetcher>) -> Self {
        Self { fetcher }
    }

    async fn query<T>(&self, meta: &ApiMetadata, operation: &str, query: &str, variables: Value) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = json!({
            "operationName": operation,
            "query": query,
            "variables": variables,
        });
        let response: GraphQlResponse<T> = self
            .fetcher
            .post_json(&meta.endpoint, &[("x-api-key", meta.api_key.as_str())], &body)
            .await?;
        Ok(response.data)
    }
}

#[async_trait]
impl StatsProvider for GraphQlStats {
    async fn basic_info(&self, meta: &ApiMetadata, id: &str) -> Result<Option<BasicInfo>> {
        debug!("Fetching basic info for {}", id);
        let data: Option<BasicInfoData> = self
            .query(meta, "GetCompetitorBasicInfo", BASIC_INFO_QUERY, json!({ "id": id_variable(id) }))
            .await?;

        Ok(data
            .and_then(|d| d.competitor)
            .and_then(|c| c.basic_data)
            .map(BasicInfo::from))
    }

    async fn year_results(&self, meta: &ApiMetadata, id: &str, year: i32) -> Result<Option<YearResults>> {
        debug!("Fetching {} results for {}", year, id);
        let data: Option<ResultsData> = self
            .query(
                meta,
                "GetSingleCompetitorResultsDate",
                RESULTS_BY_DATE_QUERY,
                json!({
                    "id": id_variable(id),
                    "resultsByYear": year,
                    "resultsByYearOrderBy": "date",
                }),
            )
            .await?;

        Ok(data.and_then(|d| d.results).map(YearResults::from))
    }
}
