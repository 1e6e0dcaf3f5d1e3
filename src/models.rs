use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// One athlete entry of a `/match` request
#[derive(Debug, Deserialize, Clone)]
pub struct AthleteEntry {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_year")]
    pub year: i32,
}

/// `/match` request body. Every field is optional so that validation can
/// answer with a readable message instead of a serde rejection.
#[derive(Debug, Deserialize, Default)]
pub struct MatchRequest {
    pub athletes: Option<Vec<AthleteEntry>>,
    pub discipline: Option<String>,
    pub gender: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchResponse {
    pub response: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Men" => Some(Self::Men),
            "Women" => Some(Self::Women),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Men => write!(f, "Men"),
            Self::Women => write!(f, "Women"),
        }
    }
}

/// An athlete as it moves through the pipeline. `full_name` and
/// `secondary_id` are filled in once basic info has been resolved.
#[derive(Debug, Clone)]
pub struct AthleteRequest {
    pub id: String,
    pub year: i32,
    pub full_name: Option<String>,
    pub secondary_id: Option<String>,
}

impl From<AthleteEntry> for AthleteRequest {
    fn from(entry: AthleteEntry) -> Self {
        Self {
            id: entry.id,
            year: entry.year,
            full_name: None,
            secondary_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub given_name: String,
    pub family_name: String,
    pub birth_date: Option<NaiveDate>,
    pub country_code: String,
    pub secondary_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Provider date string, rendered verbatim
    pub date: String,
    pub discipline: String,
    pub indoor: bool,
    pub venue: String,
    pub place: Option<String>,
    pub mark: String,
    pub wind: Option<String>,
    pub not_legal: bool,
}

impl PerformanceRecord {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_provider_date(&self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YearResults {
    pub active_years: Vec<i32>,
    pub results_by_date: Vec<PerformanceRecord>,
}

impl YearResults {
    /// Stand-in for a year the provider has no record of. Lists the two
    /// preceding years as active so the window builder still probes them.
    pub fn synthesized(year: i32) -> Self {
        Self {
            active_years: vec![year - 1, year - 2],
            results_by_date: Vec::new(),
        }
    }
}

/// Parses provider dates: `"05 JUL 2023"`, `"5 Jul 2023"` or ISO `"2023-07-05"`.
pub fn parse_provider_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d %b %Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d %B %Y"))
        .ok()
}

/// Renders a JSON scalar as a string; `null`, empty strings and
/// non-scalars become `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(&value).ok_or_else(|| serde::de::Error::custom("athlete id must be a string or number"))
}

fn de_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| serde::de::Error::custom("year must be an integer or numeric string"))
}
