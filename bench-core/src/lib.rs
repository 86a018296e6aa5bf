use chrono::{DateTime, NaiveDate};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

pub mod frontier;

pub use frontier::Frontier;

/// Ring/label color used when a company has no entry in `companyColors`.
pub const DEFAULT_COMPANY_COLOR: &str = "#666";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("invalid dataset json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate model id `{0}`")]
    DuplicateId(String),
}

/// Score for a single benchmark task. `rate` is `None` when the task was not run.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRate {
    pub name: String,
    pub rate: Option<f64>,
}

/// One benchmarked system.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub id: String,
    pub display_name: String,
    pub company: String,
    #[serde(rename = "type")]
    pub model_type: String,
    pub is_closed: bool,
    #[serde(deserialize_with = "de_release_date")]
    pub release_date: NaiveDate,
    /// Aggregate score in [0, 100]. Trusted as given, never recomputed from tasks.
    pub avg_success_rate: f64,
    /// Per-task scores in file order.
    #[serde(default, deserialize_with = "de_task_rates")]
    pub task_success_rates: Vec<TaskRate>,
}

impl ModelRecord {
    pub fn license_label(&self) -> &'static str {
        if self.is_closed {
            "Closed"
        } else {
            "Open"
        }
    }
}

/// The full benchmark document (`data/model_data.json`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub models: Vec<ModelRecord>,
    pub human_baseline: f64,
    #[serde(default)]
    pub company_colors: HashMap<String, String>,
    #[serde(default)]
    pub company_logos: HashMap<String, String>,
}

impl Dataset {
    pub fn from_json(text: &str) -> Result<Self, DatasetError> {
        let dataset: Dataset = serde_json::from_str(text)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DatasetError> {
        let dataset: Dataset = serde_json::from_slice(bytes)?;
        dataset.validate()?;
        Ok(dataset)
    }

    fn validate(&self) -> Result<(), DatasetError> {
        let mut seen = HashSet::with_capacity(self.models.len());
        for m in &self.models {
            if !seen.insert(m.id.as_str()) {
                return Err(DatasetError::DuplicateId(m.id.clone()));
            }
        }
        Ok(())
    }

    /// Company color, or [`DEFAULT_COMPANY_COLOR`].
    pub fn company_color(&self, company: &str) -> &str {
        self.color_or(company, DEFAULT_COMPANY_COLOR)
    }

    /// Company color with a caller-chosen fallback (charts differ in their default).
    pub fn color_or<'a>(&'a self, company: &str, fallback: &'a str) -> &'a str {
        self.company_colors
            .get(company)
            .map(String::as_str)
            .unwrap_or(fallback)
    }

    pub fn logo_for(&self, company: &str) -> Option<&str> {
        self.company_logos.get(company).map(String::as_str)
    }

    pub fn max_avg_success_rate(&self) -> Option<f64> {
        max_score(self.models.iter())
    }

    pub fn frontier(&self) -> Frontier<'_> {
        Frontier::compute(&self.models)
    }
}

/// Largest `avg_success_rate` among `models`, ignoring NaN.
pub fn max_score<'a, I>(models: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a ModelRecord>,
{
    models
        .into_iter()
        .map(|m| m.avg_success_rate)
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
}

/// Parse `YYYY-MM-DD`; a full RFC 3339 timestamp is accepted and truncated to its UTC date.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.naive_utc().date())
    })
}

fn de_release_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_release_date(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid release date `{raw}`")))
}

fn de_task_rates<'de, D>(deserializer: D) -> Result<Vec<TaskRate>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TaskRatesVisitor;

    impl<'de> Visitor<'de> for TaskRatesVisitor {
        type Value = Vec<TaskRate>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of task name to success rate")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, rate)) = map.next_entry::<String, Option<f64>>()? {
                out.push(TaskRate { name, rate });
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(TaskRatesVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
        "models": [
            {
                "id": "openai/gpt-5.2",
                "displayName": "GPT-5.2",
                "company": "OpenAI",
                "type": "Reasoning",
                "isClosed": true,
                "releaseDate": "2025-12-11",
                "avgSuccessRate": 31.4,
                "taskSuccessRates": { "stack": 40, "pour": null, "assemble": 12.5 }
            },
            {
                "id": "qwen/qwen3-235b",
                "displayName": "Qwen3-235B",
                "company": "Alibaba",
                "type": "Chat",
                "isClosed": false,
                "releaseDate": "2025-07-21T08:00:00Z",
                "avgSuccessRate": 18.0,
                "taskSuccessRates": null
            }
        ],
        "humanBaseline": 92.5,
        "companyColors": { "OpenAI": "#10a37f" },
        "companyLogos": { "OpenAI": "assets/logos/openai.svg" }
    }"##;

    #[test]
    fn parses_document_and_keeps_task_order() {
        let ds = Dataset::from_json(SAMPLE).unwrap();
        assert_eq!(ds.models.len(), 2);
        assert_eq!(ds.human_baseline, 92.5);

        let gpt = &ds.models[0];
        assert_eq!(gpt.model_type, "Reasoning");
        assert_eq!(gpt.release_date, NaiveDate::from_ymd_opt(2025, 12, 11).unwrap());
        let names: Vec<&str> = gpt
            .task_success_rates
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["stack", "pour", "assemble"]);
        assert_eq!(gpt.task_success_rates[1].rate, None);
        assert_eq!(gpt.task_success_rates[2].rate, Some(12.5));
    }

    #[test]
    fn timestamp_release_dates_and_null_tasks() {
        let ds = Dataset::from_json(SAMPLE).unwrap();
        let qwen = &ds.models[1];
        assert_eq!(qwen.release_date, NaiveDate::from_ymd_opt(2025, 7, 21).unwrap());
        assert!(qwen.task_success_rates.is_empty());
        assert_eq!(qwen.license_label(), "Open");
    }

    #[test]
    fn colors_fall_back_per_caller() {
        let ds = Dataset::from_json(SAMPLE).unwrap();
        assert_eq!(ds.company_color("OpenAI"), "#10a37f");
        assert_eq!(ds.company_color("Alibaba"), DEFAULT_COMPANY_COLOR);
        assert_eq!(ds.color_or("Alibaba", "#76b900"), "#76b900");
        assert_eq!(ds.logo_for("Alibaba"), None);
        assert_eq!(ds.max_avg_success_rate(), Some(31.4));
    }

    #[test]
    fn optional_maps_may_be_missing() {
        let ds = Dataset::from_json(r#"{ "models": [], "humanBaseline": 90 }"#).unwrap();
        assert!(ds.company_colors.is_empty());
        assert!(ds.company_logos.is_empty());
        assert_eq!(ds.max_avg_success_rate(), None);
    }

    #[test]
    fn rejects_bad_dates_and_malformed_json() {
        let bad_date = SAMPLE.replace("2025-12-11", "December 2025");
        assert!(matches!(
            Dataset::from_json(&bad_date),
            Err(DatasetError::Json(_))
        ));
        assert!(Dataset::from_json("{ not json").is_err());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let dup = SAMPLE.replace("qwen/qwen3-235b", "openai/gpt-5.2");
        match Dataset::from_json(&dup) {
            Err(DatasetError::DuplicateId(id)) => assert_eq!(id, "openai/gpt-5.2"),
            other => panic!("expected duplicate id error, got {other:?}"),
        }
    }
}
