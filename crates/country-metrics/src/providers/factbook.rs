//! CIA World Factbook (factbook.json mirror)
//!
//! `GET {base}/{region}/{gec}.json` returns a nested document keyed by
//! section name ("People and Society", "Economy", "Geography", ...). Leaves
//! are either plain strings or `{ "text": ... }` objects holding free text
//! such as `"$25.46 trillion (2022 est.)"`.

use async_trait::async_trait;
use country_codes::{factbook_location, FactbookLocation, Provider};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::{get_json, HttpSettings, MetricProvider};
use crate::format::{is_percentage, parse_factbook_number};
use crate::observation::{Provenance, ResolvedMetric};
use crate::{MetricsError, Result};

pub const FACTBOOK_BASE_URL: &str = "https://github.com/factbook/factbook.json/raw/master";

/// Share of the population assumed male when no breakdown is published
pub const DEFAULT_MALE_SHARE: f64 = 0.51;

static ESTIMATE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((?:[A-Za-z]+ )?(\d{4})(?: est\.)?\)").expect("static regex"));

static AGE_BRACKET_SHARES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bmale:?\s*([\d.]+)%[^%]*?\bfemale:?\s*([\d.]+)%").expect("static regex")
});

/// A Factbook field and where it has lived across document revisions
struct FactbookField {
    id: &'static str,
    paths: &'static [&'static [&'static str]],
    unit: Option<&'static str>,
}

const FIELDS: &[FactbookField] = &[
    FactbookField {
        id: "population",
        paths: &[
            &["People and Society", "Population", "total"],
            &["People and Society", "Population"],
        ],
        unit: Some("people"),
    },
    FactbookField {
        id: "area",
        paths: &[&["Geography", "Area", "total"], &["Geography", "Area", "total "]],
        unit: Some("sq km"),
    },
    FactbookField {
        id: "gdp_ppp",
        paths: &[
            &["Economy", "Real GDP (purchasing power parity)"],
            &["Economy", "GDP (purchasing power parity)"],
        ],
        unit: Some("US$"),
    },
    FactbookField {
        id: "gdp_growth",
        paths: &[
            &["Economy", "Real GDP growth rate"],
            &["Economy", "GDP - real growth rate"],
        ],
        unit: Some("%"),
    },
    FactbookField {
        id: "unemployment",
        paths: &[&["Economy", "Unemployment rate"]],
        unit: Some("%"),
    },
    FactbookField {
        id: "inflation",
        paths: &[
            &["Economy", "Inflation rate (consumer prices)"],
            &["Economy", "Inflation rate"],
        ],
        unit: Some("%"),
    },
    FactbookField {
        id: "median_age",
        paths: &[&["People and Society", "Median age", "total"]],
        unit: Some("years"),
    },
    FactbookField {
        id: "life_expectancy",
        paths: &[&["People and Society", "Life expectancy at birth", "total population"]],
        unit: Some("years"),
    },
    FactbookField {
        id: "urban_population",
        paths: &[&["People and Society", "Urbanization", "urban population"]],
        unit: Some("%"),
    },
];

pub fn supported_metrics() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.id)
}

/// Year from an "(2023 est.)" style fragment
pub fn extract_year(text: &str) -> Option<i32> {
    ESTIMATE_YEAR
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Text of a leaf. Objects without `text` are per-year groups such as
/// `{"Real GDP ... 2023": {...}, "Real GDP ... 2022": {...}, "note": ...}`;
/// the child with the most recent estimate year wins.
pub fn leaf_text(node: &Value) -> Option<&str> {
    match node {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                return Some(text.as_str());
            }
            map.iter()
                .filter(|(k, _)| k.as_str() != "note")
                .filter_map(|(_, v)| match v {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(o) => o.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .max_by_key(|t| extract_year(t).unwrap_or(i32::MIN))
        }
        _ => None,
    }
}

fn lookup<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |node, key| node.get(*key))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMethod {
    /// Published male/female totals
    Explicit,
    /// Averaged from per-bracket "male: X%, female: Y%" age-structure text
    AgeStructure,
    /// Fixed 51/49 approximation
    Default,
}

/// Estimated population by sex. Not authoritative demographic data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderSplit {
    pub total: f64,
    pub male: f64,
    pub female: f64,
    pub method: SplitMethod,
    pub year: Option<i32>,
    pub source: String,
    pub source_organization: String,
}

/// Male share from age-structure brackets: each bracket's male and female
/// percentages are averaged separately, then normalized.
pub fn age_structure_male_share<'a, I>(bracket_texts: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut male_sum = 0.0;
    let mut female_sum = 0.0;
    let mut brackets = 0usize;

    for text in bracket_texts {
        let Some(caps) = AGE_BRACKET_SHARES.captures(text) else {
            continue;
        };
        let male: Option<f64> = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let female: Option<f64> = caps.get(2).and_then(|m| m.as_str().parse().ok());
        if let (Some(m), Some(f)) = (male, female) {
            male_sum += m;
            female_sum += f;
            brackets += 1;
        }
    }

    if brackets == 0 {
        return None;
    }
    let (male_avg, female_avg) = (male_sum / brackets as f64, female_sum / brackets as f64);
    if male_avg + female_avg <= 0.0 {
        return None;
    }
    Some(male_avg / (male_avg + female_avg))
}

/// Estimation rule: explicit totals, else age-structure shares, else 51/49
pub fn estimate_gender_split(
    total: f64,
    explicit: Option<(f64, f64)>,
    age_brackets: &[&str],
) -> (f64, f64, SplitMethod) {
    if let Some((male, female)) = explicit {
        return (male, female, SplitMethod::Explicit);
    }
    match age_structure_male_share(age_brackets.iter().copied()) {
        Some(share) => {
            let male = (total * share).round();
            (male, total - male, SplitMethod::AgeStructure)
        }
        None => {
            let male = (total * DEFAULT_MALE_SHARE).round();
            (male, total - male, SplitMethod::Default)
        }
    }
}

pub struct FactbookClient {
    client: Client,
    settings: HttpSettings,
}

impl FactbookClient {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        Ok(Self {
            client: settings.build_client(Provider::Factbook)?,
            settings,
        })
    }

    pub fn public() -> Result<Self> {
        Self::new(HttpSettings::new(FACTBOOK_BASE_URL))
    }

    pub async fn fetch_raw(&self, location: &FactbookLocation) -> Result<Value> {
        let url = format!("{}/{}", self.settings.base_url, location.path());
        let doc: Value = get_json(&self.client, &url, Provider::Factbook).await?;
        if !doc.is_object() {
            return Err(MetricsError::parse(Provider::Factbook, "expected a JSON object"));
        }
        Ok(doc)
    }

    async fn document(&self, country: &str) -> Result<Value> {
        let location = factbook_location(country)?;
        self.fetch_raw(&location).await
    }

    /// Extract one catalogued field from an already fetched document
    pub fn extract_metric(&self, doc: &Value, metric: &str) -> Result<ResolvedMetric> {
        let field = FIELDS
            .iter()
            .find(|f| f.id == metric.trim())
            .ok_or_else(|| MetricsError::BadRequest(format!("unknown factbook metric: {}", metric)))?;

        let text = field
            .paths
            .iter()
            .filter_map(|path| lookup(doc, path))
            .find_map(leaf_text);

        let provenance = self.provenance();
        let Some(text) = text else {
            return Ok(ResolvedMetric::unavailable(&provenance, field.unit.map(str::to_string)));
        };

        let unit = if is_percentage(text) {
            Some("%".to_string())
        } else {
            field.unit.map(str::to_string)
        };
        Ok(ResolvedMetric::from_parts(
            parse_factbook_number(text),
            extract_year(text),
            &provenance,
            unit,
        ))
    }

    pub fn extract_gender_split(&self, doc: &Value) -> Result<GenderSplit> {
        let population = self.extract_metric(doc, "population")?;
        let total = population
            .value
            .ok_or_else(|| MetricsError::parse(Provider::Factbook, "population total missing"))?;

        let explicit = {
            let male = lookup(doc, &["People and Society", "Population", "male"])
                .and_then(leaf_text)
                .and_then(parse_factbook_number);
            let female = lookup(doc, &["People and Society", "Population", "female"])
                .and_then(leaf_text)
                .and_then(parse_factbook_number);
            male.zip(female)
        };

        let brackets: Vec<&str> = lookup(doc, &["People and Society", "Age structure"])
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter(|(k, _)| k.as_str() != "note")
                    .filter_map(|(_, v)| leaf_text(v))
                    .collect()
            })
            .unwrap_or_default();

        let (male, female, method) = estimate_gender_split(total, explicit, &brackets);
        Ok(GenderSplit {
            total,
            male,
            female,
            method,
            year: population.year,
            source: population.source,
            source_organization: population.source_organization,
        })
    }

    pub async fn gender_split(&self, country: &str) -> Result<GenderSplit> {
        let doc = self.document(country).await?;
        self.extract_gender_split(&doc)
    }
}

#[async_trait]
impl MetricProvider for FactbookClient {
    fn provider(&self) -> Provider {
        Provider::Factbook
    }

    fn provenance(&self) -> Provenance {
        Provenance::new("CIA World Factbook", "Central Intelligence Agency")
    }

    async fn fetch_metric(&self, country: &str, metric: &str) -> Result<ResolvedMetric> {
        if !FIELDS.iter().any(|f| f.id == metric.trim()) {
            return Err(MetricsError::BadRequest(format!("unknown factbook metric: {}", metric)));
        }
        let doc = self.document(country).await?;
        self.extract_metric(&doc, metric)
    }
}
