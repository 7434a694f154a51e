//! Our World in Data indicator API
//!
//! Each indicator is two documents fetched in parallel:
//! - `{variable}.data.json`: index-aligned `entities[]`, `years[]`, `values[]`
//! - `{variable}.metadata.json`: `dimensions.entities.values[]` of `{id, name, code}`
//!
//! Rows are joined on the numeric entity id resolved from the country name.

use async_trait::async_trait;
use country_codes::{to_provider_code, Provider};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{get_json, validate_identifier, HttpSettings, MetricProvider};
use crate::observation::{MetricSeries, Provenance, ResolvedMetric};
use crate::resolver::{resolve_latest, DimensionFilter};
use crate::{MetricsError, Result};

pub const OWID_BASE_URL: &str = "https://api.ourworldindata.org/v1/indicators";

#[derive(Debug, Deserialize)]
struct OwidData {
    entities: Vec<i64>,
    years: Vec<i32>,
    values: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct OwidMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default, rename = "shortUnit")]
    short_unit: Option<String>,
    dimensions: OwidDimensions,
}

#[derive(Debug, Deserialize)]
struct OwidDimensions {
    entities: OwidEntityDimension,
}

#[derive(Debug, Deserialize)]
struct OwidEntityDimension {
    values: Vec<OwidEntity>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OwidEntity {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

fn words(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Case-insensitive exact name match, then the wanted name as a whole-word
/// run inside a longer entity name ("Congo" in "Democratic Republic of
/// Congo", never "Niger" in "Nigeria"). The first entity in metadata order
/// wins a tie.
pub fn match_entity<'a>(entities: &'a [OwidEntity], name: &str) -> Option<&'a OwidEntity> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    if let Some(exact) = entities.iter().find(|e| e.name.to_lowercase() == wanted) {
        return Some(exact);
    }

    let wanted_words = words(&wanted);
    if wanted_words.is_empty() {
        return None;
    }
    let partial = entities.iter().find(|e| {
        words(&e.name)
            .windows(wanted_words.len())
            .any(|run| run == wanted_words.as_slice())
    })?;
    debug!(wanted = %name.trim(), entity = %partial.name, "OWID entity matched on partial name");
    Some(partial)
}

pub struct OwidClient {
    client: Client,
    settings: HttpSettings,
}

impl OwidClient {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        Ok(Self {
            client: settings.build_client(Provider::Owid)?,
            settings,
        })
    }

    pub fn public() -> Result<Self> {
        Self::new(HttpSettings::new(OWID_BASE_URL))
    }

    fn provenance_for(name: Option<&str>) -> Provenance {
        match name {
            Some(n) => Provenance::new(format!("Our World in Data: {}", n), "Global Change Data Lab"),
            None => Provenance::new("Our World in Data", "Global Change Data Lab"),
        }
    }

    async fn fetch_documents(&self, variable: &str) -> Result<(OwidData, OwidMetadata)> {
        let data_url = format!("{}/{}.data.json", self.settings.base_url, variable);
        let meta_url = format!("{}/{}.metadata.json", self.settings.base_url, variable);

        tokio::try_join!(
            get_json::<OwidData>(&self.client, &data_url, Provider::Owid),
            get_json::<OwidMetadata>(&self.client, &meta_url, Provider::Owid),
        )
    }

    /// Series for the entity whose name matches the country's OWID name.
    /// `None` when the indicator does not cover that entity.
    async fn fetch_series(&self, country: &str, variable: &str) -> Result<(Option<MetricSeries>, OwidMetadata)> {
        let entity_name = to_provider_code(country, Provider::Owid)?;
        let variable = validate_identifier("variable", variable)?;
        let (data, meta) = self.fetch_documents(&variable).await?;

        if data.entities.len() != data.years.len() || data.years.len() != data.values.len() {
            return Err(MetricsError::parse(
                Provider::Owid,
                format!(
                    "misaligned arrays: {} entities, {} years, {} values",
                    data.entities.len(),
                    data.years.len(),
                    data.values.len()
                ),
            ));
        }

        let Some(entity) = match_entity(&meta.dimensions.entities.values, entity_name) else {
            debug!(variable = %variable, entity = entity_name, "entity not covered");
            return Ok((None, meta));
        };
        let entity_id = entity.id;

        let points = data
            .entities
            .iter()
            .zip(data.years.iter())
            .zip(data.values.iter())
            .filter(|((id, _), _)| **id == entity_id)
            .map(|((_, year), value)| (*year, value.as_f64()));

        let series = MetricSeries::from_points(variable.as_str(), country.trim().to_ascii_uppercase(), points);
        Ok((Some(series), meta))
    }
}

#[async_trait]
impl MetricProvider for OwidClient {
    fn provider(&self) -> Provider {
        Provider::Owid
    }

    fn provenance(&self) -> Provenance {
        Self::provenance_for(None)
    }

    async fn fetch_metric(&self, country: &str, variable: &str) -> Result<ResolvedMetric> {
        let (series, meta) = self.fetch_series(country, variable).await?;
        let provenance = Self::provenance_for(meta.name.as_deref());
        let unit = meta.short_unit.or(meta.unit).filter(|u| !u.is_empty());

        Ok(match series {
            Some(series) => {
                let mut resolved = resolve_latest(&series, &DimensionFilter::any(), &provenance);
                resolved.unit = unit;
                resolved
            }
            None => ResolvedMetric::unavailable(&provenance, unit).with_note("country not covered by this indicator"),
        })
    }
}
