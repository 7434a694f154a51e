//! REST Countries v3.1
//!
//! `GET /alpha/{alpha2}` answers with an array holding one country object
//! (older deployments answer with the bare object). Values are a current
//! snapshot, so resolved metrics carry no year.

use async_trait::async_trait;
use country_codes::{to_provider_code, Provider};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{get_json, HttpSettings, MetricProvider};
use crate::observation::{Provenance, ResolvedMetric};
use crate::{MetricsError, Result};

pub const REST_COUNTRIES_BASE_URL: &str = "https://restcountries.com/v3.1";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AlphaResponse {
    Many(Vec<RawCountry>),
    One(Box<RawCountry>),
}

#[derive(Debug, Deserialize)]
struct RawName {
    common: String,
    #[serde(default)]
    official: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCountry {
    name: RawName,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    subregion: Option<String>,
    #[serde(default)]
    population: Option<f64>,
    #[serde(default)]
    area: Option<f64>,
    #[serde(default)]
    languages: BTreeMap<String, String>,
}

/// Descriptive snapshot of one country
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryProfile {
    pub code: String,
    pub name: String,
    pub official_name: Option<String>,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub population: Option<f64>,
    pub area: Option<f64>,
    pub languages: Vec<String>,
    pub source: String,
    pub source_organization: String,
}

pub struct RestCountriesClient {
    client: Client,
    settings: HttpSettings,
}

impl RestCountriesClient {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        Ok(Self {
            client: settings.build_client(Provider::RestCountries)?,
            settings,
        })
    }

    pub fn public() -> Result<Self> {
        Self::new(HttpSettings::new(REST_COUNTRIES_BASE_URL))
    }

    pub async fn fetch_profile(&self, country: &str) -> Result<CountryProfile> {
        let alpha2 = to_provider_code(country, Provider::RestCountries)?;
        let url = format!("{}/alpha/{}", self.settings.base_url, alpha2);

        let raw = match get_json::<AlphaResponse>(&self.client, &url, Provider::RestCountries).await? {
            AlphaResponse::Many(list) => list
                .into_iter()
                .next()
                .ok_or_else(|| MetricsError::parse(Provider::RestCountries, "empty country list"))?,
            AlphaResponse::One(one) => *one,
        };

        let provenance = self.provenance();
        Ok(CountryProfile {
            code: alpha2.to_string(),
            name: raw.name.common,
            official_name: raw.name.official,
            capital: raw.capital.into_iter().next(),
            region: raw.region,
            subregion: raw.subregion,
            population: raw.population,
            area: raw.area,
            languages: raw.languages.into_values().collect(),
            source: provenance.source,
            source_organization: provenance.organization,
        })
    }
}

#[async_trait]
impl MetricProvider for RestCountriesClient {
    fn provider(&self) -> Provider {
        Provider::RestCountries
    }

    fn provenance(&self) -> Provenance {
        Provenance::new("REST Countries", "restcountries.com")
    }

    async fn fetch_metric(&self, country: &str, metric: &str) -> Result<ResolvedMetric> {
        let metric = metric.trim();
        let unit = match metric {
            "population" => "people",
            "area" => "sq km",
            other => {
                return Err(MetricsError::BadRequest(format!("unknown rest-countries metric: {}", other)));
            }
        };

        let profile = self.fetch_profile(country).await?;
        let value = if metric == "area" { profile.area } else { profile.population };
        Ok(ResolvedMetric::from_parts(value, None, &self.provenance(), Some(unit.to_string())))
    }
}
