//! World Bank Indicators API
//!
//! `GET /country/{iso3}/indicator/{indicator}?format=json&per_page=N&date=Y1:Y2`
//!
//! The body is a two-element array `[metadata, observations]`. When the
//! request is rejected the API still answers 200 with `[{"message": [...]}]`,
//! which is reported as a parse failure.

use async_trait::async_trait;
use chrono::Datelike;
use country_codes::{to_provider_code, Provider};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{get_json, validate_identifier, HttpSettings, MetricProvider};
use crate::observation::{MetricSeries, Provenance, ResolvedMetric};
use crate::ranking::{dedupe_by_country, RankEntry};
use crate::resolver::{resolve_latest, DimensionFilter};
use crate::{MetricsError, Result};

pub const WORLD_BANK_BASE_URL: &str = "https://api.worldbank.org/v2";

/// Years of history requested for a single country
const HISTORY_YEARS: i32 = 30;
/// Years of history requested for cross-country rankings
const RANKING_YEARS: i32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct WorldBankObservation {
    pub value: Option<f64>,
    pub date: String,
    pub country: WorldBankCountry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldBankCountry {
    pub id: String,
    pub value: String,
}

impl WorldBankObservation {
    /// Annual series use "2021"; anything else keeps the leading year
    pub fn year(&self) -> Option<i32> {
        self.date.get(..4)?.parse().ok()
    }
}

/// Units for the indicators the UI asks for most
pub fn indicator_unit(indicator: &str) -> Option<&'static str> {
    match indicator {
        "NY.GDP.MKTP.CD" | "NY.GDP.PCAP.CD" => Some("current US$"),
        "NY.GDP.MKTP.KD.ZG" | "FP.CPI.TOTL.ZG" => Some("annual %"),
        "SP.POP.TOTL" => Some("people"),
        "SP.URB.TOTL.IN.ZS" | "SP.RUR.TOTL.ZS" => Some("% of total population"),
        "SL.UEM.TOTL.ZS" => Some("% of total labor force"),
        "SP.DYN.LE00.IN" => Some("years"),
        "EN.ATM.CO2E.PC" => Some("metric tons per capita"),
        "AG.LND.FRST.ZS" => Some("% of land area"),
        _ => None,
    }
}

pub struct WorldBankClient {
    client: Client,
    settings: HttpSettings,
    per_page: u32,
}

impl WorldBankClient {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        Ok(Self {
            client: settings.build_client(Provider::WorldBank)?,
            settings,
            per_page: 100,
        })
    }

    pub fn public() -> Result<Self> {
        Self::new(HttpSettings::new(WORLD_BANK_BASE_URL))
    }

    fn date_range(years: i32) -> String {
        let current = chrono::Utc::now().year();
        format!("{}:{}", current - years, current)
    }

    fn parse_body(body: Value) -> Result<Vec<WorldBankObservation>> {
        let parts = body
            .as_array()
            .ok_or_else(|| MetricsError::parse(Provider::WorldBank, "expected a JSON array"))?;

        match parts.get(1) {
            Some(Value::Array(_)) => serde_json::from_value(parts[1].clone())
                .map_err(|e| MetricsError::parse(Provider::WorldBank, e.to_string())),
            // A valid query with no rows returns `[meta, null]`
            Some(Value::Null) => Ok(Vec::new()),
            _ => {
                let message = parts
                    .first()
                    .and_then(|m| m.get("message"))
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "missing observations array".to_string());
                Err(MetricsError::parse(Provider::WorldBank, message))
            }
        }
    }

    /// One GET for one indicator and one ISO-3 country code
    pub async fn fetch_raw(&self, code3: &str, indicator: &str) -> Result<Vec<WorldBankObservation>> {
        let indicator = validate_identifier("indicator", indicator)?;
        let url = format!(
            "{}/country/{}/indicator/{}?format=json&per_page={}&date={}",
            self.settings.base_url,
            code3,
            indicator,
            self.per_page,
            Self::date_range(HISTORY_YEARS)
        );
        let body: Value = get_json(&self.client, &url, Provider::WorldBank).await?;
        Self::parse_body(body)
    }

    pub async fn fetch_series(&self, country: &str, indicator: &str) -> Result<MetricSeries> {
        let code3 = to_provider_code(country, Provider::WorldBank)?;
        let rows = self.fetch_raw(code3, indicator).await?;
        Ok(MetricSeries::from_points(
            indicator.trim(),
            country.trim().to_ascii_uppercase(),
            rows.iter().filter_map(|r| Some((r.year()?, r.value))),
        ))
    }

    /// Latest value for every known country; regional aggregates are dropped
    pub async fn fetch_all_countries(&self, indicator: &str) -> Result<Vec<RankEntry>> {
        let indicator = validate_identifier("indicator", indicator)?;
        let url = format!(
            "{}/country/all/indicator/{}?format=json&per_page=20000&date={}",
            self.settings.base_url,
            indicator,
            Self::date_range(RANKING_YEARS)
        );
        let body: Value = get_json(&self.client, &url, Provider::WorldBank).await?;
        let rows = Self::parse_body(body)?;
        let total = rows.len();

        let entries: Vec<RankEntry> = rows
            .into_iter()
            .filter_map(|r| {
                let record = country_codes::country(&r.country.id)?;
                Some(RankEntry::new(record.alpha2, record.name, r.value?, r.year()?))
            })
            .collect();

        let deduped = dedupe_by_country(entries);
        info!(indicator = %indicator, rows = total, countries = deduped.len(), "ranking rows collapsed");
        Ok(deduped)
    }
}

#[async_trait]
impl MetricProvider for WorldBankClient {
    fn provider(&self) -> Provider {
        Provider::WorldBank
    }

    fn provenance(&self) -> Provenance {
        Provenance::new("World Development Indicators", "World Bank")
    }

    async fn fetch_metric(&self, country: &str, indicator: &str) -> Result<ResolvedMetric> {
        let series = self.fetch_series(country, indicator).await?;
        let mut resolved = resolve_latest(&series, &DimensionFilter::any(), &self.provenance());
        resolved.unit = indicator_unit(indicator.trim()).map(str::to_string);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const GDP_BODY: &str = r#"[
        {"page":1,"pages":1,"per_page":100,"total":3},
        [
            {"indicator":{"id":"NY.GDP.MKTP.CD","value":"GDP (current US$)"},"country":{"id":"DE","value":"Germany"},"countryiso3code":"DEU","date":"2023","value":null,"unit":"","obs_status":"","decimal":0},
            {"indicator":{"id":"NY.GDP.MKTP.CD","value":"GDP (current US$)"},"country":{"id":"DE","value":"Germany"},"countryiso3code":"DEU","date":"2022","value":4082469490000.0,"unit":"","obs_status":"","decimal":0},
            {"indicator":{"id":"NY.GDP.MKTP.CD","value":"GDP (current US$)"},"country":{"id":"DE","value":"Germany"},"countryiso3code":"DEU","date":"2021","value":4278503700000.0,"unit":"","obs_status":"","decimal":0}
        ]
    ]"#;

    fn client_for(server: &mockito::ServerGuard) -> WorldBankClient {
        WorldBankClient::new(HttpSettings::new(server.url())).unwrap()
    }

    #[tokio::test]
    async fn test_latest_non_null_value() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/country/DEU/indicator/NY.GDP.MKTP.CD")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("per_page".into(), "100".into()),
            ]))
            .with_status(200)
            .with_body(GDP_BODY)
            .create_async()
            .await;

        let metric = client_for(&server).fetch_metric("de", "NY.GDP.MKTP.CD").await.unwrap();
        assert_eq!(metric.value, Some(4082469490000.0));
        assert_eq!(metric.year, Some(2022));
        assert_eq!(metric.unit.as_deref(), Some("current US$"));
        assert_eq!(metric.source_organization, "World Bank");
    }

    #[tokio::test]
    async fn test_error_message_body_is_parse_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/country/DEU/indicator/BAD.CODE")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"message":[{"id":"120","key":"Invalid value","value":"The provided parameter value is not valid"}]}]"#)
            .create_async()
            .await;

        let err = client_for(&server).fetch_metric("DE", "BAD.CODE").await.unwrap_err();
        assert!(matches!(err, MetricsError::ParseFailure { .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let err = client_for(&server).fetch_metric("DE", "SP.POP.TOTL").await.unwrap_err();
        assert!(matches!(err, MetricsError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_unmapped_country_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

        let err = client_for(&server).fetch_metric("TW", "SP.POP.TOTL").await.unwrap_err();
        assert!(matches!(err, MetricsError::UnsupportedCountry { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_result_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"page":0,"pages":0,"per_page":100,"total":0},null]"#)
            .create_async()
            .await;

        let metric = client_for(&server).fetch_metric("FR", "SP.POP.TOTL").await.unwrap();
        assert_eq!(metric.value, None);
        assert_eq!(metric.year, None);
    }

    #[tokio::test]
    async fn test_all_countries_drops_aggregates_and_dedupes() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/country/all/indicator/SP.URB.TOTL.IN.ZS")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"[{"page":1},[
                    {"country":{"id":"1W","value":"World"},"date":"2022","value":56.9},
                    {"country":{"id":"JP","value":"Japan"},"date":"2022","value":92.0},
                    {"country":{"id":"JP","value":"Japan"},"date":"2021","value":91.9},
                    {"country":{"id":"IN","value":"India"},"date":"2022","value":35.9},
                    {"country":{"id":"IN","value":"India"},"date":"2023","value":null}
                ]]"#,
            )
            .create_async()
            .await;

        let rows = client_for(&server).fetch_all_countries("SP.URB.TOTL.IN.ZS").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].country, "IN");
        assert_eq!(rows[1].value, 92.0);
    }
}
