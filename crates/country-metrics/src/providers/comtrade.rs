//! UN Comtrade trade balance
//!
//! Two GETs per country-year, one per flow:
//!
//! ```text
//! {base}?type=C&freq=A&px=HS&ps={year}&r={un}&p=all&rg={1|2}&cc=TOTAL&fmt=json[&subscription-key=..]
//! ```
//!
//! Each flow is retried with [`RetryPolicy`]. When the live call fails, or
//! the country has no Comtrade reporter code, the static sample table is
//! served instead if it covers the country.

use async_trait::async_trait;
use chrono::Datelike;
use country_codes::{to_provider_code, Provider};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::{get_json, HttpSettings, MetricProvider, RetryPolicy};
use crate::fallback::{SamplePartner, SampleTrade, SampleTradeData, TRADE_UNIT};
use crate::format::{format_trade_value, partner_share, FormattedValue};
use crate::observation::{Provenance, ResolvedMetric};
use crate::{MetricsError, Result};

pub const COMTRADE_BASE_URL: &str = "https://comtrade.un.org/api/get";

/// Partner code for the "World" aggregate row
const WORLD_PARTNER: &str = "0";
const TOP_PARTNERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeFlow {
    Imports = 1,
    Exports = 2,
}

impl TradeFlow {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Deserialize)]
struct ComtradeResponse {
    dataset: Option<Vec<ComtradeRow>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ComtradeRow {
    #[serde(rename = "cmdCode", default)]
    cmd_code: Value,
    #[serde(rename = "ptCode", default)]
    pt_code: Value,
    #[serde(rename = "ptTitle", default)]
    pt_title: String,
    #[serde(rename = "TradeValue", default)]
    trade_value: Option<f64>,
}

/// Codes arrive as either strings or numbers depending on the endpoint
fn code_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

impl ComtradeRow {
    fn partner(&self) -> String {
        code_string(&self.pt_code)
    }

    fn is_total_commodity(&self) -> bool {
        matches!(code_string(&self.cmd_code).as_str(), "" | "TOTAL")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerShare {
    /// Comtrade partner code for live data, ISO alpha-2 for sample data
    pub code: String,
    pub name: String,
    pub value: f64,
    /// Percent of the flow total, one decimal
    pub share: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeBalance {
    pub country: String,
    pub year: i32,
    pub exports: FormattedValue,
    pub imports: FormattedValue,
    pub balance: FormattedValue,
    pub top_export_partners: Vec<PartnerShare>,
    pub top_import_partners: Vec<PartnerShare>,
    pub source: String,
    pub source_organization: String,
    pub sample: bool,
}

impl TradeBalance {
    fn from_sample(sample: &SampleTrade, provenance: &Provenance) -> Self {
        Self {
            country: sample.country.to_string(),
            year: sample.year,
            exports: format_trade_value(sample.exports),
            imports: format_trade_value(sample.imports),
            balance: format_trade_value(sample.balance()),
            top_export_partners: sample_partners(sample.export_partners, sample.exports),
            top_import_partners: sample_partners(sample.import_partners, sample.imports),
            source: provenance.source.clone(),
            source_organization: provenance.organization.clone(),
            sample: true,
        }
    }

    fn metric(&self, metric: &str) -> Option<f64> {
        match metric {
            "exports" => Some(self.exports.raw),
            "imports" => Some(self.imports.raw),
            "trade_balance" | "balance" => Some(self.balance.raw),
            _ => None,
        }
    }
}

fn sample_partners(rows: &[SamplePartner], total: f64) -> Vec<PartnerShare> {
    rows.iter()
        .map(|(code, name, value)| PartnerShare {
            code: code.to_string(),
            name: name.to_string(),
            value: *value,
            share: partner_share(*value, total),
        })
        .collect()
}

/// Flow total plus the largest partners. A World row is authoritative;
/// otherwise the partner rows are summed.
fn summarize(rows: &[ComtradeRow]) -> (f64, Vec<PartnerShare>) {
    let rows: Vec<&ComtradeRow> = rows.iter().filter(|r| r.is_total_commodity()).collect();

    let world = rows
        .iter()
        .find(|r| r.partner() == WORLD_PARTNER)
        .and_then(|r| r.trade_value);

    let mut partners: Vec<(&ComtradeRow, f64)> = rows
        .iter()
        .filter(|r| r.partner() != WORLD_PARTNER)
        .filter_map(|r| Some((*r, r.trade_value?)))
        .collect();

    let total = world.unwrap_or_else(|| partners.iter().map(|(_, v)| v).sum());

    partners.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let top = partners
        .into_iter()
        .take(TOP_PARTNERS)
        .map(|(row, value)| PartnerShare {
            code: row.partner(),
            name: row.pt_title.clone(),
            value,
            share: partner_share(value, total),
        })
        .collect();

    (total, top)
}

pub struct ComtradeClient {
    client: Client,
    settings: HttpSettings,
    api_key: Option<String>,
    retry: RetryPolicy,
    samples: Option<SampleTradeData>,
}

impl ComtradeClient {
    pub fn new(settings: HttpSettings, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: settings.build_client(Provider::Comtrade)?,
            settings,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            retry: RetryPolicy::default(),
            samples: Some(SampleTradeData),
        })
    }

    pub fn public(api_key: Option<String>) -> Result<Self> {
        Self::new(HttpSettings::new(COMTRADE_BASE_URL), api_key)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Surface live failures instead of serving sample data
    pub fn without_samples(mut self) -> Self {
        self.samples = None;
        self
    }

    /// Most recent year Comtrade has reliably published
    pub fn default_year() -> i32 {
        chrono::Utc::now().year() - 2
    }

    fn flow_url(&self, reporter: &str, year: i32, flow: TradeFlow) -> Result<String> {
        let year = year.to_string();
        let rg = flow.code().to_string();
        let mut params = vec![
            ("type", "C"),
            ("freq", "A"),
            ("px", "HS"),
            ("ps", year.as_str()),
            ("r", reporter),
            ("p", "all"),
            ("rg", rg.as_str()),
            ("cc", "TOTAL"),
            ("fmt", "json"),
        ];
        if let Some(key) = &self.api_key {
            params.push(("subscription-key", key.as_str()));
        }
        let url = Url::parse_with_params(&self.settings.base_url, &params)
            .map_err(|e| MetricsError::upstream(Provider::Comtrade, format!("invalid base URL: {}", e)))?;
        Ok(url.into())
    }

    async fn fetch_flow(&self, reporter: &str, year: i32, flow: TradeFlow) -> Result<Vec<ComtradeRow>> {
        let url = self.flow_url(reporter, year, flow)?;
        let response: ComtradeResponse = self
            .retry
            .run(Provider::Comtrade, || get_json(&self.client, &url, Provider::Comtrade))
            .await?;
        response
            .dataset
            .ok_or_else(|| MetricsError::parse(Provider::Comtrade, "response has no dataset"))
    }

    /// Live trade balance, no fallback
    pub async fn fetch_trade(&self, country: &str, year: i32) -> Result<TradeBalance> {
        let reporter = to_provider_code(country, Provider::Comtrade)?;

        let (exports, imports) = tokio::try_join!(
            self.fetch_flow(reporter, year, TradeFlow::Exports),
            self.fetch_flow(reporter, year, TradeFlow::Imports),
        )?;
        if exports.is_empty() && imports.is_empty() {
            return Err(MetricsError::upstream(
                Provider::Comtrade,
                format!("no trade data for {}", year),
            ));
        }

        let (export_total, top_export_partners) = summarize(&exports);
        let (import_total, top_import_partners) = summarize(&imports);
        let provenance = self.provenance();

        info!(country, year, exports = export_total, imports = import_total, "trade balance resolved");
        Ok(TradeBalance {
            country: country.trim().to_ascii_uppercase(),
            year,
            exports: format_trade_value(export_total),
            imports: format_trade_value(import_total),
            balance: format_trade_value(export_total - import_total),
            top_export_partners,
            top_import_partners,
            source: provenance.source,
            source_organization: provenance.organization,
            sample: false,
        })
    }

    /// Live balance, or sample data when the live call fails and the
    /// sample table covers the country
    pub async fn trade_balance(&self, country: &str, year: Option<i32>) -> Result<TradeBalance> {
        let year = year.unwrap_or_else(Self::default_year);
        match self.fetch_trade(country, year).await {
            Ok(balance) => Ok(balance),
            Err(e) if e.is_upstream() || matches!(e, MetricsError::UnsupportedCountry { .. }) => {
                let sample = self.samples.as_ref().and_then(|s| s.lookup(country));
                match sample {
                    Some(sample) => {
                        warn!(country, error = %e, "serving sample trade data");
                        Ok(TradeBalance::from_sample(sample, &self.provenance().sample()))
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl MetricProvider for ComtradeClient {
    fn provider(&self) -> Provider {
        Provider::Comtrade
    }

    fn provenance(&self) -> Provenance {
        Provenance::new("UN Comtrade", "United Nations Statistics Division")
    }

    async fn fetch_metric(&self, country: &str, metric: &str) -> Result<ResolvedMetric> {
        let metric = metric.trim();
        if !matches!(metric, "exports" | "imports" | "trade_balance" | "balance") {
            return Err(MetricsError::BadRequest(format!("unknown trade metric: {}", metric)));
        }

        let balance = self.trade_balance(country, None).await?;
        let provenance = Provenance::new(balance.source.clone(), balance.source_organization.clone());
        Ok(ResolvedMetric::from_parts(
            balance.metric(metric),
            Some(balance.year),
            &provenance,
            Some(TRADE_UNIT.to_string()),
        ))
    }
}
