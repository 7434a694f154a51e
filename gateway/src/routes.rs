//! Country metric API routes
//!
//! Every handler takes its parameters as optional query fields so a missing
//! parameter produces the JSON 400 body instead of axum's plain-text
//! rejection.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use country_codes::CountryCode;
use country_metrics::crime::CrimeMetric;
use country_metrics::providers::{CountryProfile, GenderSplit, TradeBalance};
use country_metrics::ranking::{derive_complement, rank, RankEntry};
use country_metrics::{CountryBundle, MetricProvider, MetricRequest, MetricsError, ResolvedMetric};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/countries", get(list_countries))
        .route("/world-bank", get(world_bank_metric))
        .route("/owid", get(owid_metric))
        .route("/trade", get(trade_balance))
        .route("/factbook", get(factbook_metric))
        .route("/factbook/gender", get(factbook_gender))
        .route("/country-profile", get(country_profile))
        .route("/crime", get(crime_metric))
        .route("/aggregate", get(aggregate))
        .route("/rankings", get(rankings))
        .with_state(state)
}

#[derive(Deserialize)]
pub struct CountryQuery {
    pub country: Option<String>,
}

#[derive(Deserialize)]
pub struct IndicatorQuery {
    pub country: Option<String>,
    pub indicator: Option<String>,
}

#[derive(Deserialize)]
pub struct VariableQuery {
    pub country: Option<String>,
    pub variable: Option<String>,
}

#[derive(Deserialize)]
pub struct MetricQuery {
    pub country: Option<String>,
    pub metric: Option<String>,
}

#[derive(Deserialize)]
pub struct TradeQuery {
    pub country: Option<String>,
    pub year: Option<String>,
}

#[derive(Deserialize)]
pub struct AggregateQuery {
    pub country: Option<String>,
    pub metrics: Option<String>,
}

#[derive(Deserialize)]
pub struct RankingQuery {
    pub indicator: Option<String>,
    pub derive: Option<String>,
}

#[derive(Serialize)]
pub struct CountrySummary {
    pub code: &'static str,
    pub alpha3: &'static str,
    pub name: &'static str,
}

/// Single resolved metric tagged with what was asked for
#[derive(Serialize)]
pub struct MetricResponse {
    pub country: String,
    pub metric: String,
    #[serde(flatten)]
    pub resolved: ResolvedMetric,
}

#[derive(Serialize)]
pub struct CrimeSummaryResponse {
    pub country: String,
    pub metrics: BTreeMap<&'static str, ResolvedMetric>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum CrimeResponse {
    One(MetricResponse),
    All(CrimeSummaryResponse),
}

#[derive(Serialize)]
pub struct RankingsResponse {
    pub indicator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived: Option<&'static str>,
    pub count: usize,
    pub rows: Vec<RankEntry>,
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingParam(name))
}

/// The country parameter must be a code from the directory
fn known_country(value: &Option<String>) -> Result<CountryCode, ApiError> {
    let raw = required(value, "country")?;
    match CountryCode::parse(raw) {
        Ok(code) if code.is_known() => Ok(code),
        _ => Err(ApiError::UnknownCountry { input: raw.to_string() }),
    }
}

async fn metric_response(
    provider: &dyn MetricProvider,
    country: CountryCode,
    metric: &str,
) -> ApiResult<MetricResponse> {
    let resolved = provider.fetch_metric(country.as_str(), metric).await?;
    Ok(Json(MetricResponse {
        country: country.as_str().to_string(),
        metric: metric.to_string(),
        resolved,
    }))
}

pub async fn list_countries() -> Json<Vec<CountrySummary>> {
    let countries = country_codes::all_countries()
        .iter()
        .map(|r| CountrySummary {
            code: r.alpha2,
            alpha3: r.alpha3,
            name: r.name,
        })
        .collect();
    Json(countries)
}

pub async fn world_bank_metric(
    State(state): State<AppState>,
    Query(query): Query<IndicatorQuery>,
) -> ApiResult<MetricResponse> {
    let country = known_country(&query.country)?;
    let indicator = required(&query.indicator, "indicator")?;
    metric_response(state.world_bank.as_ref(), country, indicator).await
}

pub async fn owid_metric(
    State(state): State<AppState>,
    Query(query): Query<VariableQuery>,
) -> ApiResult<MetricResponse> {
    let country = known_country(&query.country)?;
    let variable = required(&query.variable, "variable")?;
    metric_response(state.owid.as_ref(), country, variable).await
}

/// Live Comtrade balance; sample data is served when the live call fails
pub async fn trade_balance(
    State(state): State<AppState>,
    Query(query): Query<TradeQuery>,
) -> ApiResult<TradeBalance> {
    let country = known_country(&query.country)?;
    let year = match query.year.as_deref().map(str::trim).filter(|y| !y.is_empty()) {
        Some(raw) => Some(
            raw.parse::<i32>()
                .map_err(|_| MetricsError::BadRequest(format!("invalid year: {:?}", raw)))?,
        ),
        None => None,
    };
    let balance = state.comtrade.trade_balance(country.as_str(), year).await?;
    Ok(Json(balance))
}

pub async fn factbook_metric(
    State(state): State<AppState>,
    Query(query): Query<MetricQuery>,
) -> ApiResult<MetricResponse> {
    let country = known_country(&query.country)?;
    let metric = required(&query.metric, "metric")?;
    metric_response(state.factbook.as_ref(), country, metric).await
}

/// Estimated population by sex (approximation, see `SplitMethod`)
pub async fn factbook_gender(
    State(state): State<AppState>,
    Query(query): Query<CountryQuery>,
) -> ApiResult<GenderSplit> {
    let country = known_country(&query.country)?;
    Ok(Json(state.factbook.gender_split(country.as_str()).await?))
}

pub async fn country_profile(
    State(state): State<AppState>,
    Query(query): Query<CountryQuery>,
) -> ApiResult<CountryProfile> {
    let country = known_country(&query.country)?;
    Ok(Json(state.rest_countries.fetch_profile(country.as_str()).await?))
}

/// One crime metric, or the whole catalog when `metric` is omitted
pub async fn crime_metric(
    State(state): State<AppState>,
    Query(query): Query<MetricQuery>,
) -> ApiResult<CrimeResponse> {
    let country = known_country(&query.country)?;

    if let Some(metric) = query.metric.as_deref().filter(|m| !m.trim().is_empty()) {
        let Json(one) = metric_response(state.crime.as_ref(), country, metric).await?;
        return Ok(Json(CrimeResponse::One(one)));
    }

    let metrics = state
        .crime
        .summary(country.as_str())
        .await?
        .into_iter()
        .map(|(metric, resolved): (CrimeMetric, ResolvedMetric)| (metric.id(), resolved))
        .collect();
    Ok(Json(CrimeResponse::All(CrimeSummaryResponse {
        country: country.as_str().to_string(),
        metrics,
    })))
}

pub async fn aggregate(
    State(state): State<AppState>,
    Query(query): Query<AggregateQuery>,
) -> ApiResult<CountryBundle> {
    let country = known_country(&query.country)?;
    let requests = MetricRequest::parse_list(required(&query.metrics, "metrics")?)?;
    Ok(Json(state.aggregator.aggregate(country.as_str(), &requests).await?))
}

/// Cross-country World Bank ranking, optionally as `100 - value`
pub async fn rankings(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> ApiResult<RankingsResponse> {
    let indicator = required(&query.indicator, "indicator")?;
    let derived = match query.derive.as_deref().map(str::trim) {
        None | Some("") => None,
        Some("complement") => Some("complement"),
        Some(other) => {
            return Err(MetricsError::BadRequest(format!("unknown derivation: {:?}", other)).into());
        }
    };

    let rows = state.world_bank.fetch_all_countries(indicator).await?;
    let rows = match derived {
        Some(_) => derive_complement(&rows, 100.0),
        None => rows,
    };
    let rows = rank(rows);

    Ok(Json(RankingsResponse {
        indicator: indicator.to_string(),
        derived,
        count: rows.len(),
        rows,
    }))
}
