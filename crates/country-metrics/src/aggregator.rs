//! Multi-metric fan-out for one country
//!
//! Every requested metric becomes an independent adapter call. All calls are
//! awaited together and each failure is folded into a null entry carrying
//! the error as its note, so the bundle always has one entry per request.

use country_codes::{CountryCode, Provider};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::observation::{Provenance, ResolvedMetric};
use crate::providers::MetricProvider;
use crate::{MetricsError, Result};

/// One `provider:metric` pair, e.g. `world-bank:SP.POP.TOTL`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricRequest {
    pub provider: Provider,
    pub metric: String,
}

impl MetricRequest {
    pub fn new(provider: Provider, metric: impl Into<String>) -> Self {
        Self {
            provider,
            metric: metric.into(),
        }
    }

    /// Key used in the bundle
    pub fn id(&self) -> String {
        format!("{}:{}", self.provider, self.metric)
    }

    /// Parse a comma-separated list, rejecting the whole list on any bad entry
    pub fn parse_list(raw: &str) -> Result<Vec<Self>> {
        let requests = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Self>>>()?;
        if requests.is_empty() {
            return Err(MetricsError::BadRequest("no metrics requested".into()));
        }
        Ok(requests)
    }
}

impl FromStr for MetricRequest {
    type Err = MetricsError;

    fn from_str(raw: &str) -> Result<Self> {
        let (provider, metric) = raw
            .split_once(':')
            .ok_or_else(|| MetricsError::BadRequest(format!("expected provider:metric, got {:?}", raw)))?;
        let provider = Provider::parse(provider)
            .ok_or_else(|| MetricsError::BadRequest(format!("unknown provider: {:?}", provider)))?;
        let metric = metric.trim();
        if metric.is_empty() {
            return Err(MetricsError::BadRequest(format!("missing metric in {:?}", raw)));
        }
        Ok(Self::new(provider, metric))
    }
}

impl fmt::Display for MetricRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// All requested metrics for one country, keyed by request id
#[derive(Debug, Clone, Serialize)]
pub struct CountryBundle {
    pub country: String,
    pub metrics: BTreeMap<String, ResolvedMetric>,
    pub available: usize,
    pub failed: usize,
}

impl CountryBundle {
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ResolvedMetric> {
        self.metrics.get(id)
    }
}

/// Registry of adapters keyed by provider
#[derive(Default, Clone)]
pub struct Aggregator {
    providers: HashMap<Provider, Arc<dyn MetricProvider>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn MetricProvider>) -> Self {
        self.providers.insert(provider.provider(), provider);
        self
    }

    pub fn providers(&self) -> impl Iterator<Item = Provider> + '_ {
        self.providers.keys().copied()
    }

    pub fn provider(&self, provider: Provider) -> Option<&Arc<dyn MetricProvider>> {
        self.providers.get(&provider)
    }

    async fn fetch_one(&self, country: &str, request: &MetricRequest) -> Result<ResolvedMetric> {
        let adapter = self.providers.get(&request.provider).ok_or_else(|| {
            MetricsError::BadRequest(format!("provider {} is not configured", request.provider))
        })?;
        adapter.fetch_metric(country, &request.metric).await
    }

    fn failure_entry(&self, request: &MetricRequest, error: &MetricsError) -> ResolvedMetric {
        let provenance = match self.providers.get(&request.provider) {
            Some(adapter) => adapter.provenance(),
            None => Provenance::new(request.provider.to_string(), request.provider.to_string()),
        };
        ResolvedMetric::unavailable(&provenance, None).with_note(error.to_string())
    }

    /// Fan out every distinct request concurrently and fold the results into
    /// a bundle. Aliased duplicates (`wb:X`, `world-bank:X`) are fetched and
    /// counted once. Only an invalid country code fails the call; per-metric
    /// errors become null entries.
    pub async fn aggregate(&self, country: &str, requests: &[MetricRequest]) -> Result<CountryBundle> {
        let code = CountryCode::parse(country)?;
        let country = code.as_str();

        let mut seen = HashSet::new();
        let requests: Vec<&MetricRequest> = requests.iter().filter(|r| seen.insert(*r)).collect();

        let results = join_all(requests.iter().map(|r| self.fetch_one(country, r))).await;

        let mut metrics = BTreeMap::new();
        let (mut available, mut failed) = (0, 0);
        for (request, result) in requests.into_iter().zip(results) {
            let entry = match result {
                Ok(metric) => {
                    if metric.is_available() {
                        available += 1;
                    }
                    metric
                }
                Err(e) => {
                    failed += 1;
                    warn!(country, metric = %request, error = %e, "metric failed");
                    self.failure_entry(request, &e)
                }
            };
            metrics.insert(request.id(), entry);
        }

        debug!(country, requested = metrics.len(), available, failed, "bundle assembled");
        Ok(CountryBundle {
            country: country.to_string(),
            metrics,
            available,
            failed,
        })
    }
}
