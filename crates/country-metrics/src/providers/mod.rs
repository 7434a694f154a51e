//! Provider adapters
//!
//! One adapter per upstream source. Each knows its URL scheme, response
//! shape and failure modes, and normalizes into [`ResolvedMetric`].
//! Non-2xx statuses, transport errors and timeouts surface as
//! `UpstreamUnavailable`; unexpected bodies as `ParseFailure`.

use async_trait::async_trait;
use country_codes::Provider;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::observation::{Provenance, ResolvedMetric};
use crate::{MetricsError, Result};

pub mod comtrade;
pub mod factbook;
pub mod owid;
pub mod rest_countries;
pub mod world_bank;

pub use comtrade::{ComtradeClient, TradeBalance, TradeFlow};
pub use factbook::{FactbookClient, GenderSplit, SplitMethod};
pub use owid::OwidClient;
pub use rest_countries::{CountryProfile, RestCountriesClient};
pub use world_bank::WorldBankClient;

/// Default per-request timeout, inside the 8-15s window
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Common adapter interface used by the aggregator
#[async_trait]
pub trait MetricProvider: Send + Sync {
    fn provider(&self) -> Provider;

    /// Attribution attached to every result, including failures
    fn provenance(&self) -> Provenance;

    /// Resolve one metric for a canonical country code
    async fn fetch_metric(&self, country: &str, metric: &str) -> Result<ResolvedMetric>;
}

/// Endpoint and client settings for one adapter
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn build_client(&self, provider: Provider) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| MetricsError::upstream(provider, format!("failed to create HTTP client: {}", e)))
    }
}

/// Bounded retry with linear backoff: attempt `n` waits `backoff_step * n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_step: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff_step * retry
    }

    /// Run `op` up to `max_retries + 1` times. Only upstream/parse failures
    /// are retried; anything else returns immediately.
    pub async fn run<T, F, Fut>(&self, provider: Provider, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_upstream() && retry < self.max_retries => {
                    retry += 1;
                    let delay = self.delay_for(retry);
                    warn!(%provider, retry, delay_ms = delay.as_millis() as u64, error = %e, "retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Hide API keys from logs
pub(crate) fn redact(url: &str) -> String {
    match url.find("subscription-key=") {
        Some(start) => {
            let value_start = start + "subscription-key=".len();
            let value_end = url[value_start..]
                .find('&')
                .map(|i| value_start + i)
                .unwrap_or(url.len());
            format!("{}***{}", &url[..value_start], &url[value_end..])
        }
        None => url.to_string(),
    }
}

/// GET a JSON document, mapping transport/status/body failures
pub(crate) async fn get_json<T: DeserializeOwned>(client: &Client, url: &str, provider: Provider) -> Result<T> {
    debug!(%provider, url = %redact(url), "GET");

    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| MetricsError::upstream(provider, format!("request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(MetricsError::upstream(
            provider,
            format!("returned status: {}", response.status()),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| MetricsError::parse(provider, e.to_string()))
}

/// Reject identifiers that would need URL escaping
pub(crate) fn validate_identifier(kind: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let ok = !trimmed.is_empty()
        && trimmed.len() <= 128
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._-/".contains(c));
    if ok && !trimmed.contains("..") {
        Ok(trimmed.to_string())
    } else {
        Err(MetricsError::BadRequest(format!("invalid {}: {:?}", kind, raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_redact_hides_key() {
        assert_eq!(
            redact("https://x/get?r=842&subscription-key=abc123&fmt=json"),
            "https://x/get?r=842&subscription-key=***&fmt=json"
        );
        assert_eq!(redact("https://x/get?subscription-key=abc"), "https://x/get?subscription-key=***");
        assert_eq!(redact("https://x/get?r=1"), "https://x/get?r=1");
    }

    #[test]
    fn test_backoff_schedule_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_three_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = tokio::time::Instant::now();
        let result: Result<()> = RetryPolicy::default()
            .run(Provider::Comtrade, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(MetricsError::upstream(Provider::Comtrade, "503"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = RetryPolicy::default()
            .run(Provider::Comtrade, move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(MetricsError::upstream(Provider::Comtrade, "timeout"))
                } else {
                    Ok(5)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_skips_non_upstream_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = RetryPolicy::default()
            .run(Provider::Comtrade, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(MetricsError::BadRequest("bad year".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_validate_identifier() {
        assert_eq!(validate_identifier("indicator", " NY.GDP.MKTP.CD ").unwrap(), "NY.GDP.MKTP.CD");
        assert!(validate_identifier("indicator", "a b").is_err());
        assert!(validate_identifier("indicator", "../etc").is_err());
        assert!(validate_identifier("indicator", "").is_err());
    }
}
