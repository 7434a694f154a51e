//! Environment-driven gateway configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use country_metrics::crime::DEFAULT_DATASET_PATH;
use country_metrics::providers::comtrade::COMTRADE_BASE_URL;
use country_metrics::providers::factbook::FACTBOOK_BASE_URL;
use country_metrics::providers::owid::OWID_BASE_URL;
use country_metrics::providers::rest_countries::REST_COUNTRIES_BASE_URL;
use country_metrics::providers::world_bank::WORLD_BANK_BASE_URL;
use country_metrics::{HttpSettings, RetryPolicy};

pub const DEFAULT_PORT: u16 = 18700;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub http_timeout: Duration,
    pub cache_ttl: Duration,
    pub crime_dataset_path: PathBuf,
    pub comtrade_api_key: Option<String>,
    pub comtrade_retry: RetryPolicy,
    pub world_bank_url: String,
    pub owid_url: String,
    pub comtrade_url: String,
    pub factbook_url: String,
    pub rest_countries_url: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable numbers fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let number = |key: &str, default: u64| parse_or(lookup(key), key, default);

        let port = lookup("COUNTRY_GATEWAY_PORT")
            .or_else(|| lookup("PORT"))
            .map(|raw| parse_or(Some(raw), "COUNTRY_GATEWAY_PORT", DEFAULT_PORT))
            .unwrap_or(DEFAULT_PORT);

        let defaults = RetryPolicy::default();
        let comtrade_retry = RetryPolicy {
            max_retries: parse_or(lookup("COMTRADE_MAX_RETRIES"), "COMTRADE_MAX_RETRIES", defaults.max_retries),
            backoff_step: Duration::from_millis(number("COMTRADE_BACKOFF_MS", defaults.backoff_step.as_millis() as u64)),
        };

        Self {
            port,
            http_timeout: Duration::from_secs(number("HTTP_TIMEOUT_SECS", 10)),
            cache_ttl: Duration::from_secs(number("DATASET_CACHE_TTL_SECS", 300)),
            crime_dataset_path: PathBuf::from(get("CRIME_DATASET_PATH", DEFAULT_DATASET_PATH)),
            comtrade_api_key: lookup("COMTRADE_API_KEY").filter(|k| !k.trim().is_empty()),
            comtrade_retry,
            world_bank_url: get("WORLD_BANK_BASE_URL", WORLD_BANK_BASE_URL),
            owid_url: get("OWID_BASE_URL", OWID_BASE_URL),
            comtrade_url: get("COMTRADE_BASE_URL", COMTRADE_BASE_URL),
            factbook_url: get("FACTBOOK_BASE_URL", FACTBOOK_BASE_URL),
            rest_countries_url: get("REST_COUNTRIES_BASE_URL", REST_COUNTRIES_BASE_URL),
        }
    }

    pub fn http(&self, base_url: &str) -> HttpSettings {
        HttpSettings::new(base_url).with_timeout(self.http_timeout)
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> GatewayConfig {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        GatewayConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.port, 18700);
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
        assert_eq!(cfg.crime_dataset_path, PathBuf::from("data/crime_statistics.json"));
        assert_eq!(cfg.comtrade_retry, RetryPolicy::default());
        assert_eq!(cfg.world_bank_url, WORLD_BANK_BASE_URL);
        assert!(cfg.comtrade_api_key.is_none());
    }

    #[test]
    fn test_overrides_and_port_fallback() {
        let cfg = config(&[
            ("PORT", "9000"),
            ("HTTP_TIMEOUT_SECS", "12"),
            ("COMTRADE_API_KEY", "secret"),
            ("COMTRADE_MAX_RETRIES", "0"),
            ("OWID_BASE_URL", "http://localhost:1/"),
        ]);
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9000");
        assert_eq!(cfg.http_timeout, Duration::from_secs(12));
        assert_eq!(cfg.comtrade_api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.comtrade_retry.max_retries, 0);
        assert_eq!(cfg.http(&cfg.owid_url).base_url, "http://localhost:1");

        let cfg = config(&[("COUNTRY_GATEWAY_PORT", "8080"), ("PORT", "9000")]);
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn test_bad_numbers_use_defaults() {
        let cfg = config(&[("COUNTRY_GATEWAY_PORT", "http"), ("DATASET_CACHE_TTL_SECS", "-5")]);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
    }
}
