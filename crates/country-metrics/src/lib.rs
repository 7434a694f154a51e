//! Country Metric Resolution
//!
//! Resolves a (country, metric) request against public statistics providers:
//!
//! ```text
//! request ─► code mapping ─► provider adapter ─► latest-value resolver ─► ResolvedMetric
//!                                  │ failure
//!                                  └─► fallback sample data (trade only)
//! ```
//!
//! | Provider        | Code space      | Notes                                   |
//! |-----------------|-----------------|-----------------------------------------|
//! | World Bank      | ISO alpha-3     | one GET per indicator                   |
//! | Our World in Data | country name  | data + metadata GETs joined by entity id |
//! | UN Comtrade     | UN numeric      | exports + imports, bounded retry        |
//! | CIA Factbook    | GEC + region    | free-text numeric fields                |
//! | REST Countries  | ISO alpha-2     | current snapshot, no year               |
//! | UNODC (bundled) | ISO alpha-3     | on-disk dataset behind a TTL cache      |
//!
//! The [`aggregator::Aggregator`] fans out several metric requests for one
//! country concurrently and never lets one failure abort the bundle.

use country_codes::{CodeError, Provider};
use thiserror::Error;

pub mod aggregator;
pub mod cache;
pub mod crime;
pub mod fallback;
pub mod format;
pub mod observation;
pub mod providers;
pub mod ranking;
pub mod resolver;

pub use aggregator::{Aggregator, CountryBundle, MetricRequest};
pub use cache::TtlCache;
pub use crime::{CrimeDataset, CrimeMetric, CrimeStatistics};
pub use fallback::SampleTradeData;
pub use format::{format_trade_value, parse_factbook_number, partner_share, FormattedValue};
pub use observation::{DimensionTags, MetricObservation, MetricSeries, Provenance, ResolvedMetric};
pub use providers::{HttpSettings, MetricProvider, RetryPolicy};
pub use resolver::{resolve_latest, DimensionFilter};

#[derive(Error, Debug, Clone)]
pub enum MetricsError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Country {code} is not supported by {provider}")]
    UnsupportedCountry { code: String, provider: Provider },
    #[error("{provider} unavailable: {details}")]
    UpstreamUnavailable { provider: Provider, details: String },
    #[error("Unexpected {provider} response: {details}")]
    ParseFailure { provider: Provider, details: String },
    #[error("Dataset error: {0}")]
    Dataset(String),
}

impl MetricsError {
    pub fn upstream(provider: Provider, details: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            provider,
            details: details.into(),
        }
    }

    pub fn parse(provider: Provider, details: impl Into<String>) -> Self {
        Self::ParseFailure {
            provider,
            details: details.into(),
        }
    }

    /// Upstream and parse failures are both eligible for fallback data
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::ParseFailure { .. }
        )
    }
}

impl From<CodeError> for MetricsError {
    fn from(err: CodeError) -> Self {
        match err {
            CodeError::Invalid(raw) => {
                Self::BadRequest(format!("invalid country code {:?}", raw))
            }
            CodeError::NotFound { code, provider } => Self::UnsupportedCountry { code, provider },
        }
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;
