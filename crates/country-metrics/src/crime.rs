//! Bundled UNODC crime statistics
//!
//! A flat JSON array of category-coded rows, read from disk through a
//! [`TtlCache`] so repeated requests do not re-read the file.

use async_trait::async_trait;
use country_codes::{to_provider_code, Provider};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::cache::TtlCache;
use crate::observation::{DimensionTags, MetricObservation, MetricSeries, Provenance, ResolvedMetric};
use crate::providers::MetricProvider;
use crate::resolver::{resolve_latest, DimensionFilter, TOTAL, UNIT_COUNTS, UNIT_RATE_PER_100K};
use crate::{MetricsError, Result};

pub const DEFAULT_DATASET_PATH: &str = "data/crime_statistics.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeRecord {
    pub iso3: String,
    #[serde(default)]
    pub country: Option<String>,
    pub indicator: String,
    #[serde(default)]
    pub dimension: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    pub year: i32,
    #[serde(default)]
    pub unit: Option<String>,
    pub value: Option<f64>,
}

impl CrimeRecord {
    fn observation(&self) -> MetricObservation {
        MetricObservation::new(self.year, self.value).with_tags(DimensionTags {
            dimension: self.dimension.clone(),
            category: self.category.clone(),
            sex: self.sex.clone(),
            age: self.age.clone(),
            unit: self.unit.clone(),
        })
    }
}

pub struct CrimeDataset {
    records: Vec<CrimeRecord>,
    by_country: HashMap<String, Vec<usize>>,
}

impl CrimeDataset {
    pub fn from_records(records: Vec<CrimeRecord>) -> Self {
        let mut by_country: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            by_country
                .entry(record.iso3.trim().to_ascii_uppercase())
                .or_default()
                .push(i);
        }
        Self { records, by_country }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MetricsError::Dataset(format!("{}: {}", path.display(), e)))?;
        let records: Vec<CrimeRecord> = serde_json::from_str(&raw)
            .map_err(|e| MetricsError::Dataset(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), rows = records.len(), "crime dataset loaded");
        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn covers(&self, iso3: &str) -> bool {
        self.by_country.contains_key(&iso3.to_ascii_uppercase())
    }

    /// All rows of one indicator for one country, in file order
    pub fn series(&self, iso3: &str, indicator: &str) -> MetricSeries {
        let iso3 = iso3.trim().to_ascii_uppercase();
        let mut series = MetricSeries::new(indicator, iso3.as_str());
        for &i in self.by_country.get(&iso3).into_iter().flatten() {
            let record = &self.records[i];
            if record.indicator.eq_ignore_ascii_case(indicator) {
                series.push(record.observation());
            }
        }
        series
    }
}

/// Crime metrics the dataset can answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrimeMetric {
    HomicideVictims,
    HomicideRate,
    HomicideArrests,
    TraffickingVictims,
}

impl CrimeMetric {
    pub const ALL: [CrimeMetric; 4] = [
        CrimeMetric::HomicideVictims,
        CrimeMetric::HomicideRate,
        CrimeMetric::HomicideArrests,
        CrimeMetric::TraffickingVictims,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::HomicideVictims => "homicide_victims",
            Self::HomicideRate => "homicide_rate",
            Self::HomicideArrests => "homicide_arrests",
            Self::TraffickingVictims => "trafficking_victims",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|m| m.id() == wanted)
    }

    pub fn indicator(self) -> &'static str {
        match self {
            Self::HomicideVictims | Self::HomicideRate => "Victims of intentional homicide",
            Self::HomicideArrests => "Persons arrested/suspected for intentional homicide",
            Self::TraffickingVictims => "Detected trafficking victims",
        }
    }

    pub fn filter(self) -> DimensionFilter {
        match self {
            Self::HomicideVictims => DimensionFilter::any()
                .dimension(TOTAL)
                .sex(TOTAL)
                .age(TOTAL)
                .unit(UNIT_COUNTS),
            Self::HomicideRate => DimensionFilter::any()
                .dimension(TOTAL)
                .sex(TOTAL)
                .age(TOTAL)
                .unit(UNIT_RATE_PER_100K),
            Self::HomicideArrests => DimensionFilter::any()
                .dimension(TOTAL)
                .category(TOTAL)
                .sex(TOTAL)
                .age(TOTAL)
                .unit(UNIT_COUNTS),
            // Published by sex only; the resolver sums the sex rows
            Self::TraffickingVictims => DimensionFilter::any().sex(TOTAL).age(TOTAL).unit(UNIT_COUNTS),
        }
    }
}

/// Crime metrics for one country via the cached dataset
pub struct CrimeStatistics {
    cache: TtlCache<CrimeDataset>,
    path: PathBuf,
}

impl CrimeStatistics {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        let path = path.into();
        let loader_path = path.clone();
        Self {
            cache: TtlCache::new("crime-dataset", ttl, move || {
                let path = loader_path.clone();
                async move { CrimeDataset::load(path).await }
            }),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn resolve(&self, country: &str, metric: CrimeMetric) -> Result<ResolvedMetric> {
        let iso3 = to_provider_code(country, Provider::Unodc)?;
        let dataset = self.cache.get().await?;
        let provenance = self.provenance();

        if !dataset.covers(iso3) {
            return Ok(ResolvedMetric::unavailable(&provenance, metric.filter().unit)
                .with_note("country not present in the bundled dataset"));
        }
        let series = dataset.series(iso3, metric.indicator());
        Ok(resolve_latest(&series, &metric.filter(), &provenance))
    }

    /// Every catalogued metric for one country
    pub async fn summary(&self, country: &str) -> Result<BTreeMap<CrimeMetric, ResolvedMetric>> {
        let mut out = BTreeMap::new();
        for metric in CrimeMetric::ALL {
            out.insert(metric, self.resolve(country, metric).await?);
        }
        Ok(out)
    }
}

#[async_trait]
impl MetricProvider for CrimeStatistics {
    fn provider(&self) -> Provider {
        Provider::Unodc
    }

    fn provenance(&self) -> Provenance {
        Provenance::new(
            "UNODC crime and criminal justice statistics",
            "United Nations Office on Drugs and Crime",
        )
    }

    async fn fetch_metric(&self, country: &str, metric: &str) -> Result<ResolvedMetric> {
        let metric = CrimeMetric::parse(metric)
            .ok_or_else(|| MetricsError::BadRequest(format!("unknown crime metric: {}", metric)))?;
        self.resolve(country, metric).await
    }
}
