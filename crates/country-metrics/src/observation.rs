//! Observation model shared by every provider adapter

use serde::{Deserialize, Serialize};

/// Categorical coordinates of one row in a statistical table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionTags {
    pub dimension: Option<String>,
    pub category: Option<String>,
    pub sex: Option<String>,
    pub age: Option<String>,
    pub unit: Option<String>,
}

/// A single data point as parsed from a provider response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricObservation {
    pub value: Option<f64>,
    pub year: i32,
    #[serde(default)]
    pub tags: DimensionTags,
}

impl MetricObservation {
    pub fn new(year: i32, value: Option<f64>) -> Self {
        Self {
            value,
            year,
            tags: DimensionTags::default(),
        }
    }

    pub fn with_tags(mut self, tags: DimensionTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.tags.unit = Some(unit.into());
        self
    }

    /// NaN counts as missing
    pub fn valid_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}

/// All observations for one (metric, country) pair.
/// Not necessarily sorted or contiguous; may contain nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub metric: String,
    pub country: String,
    pub observations: Vec<MetricObservation>,
}

impl MetricSeries {
    pub fn new(metric: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            country: country.into(),
            observations: Vec::new(),
        }
    }

    /// Build an untagged series from (year, value) pairs
    pub fn from_points<I>(metric: impl Into<String>, country: impl Into<String>, points: I) -> Self
    where
        I: IntoIterator<Item = (i32, Option<f64>)>,
    {
        let mut series = Self::new(metric, country);
        series.observations = points
            .into_iter()
            .map(|(year, value)| MetricObservation::new(year, value))
            .collect();
        series
    }

    pub fn push(&mut self, observation: MetricObservation) {
        self.observations.push(observation);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Where a value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: String,
    pub organization: String,
}

impl Provenance {
    pub fn new(source: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            organization: organization.into(),
        }
    }

    /// Placeholder data is always labelled in the source string
    pub fn sample(&self) -> Self {
        Self {
            source: format!("{} (sample data)", self.source),
            organization: self.organization.clone(),
        }
    }
}

/// Output contract returned to callers regardless of provider.
///
/// `value == None` always implies `year == None`; provenance is always
/// populated so callers can say "no data from X".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMetric {
    pub value: Option<f64>,
    pub year: Option<i32>,
    pub source: String,
    pub source_organization: String,
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ResolvedMetric {
    pub fn available(value: f64, year: Option<i32>, provenance: &Provenance, unit: Option<String>) -> Self {
        Self {
            value: Some(value),
            year,
            source: provenance.source.clone(),
            source_organization: provenance.organization.clone(),
            unit,
            note: None,
        }
    }

    pub fn unavailable(provenance: &Provenance, unit: Option<String>) -> Self {
        Self {
            value: None,
            year: None,
            source: provenance.source.clone(),
            source_organization: provenance.organization.clone(),
            unit,
            note: None,
        }
    }

    /// Keeps the null-value/null-year invariant for values of unknown presence
    pub fn from_parts(
        value: Option<f64>,
        year: Option<i32>,
        provenance: &Provenance,
        unit: Option<String>,
    ) -> Self {
        match value.filter(|v| v.is_finite()) {
            Some(v) => Self::available(v, year, provenance, unit),
            None => Self::unavailable(provenance, unit),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wb() -> Provenance {
        Provenance::new("World Development Indicators", "World Bank")
    }

    #[test]
    fn test_unavailable_keeps_provenance() {
        let metric = ResolvedMetric::unavailable(&wb(), Some("%".into()));
        assert_eq!(metric.value, None);
        assert_eq!(metric.year, None);
        assert_eq!(metric.source_organization, "World Bank");
    }

    #[test]
    fn test_from_parts_clears_year_without_value() {
        let metric = ResolvedMetric::from_parts(None, Some(2020), &wb(), None);
        assert_eq!(metric.year, None);

        let metric = ResolvedMetric::from_parts(Some(f64::NAN), Some(2020), &wb(), None);
        assert!(!metric.is_available());
        assert_eq!(metric.year, None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let metric = ResolvedMetric::available(1.5, Some(2021), &wb(), None);
        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(json["sourceOrganization"], "World Bank");
        assert_eq!(json["year"], 2021);
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_sample_provenance_is_labelled() {
        assert!(wb().sample().source.contains("(sample data)"));
    }
}
