//! Latest-Value Resolver
//!
//! Picks the most recent valid observation from a sparse series. When the
//! requested dimension filter matches nothing, the filter is broadened in a
//! fixed order:
//!
//! | Tier | Constraint set                                   | Result                 |
//! |------|--------------------------------------------------|------------------------|
//! | 1    | filter as given                                  | latest row             |
//! | 2    | unit `Counts` swapped for rate per 100k          | latest row             |
//! | 3    | `dimension`/`category` dropped                   | sum of latest-year rows |
//! | 4    | `sex` also dropped                               | sum of latest-year rows |
//!
//! Tiers 3 and 4 turn category-coded tables (arrests by citizenship, victims
//! by sex) into a single country-level total. They only run for `Counts`
//! filters; rates are not additive. If no tier matches, the value is `null`,
//! never `0`.
//!
//! Ties on the maximum year go to the first observation in series order.

use serde::{Deserialize, Serialize};

use crate::observation::{MetricObservation, MetricSeries, Provenance, ResolvedMetric};

pub const UNIT_COUNTS: &str = "Counts";
pub const UNIT_RATE_PER_100K: &str = "Rate per 100,000 population";
pub const TOTAL: &str = "Total";

/// Categorical constraints; `None` means "any"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionFilter {
    pub dimension: Option<String>,
    pub category: Option<String>,
    pub sex: Option<String>,
    pub age: Option<String>,
    pub unit: Option<String>,
}

impl DimensionFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn dimension(mut self, v: impl Into<String>) -> Self {
        self.dimension = Some(v.into());
        self
    }

    pub fn category(mut self, v: impl Into<String>) -> Self {
        self.category = Some(v.into());
        self
    }

    pub fn sex(mut self, v: impl Into<String>) -> Self {
        self.sex = Some(v.into());
        self
    }

    pub fn age(mut self, v: impl Into<String>) -> Self {
        self.age = Some(v.into());
        self
    }

    pub fn unit(mut self, v: impl Into<String>) -> Self {
        self.unit = Some(v.into());
        self
    }

    pub fn matches(&self, obs: &MetricObservation) -> bool {
        let tags = &obs.tags;
        constraint_holds(&self.dimension, &tags.dimension)
            && constraint_holds(&self.category, &tags.category)
            && constraint_holds(&self.sex, &tags.sex)
            && constraint_holds(&self.age, &tags.age)
            && constraint_holds(&self.unit, &tags.unit)
    }

    fn wants_counts(&self) -> bool {
        self.unit
            .as_deref()
            .is_some_and(|u| u.eq_ignore_ascii_case(UNIT_COUNTS))
    }
}

fn constraint_holds(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match (wanted, actual) {
        (None, _) => true,
        (Some(w), Some(a)) => w.trim().eq_ignore_ascii_case(a.trim()),
        (Some(_), None) => false,
    }
}

/// Which broadening step produced the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    Exact,
    RateFallback,
    CategorySum,
    SexSum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: f64,
    pub year: i32,
    pub unit: Option<String>,
    pub tier: ResolutionTier,
    /// Rows contributing to the value (1 for single-row tiers)
    pub rows: usize,
}

/// First valid observation holding the maximum year
pub fn latest_valid<'a, I>(observations: I) -> Option<&'a MetricObservation>
where
    I: IntoIterator<Item = &'a MetricObservation>,
{
    let mut best: Option<&MetricObservation> = None;
    for obs in observations {
        if obs.valid_value().is_none() {
            continue;
        }
        match best {
            Some(b) if obs.year <= b.year => {}
            _ => best = Some(obs),
        }
    }
    best
}

fn latest_single(series: &MetricSeries, filter: &DimensionFilter, tier: ResolutionTier) -> Option<Resolution> {
    let obs = latest_valid(series.observations.iter().filter(|o| filter.matches(o)))?;
    Some(Resolution {
        value: obs.valid_value()?,
        year: obs.year,
        unit: obs.tags.unit.clone().or_else(|| filter.unit.clone()),
        tier,
        rows: 1,
    })
}

/// Sum the valid rows of the latest year. If a "Total" row is present for a
/// dropped dimension, only those rows are summed so totals never stack on
/// top of their own breakdown.
fn latest_year_sum(series: &MetricSeries, filter: &DimensionFilter, tier: ResolutionTier) -> Option<Resolution> {
    let matching: Vec<&MetricObservation> = series
        .observations
        .iter()
        .filter(|o| filter.matches(o) && o.valid_value().is_some())
        .collect();
    let year = matching.iter().map(|o| o.year).max()?;

    let mut rows: Vec<&MetricObservation> = matching.into_iter().filter(|o| o.year == year).collect();
    type Field = fn(&MetricObservation) -> Option<&str>;
    let fields: [Field; 3] = [
        |o| o.tags.dimension.as_deref(),
        |o| o.tags.category.as_deref(),
        |o| o.tags.sex.as_deref(),
    ];
    for field in fields {
        let is_total = |o: &&MetricObservation| field(o).is_some_and(|v| v.eq_ignore_ascii_case(TOTAL));
        if rows.iter().any(is_total) {
            rows.retain(is_total);
        }
    }

    let value = rows.iter().filter_map(|o| o.valid_value()).sum();
    Some(Resolution {
        value,
        year,
        unit: filter.unit.clone().or_else(|| rows[0].tags.unit.clone()),
        tier,
        rows: rows.len(),
    })
}

/// Run the tiers in order and report which one answered
pub fn resolve(series: &MetricSeries, filter: &DimensionFilter) -> Option<Resolution> {
    if let Some(r) = latest_single(series, filter, ResolutionTier::Exact) {
        return Some(r);
    }

    if !filter.wants_counts() {
        return None;
    }

    let rate = filter.clone().unit(UNIT_RATE_PER_100K);
    if let Some(r) = latest_single(series, &rate, ResolutionTier::RateFallback) {
        return Some(r);
    }

    let mut broadened = filter.clone();
    broadened.dimension = None;
    broadened.category = None;
    if broadened != *filter {
        if let Some(r) = latest_year_sum(series, &broadened, ResolutionTier::CategorySum) {
            return Some(r);
        }
    }

    if broadened.sex.is_some() {
        broadened.sex = None;
        return latest_year_sum(series, &broadened, ResolutionTier::SexSum);
    }

    None
}

/// Resolve a series into the caller-facing contract
pub fn resolve_latest(series: &MetricSeries, filter: &DimensionFilter, provenance: &Provenance) -> ResolvedMetric {
    match resolve(series, filter) {
        Some(r) => {
            let note = match r.tier {
                ResolutionTier::Exact => None,
                ResolutionTier::RateFallback => Some("counts unavailable; rate per 100,000 shown".to_string()),
                ResolutionTier::CategorySum => Some(format!("sum of {} category rows", r.rows)),
                ResolutionTier::SexSum => Some(format!("sum of {} rows by sex", r.rows)),
            };
            let metric = ResolvedMetric::available(r.value, Some(r.year), provenance, r.unit);
            match note {
                Some(n) => metric.with_note(n),
                None => metric,
            }
        }
        None => ResolvedMetric::unavailable(provenance, filter.unit.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::DimensionTags;

    fn prov() -> Provenance {
        Provenance::new("test source", "test org")
    }

    fn row(year: i32, value: Option<f64>, category: &str, sex: &str, unit: &str) -> MetricObservation {
        MetricObservation::new(year, value).with_tags(DimensionTags {
            dimension: Some(if category == TOTAL { TOTAL.into() } else { "by citizenship".into() }),
            category: Some(category.into()),
            sex: Some(sex.into()),
            age: Some(TOTAL.into()),
            unit: Some(unit.into()),
        })
    }

    fn total_filter() -> DimensionFilter {
        DimensionFilter::any()
            .dimension(TOTAL)
            .category(TOTAL)
            .sex(TOTAL)
            .age(TOTAL)
            .unit(UNIT_COUNTS)
    }

    #[test]
    fn test_single_observation_round_trip() {
        let series = MetricSeries::from_points("m", "US", [(2020, Some(42.0))]);
        let out = resolve_latest(&series, &DimensionFilter::any(), &prov());
        assert_eq!(out.value, Some(42.0));
        assert_eq!(out.year, Some(2020));
        assert_eq!(out.note, None);
    }

    #[test]
    fn test_nulls_skipped_max_year_wins() {
        let mut series = MetricSeries::new("m", "US");
        series.push(MetricObservation::new(2018, Some(10.0)).with_unit(UNIT_COUNTS));
        series.push(MetricObservation::new(2020, None).with_unit(UNIT_COUNTS));
        series.push(MetricObservation::new(2019, Some(20.0)).with_unit(UNIT_COUNTS));

        let out = resolve_latest(&series, &DimensionFilter::any().unit(UNIT_COUNTS), &prov());
        assert_eq!(out.value, Some(20.0));
        assert_eq!(out.year, Some(2019));
    }

    #[test]
    fn test_tie_on_year_first_in_order_wins() {
        let series = MetricSeries::from_points("m", "US", [(2021, Some(1.0)), (2021, Some(2.0)), (2019, Some(3.0))]);
        let out = resolve_latest(&series, &DimensionFilter::any(), &prov());
        assert_eq!(out.value, Some(1.0));
    }

    #[test]
    fn test_empty_series_is_unavailable_not_error() {
        let series = MetricSeries::new("m", "US");
        let out = resolve_latest(&series, &total_filter(), &prov());
        assert_eq!(out.value, None);
        assert_eq!(out.year, None);
        assert_eq!(out.source, "test source");
    }

    #[test]
    fn test_exact_total_row_preferred_over_sum() {
        let mut series = MetricSeries::new("arrests", "DE");
        series.push(row(2021, Some(500.0), TOTAL, TOTAL, UNIT_COUNTS));
        series.push(row(2021, Some(300.0), "Nationals", TOTAL, UNIT_COUNTS));
        series.push(row(2021, Some(200.0), "Foreign citizens", TOTAL, UNIT_COUNTS));

        let r = resolve(&series, &total_filter()).unwrap();
        assert_eq!(r.tier, ResolutionTier::Exact);
        assert_eq!(r.value, 500.0);
    }

    #[test]
    fn test_rate_fallback_before_sum() {
        let mut series = MetricSeries::new("homicide", "BR");
        series.push(row(2020, Some(22.4), TOTAL, TOTAL, UNIT_RATE_PER_100K));
        series.push(row(2021, Some(300.0), "Nationals", TOTAL, UNIT_COUNTS));

        let r = resolve(&series, &total_filter()).unwrap();
        assert_eq!(r.tier, ResolutionTier::RateFallback);
        assert_eq!(r.value, 22.4);
        assert_eq!(r.unit.as_deref(), Some(UNIT_RATE_PER_100K));
    }

    #[test]
    fn test_sums_citizenship_rows_without_total() {
        let mut series = MetricSeries::new("arrests", "FR");
        series.push(row(2020, Some(100.0), "Nationals", TOTAL, UNIT_COUNTS));
        series.push(row(2021, Some(300.0), "Nationals", TOTAL, UNIT_COUNTS));
        series.push(row(2021, Some(120.0), "Foreign citizens", TOTAL, UNIT_COUNTS));
        series.push(row(2021, None, "Unknown", TOTAL, UNIT_COUNTS));

        let out = resolve_latest(&series, &total_filter(), &prov());
        assert_eq!(out.value, Some(420.0));
        assert_eq!(out.year, Some(2021));
        assert_eq!(out.note.as_deref(), Some("sum of 2 category rows"));
    }

    #[test]
    fn test_sums_rows_by_sex() {
        let mut series = MetricSeries::new("victims", "IT");
        series.push(row(2022, Some(61.0), TOTAL, "Male", UNIT_COUNTS));
        series.push(row(2022, Some(54.0), TOTAL, "Female", UNIT_COUNTS));

        let filter = DimensionFilter::any().sex(TOTAL).age(TOTAL).unit(UNIT_COUNTS);
        let r = resolve(&series, &filter).unwrap();
        assert_eq!(r.tier, ResolutionTier::SexSum);
        assert_eq!(r.value, 115.0);
    }

    #[test]
    fn test_rates_by_sex_are_never_summed() {
        let mut series = MetricSeries::new("homicide_rate", "IT");
        series.push(row(2021, Some(1.2), TOTAL, "Male", UNIT_RATE_PER_100K));
        series.push(row(2021, Some(0.5), TOTAL, "Female", UNIT_RATE_PER_100K));

        let filter = DimensionFilter::any().dimension(TOTAL).sex(TOTAL).age(TOTAL).unit(UNIT_RATE_PER_100K);
        assert_eq!(resolve(&series, &filter), None);

        let out = resolve_latest(&series, &filter, &prov());
        assert_eq!(out.value, None);
        assert_eq!(out.unit.as_deref(), Some(UNIT_RATE_PER_100K));
    }

    #[test]
    fn test_true_zero_is_not_null() {
        let mut series = MetricSeries::new("arrests", "IS");
        series.push(row(2021, Some(0.0), "Nationals", TOTAL, UNIT_COUNTS));
        series.push(row(2021, Some(0.0), "Foreign citizens", TOTAL, UNIT_COUNTS));

        let out = resolve_latest(&series, &total_filter(), &prov());
        assert_eq!(out.value, Some(0.0));
    }

    #[test]
    fn test_no_tier_matches_yields_null() {
        let mut series = MetricSeries::new("arrests", "IS");
        series.push(row(2021, Some(5.0), "Nationals", TOTAL, "Percentage"));

        let out = resolve_latest(&series, &total_filter(), &prov());
        assert_eq!(out.value, None);
        assert_eq!(out.year, None);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let mut series = MetricSeries::new("m", "US");
        series.push(MetricObservation::new(2020, Some(7.0)).with_unit("counts"));
        let r = resolve(&series, &DimensionFilter::any().unit(UNIT_COUNTS)).unwrap();
        assert_eq!(r.value, 7.0);
    }
}
