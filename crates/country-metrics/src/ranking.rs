//! Rank-table helpers
//!
//! Cross-country tables arrive with several rows per country (one per year,
//! sometimes duplicates). These helpers collapse them to one row per country,
//! derive complementary metrics and assign ranks.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub country: String,
    pub name: String,
    pub value: f64,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

impl RankEntry {
    pub fn new(country: impl Into<String>, name: impl Into<String>, value: f64, year: i32) -> Self {
        Self {
            country: country.into(),
            name: name.into(),
            value,
            year,
            rank: None,
        }
    }
}

/// One row per country: highest value wins, ties go to the more recent year.
/// Output is ordered by country code.
pub fn dedupe_by_country(rows: impl IntoIterator<Item = RankEntry>) -> Vec<RankEntry> {
    let mut best: HashMap<String, RankEntry> = HashMap::new();

    for row in rows {
        if !row.value.is_finite() {
            continue;
        }
        match best.get(&row.country) {
            Some(current)
                if current.value > row.value
                    || (current.value == row.value && current.year >= row.year) => {}
            _ => {
                best.insert(row.country.clone(), row);
            }
        }
    }

    let mut out: Vec<RankEntry> = best.into_values().collect();
    out.sort_by(|a, b| a.country.cmp(&b.country));
    out
}

/// `total - value`, clamped at zero (e.g. rural % from urban %)
pub fn derive_complement(rows: &[RankEntry], total: f64) -> Vec<RankEntry> {
    rows.iter()
        .map(|r| RankEntry {
            value: (total - r.value).max(0.0),
            rank: None,
            ..r.clone()
        })
        .collect()
}

/// Sort descending by value (country code breaks ties) and number from 1
pub fn rank(mut rows: Vec<RankEntry>) -> Vec<RankEntry> {
    rows.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.country.cmp(&b.country))
    });
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = Some(i + 1);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_highest_then_latest() {
        let rows = vec![
            RankEntry::new("US", "United States", 82.0, 2020),
            RankEntry::new("US", "United States", 83.1, 2022),
            RankEntry::new("FR", "France", 81.0, 2019),
            RankEntry::new("FR", "France", 81.0, 2021),
            RankEntry::new("FR", "France", f64::NAN, 2023),
        ];
        let out = dedupe_by_country(rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].country, "FR");
        assert_eq!(out[0].year, 2021);
        assert_eq!(out[1].value, 83.1);
    }

    #[test]
    fn test_complement_clamps_at_zero() {
        let rows = vec![
            RankEntry::new("SG", "Singapore", 100.0, 2022),
            RankEntry::new("IN", "India", 36.0, 2022),
            RankEntry::new("XX", "Bad data", 100.4, 2022),
        ];
        let rural = derive_complement(&rows, 100.0);
        assert_eq!(rural[0].value, 0.0);
        assert_eq!(rural[1].value, 64.0);
        assert_eq!(rural[2].value, 0.0);
    }

    #[test]
    fn test_rank_descending_with_stable_ties() {
        let ranked = rank(vec![
            RankEntry::new("B", "b", 1.0, 2020),
            RankEntry::new("C", "c", 5.0, 2020),
            RankEntry::new("A", "a", 1.0, 2020),
        ]);
        let order: Vec<_> = ranked.iter().map(|r| (r.country.as_str(), r.rank)).collect();
        assert_eq!(order, vec![("C", Some(1)), ("A", Some(2)), ("B", Some(3))]);
    }
}
