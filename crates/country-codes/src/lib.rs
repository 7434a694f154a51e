//! Country Code Mapping
//!
//! Translates the application's canonical 2-letter country code into each
//! provider's native identifier:
//! - ISO 3166-1 alpha-3 (World Bank, UNODC bundled dataset)
//! - UN M49 numeric reporter codes (UN Comtrade)
//! - GEC 2-letter codes plus a macro-region directory (CIA World Factbook)
//! - English country names (Our World in Data)
//!
//! The tables are static and immutable; lookups never touch the network.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

mod table;

pub use table::FactbookRegion;
use table::COUNTRY_TABLE;

/// Maximum number of suggestions returned for an unknown code
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("Invalid country code: {0:?} (expected 2 letters)")]
    Invalid(String),
    #[error("No {provider} code for country {code}")]
    NotFound { code: String, provider: Provider },
}

pub type Result<T> = std::result::Result<T, CodeError>;

/// Upstream data sources that need their own code space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    WorldBank,
    Owid,
    Comtrade,
    Factbook,
    RestCountries,
    Unodc,
}

impl Provider {
    pub const ALL: [Provider; 6] = [
        Provider::WorldBank,
        Provider::Owid,
        Provider::Comtrade,
        Provider::Factbook,
        Provider::RestCountries,
        Provider::Unodc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorldBank => "world-bank",
            Self::Owid => "owid",
            Self::Comtrade => "comtrade",
            Self::Factbook => "factbook",
            Self::RestCountries => "rest-countries",
            Self::Unodc => "unodc",
        }
    }

    /// Parse a provider id, accepting a few common spellings
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "world-bank" | "worldbank" | "wb" => Some(Self::WorldBank),
            "owid" => Some(Self::Owid),
            "comtrade" | "un-comtrade" => Some(Self::Comtrade),
            "factbook" | "cia" => Some(Self::Factbook),
            "rest-countries" | "restcountries" => Some(Self::RestCountries),
            "unodc" | "crime" => Some(Self::Unodc),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the static country directory
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CountryRecord {
    pub alpha2: &'static str,
    pub alpha3: &'static str,
    /// UN Comtrade reporter code; `None` when Comtrade does not publish the country
    pub un_numeric: Option<&'static str>,
    pub gec: Option<&'static str>,
    pub factbook_region: Option<FactbookRegion>,
    /// English name as used by Our World in Data
    pub name: &'static str,
    /// World Bank WDI coverage
    pub world_bank: bool,
}

impl CountryRecord {
    /// Provider-native code for this country, if the provider covers it
    pub fn provider_code(&self, provider: Provider) -> Option<&'static str> {
        match provider {
            Provider::WorldBank => self.world_bank.then_some(self.alpha3),
            Provider::Unodc => Some(self.alpha3),
            Provider::Comtrade => self.un_numeric,
            Provider::Factbook => self.gec,
            Provider::Owid => Some(self.name),
            Provider::RestCountries => Some(self.alpha2),
        }
    }
}

static BY_ALPHA2: Lazy<HashMap<&'static str, &'static CountryRecord>> =
    Lazy::new(|| COUNTRY_TABLE.iter().map(|r| (r.alpha2, r)).collect());

static BY_ALPHA3: Lazy<HashMap<&'static str, &'static CountryRecord>> =
    Lazy::new(|| COUNTRY_TABLE.iter().map(|r| (r.alpha3, r)).collect());

/// Canonical 2-letter country code, always uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    /// Normalize user input: trims whitespace and uppercases.
    /// Only the shape is checked here; coverage is checked per provider.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CodeError::Invalid(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn record(&self) -> Option<&'static CountryRecord> {
        BY_ALPHA2.get(self.0.as_str()).copied()
    }

    pub fn is_known(&self) -> bool {
        self.record().is_some()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CountryCode {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        CountryCode::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Look up a canonical code (case-insensitive)
pub fn country(code: &str) -> Option<&'static CountryRecord> {
    BY_ALPHA2
        .get(code.trim().to_ascii_uppercase().as_str())
        .copied()
}

/// Reverse lookup from an ISO alpha-3 code
pub fn from_alpha3(alpha3: &str) -> Option<&'static CountryRecord> {
    BY_ALPHA3
        .get(alpha3.trim().to_ascii_uppercase().as_str())
        .copied()
}

/// Translate a canonical code into the provider's native identifier
pub fn to_provider_code(canonical: &str, provider: Provider) -> Result<&'static str> {
    let not_found = || CodeError::NotFound {
        code: canonical.trim().to_ascii_uppercase(),
        provider,
    };
    country(canonical)
        .and_then(|r| r.provider_code(provider))
        .ok_or_else(not_found)
}

/// Factbook documents live at `{region}/{gec}.json`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FactbookLocation {
    pub region: FactbookRegion,
    pub gec: &'static str,
}

impl FactbookLocation {
    pub fn path(&self) -> String {
        format!("{}/{}.json", self.region.as_str(), self.gec)
    }
}

pub fn factbook_location(canonical: &str) -> Result<FactbookLocation> {
    let record = country(canonical);
    match record.and_then(|r| Some((r.factbook_region?, r.gec?))) {
        Some((region, gec)) => Ok(FactbookLocation { region, gec }),
        None => Err(CodeError::NotFound {
            code: canonical.trim().to_ascii_uppercase(),
            provider: Provider::Factbook,
        }),
    }
}

/// Known codes whose code or name overlaps the input, for "did you mean" hints
pub fn suggestions(input: &str) -> Vec<&'static str> {
    let needle = input.trim().to_ascii_uppercase();
    if needle.is_empty() {
        return Vec::new();
    }

    COUNTRY_TABLE
        .iter()
        .filter(|r| match needle.len() {
            0..=2 => r.alpha2.contains(needle.as_str()),
            3 => {
                needle.starts_with(r.alpha2)
                    || r.alpha3 == needle
                    || r.name.to_ascii_uppercase().contains(needle.as_str())
            }
            _ => r.name.to_ascii_uppercase().contains(needle.as_str()),
        })
        .map(|r| r.alpha2)
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Every country in the directory, in table order
pub fn all_countries() -> &'static [CountryRecord] {
    COUNTRY_TABLE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_maps_deterministically() {
        for record in all_countries() {
            for provider in Provider::ALL {
                let first = to_provider_code(record.alpha2, provider);
                let second = to_provider_code(&record.alpha2.to_lowercase(), provider);
                assert_eq!(first, second, "{} / {}", record.alpha2, provider);
                if let Ok(code) = first {
                    assert!(!code.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(to_provider_code("de", Provider::WorldBank), Ok("DEU"));
        assert_eq!(to_provider_code(" De ", Provider::Comtrade), Ok("276"));
        assert_eq!(to_provider_code("de", Provider::Factbook), Ok("gm"));
        assert_eq!(to_provider_code("de", Provider::Owid), Ok("Germany"));
    }

    #[test]
    fn test_comtrade_special_reporter_codes() {
        assert_eq!(to_provider_code("US", Provider::Comtrade), Ok("842"));
        assert_eq!(to_provider_code("FR", Provider::Comtrade), Ok("251"));
        assert_eq!(to_provider_code("IN", Provider::Comtrade), Ok("699"));
    }

    #[test]
    fn test_missing_provider_entry_is_not_found() {
        assert_eq!(
            to_provider_code("MC", Provider::Comtrade),
            Err(CodeError::NotFound {
                code: "MC".to_string(),
                provider: Provider::Comtrade
            })
        );
        assert!(to_provider_code("TW", Provider::WorldBank).is_err());
        assert!(to_provider_code("ZZ", Provider::Owid).is_err());
    }

    #[test]
    fn test_factbook_location() {
        let loc = factbook_location("gb").unwrap();
        assert_eq!(loc.gec, "uk");
        assert_eq!(loc.path(), "europe/uk.json");

        let loc = factbook_location("JP").unwrap();
        assert_eq!(loc.path(), "east-n-southeast-asia/ja.json");

        assert!(factbook_location("QQ").is_err());
    }

    #[test]
    fn test_country_code_parse() {
        assert_eq!(CountryCode::parse(" us ").unwrap().as_str(), "US");
        assert!(CountryCode::parse("USA").is_err());
        assert!(CountryCode::parse("1A").is_err());
        assert!(CountryCode::parse("").is_err());
        assert!(!CountryCode::parse("ZZ").unwrap().is_known());
    }

    #[test]
    fn test_country_code_deserialize_normalizes() {
        let code: CountryCode = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(code.as_str(), "FR");
        assert!(serde_json::from_str::<CountryCode>("\"FRA\"").is_err());
    }

    #[test]
    fn test_suggestions_substring_match() {
        let hints = suggestions("USA");
        assert!(hints.contains(&"US"));

        let hints = suggestions("kingdom");
        assert_eq!(hints, vec!["GB"]);

        assert!(suggestions("").is_empty());
        assert!(suggestions("U").len() <= MAX_SUGGESTIONS);
    }

    #[test]
    fn test_alpha3_reverse_lookup() {
        assert_eq!(from_alpha3("bra").map(|r| r.alpha2), Some("BR"));
        assert!(from_alpha3("XYZ").is_none());
    }

    #[test]
    fn test_table_has_unique_codes() {
        let mut alpha2: Vec<_> = all_countries().iter().map(|r| r.alpha2).collect();
        alpha2.sort();
        alpha2.dedup();
        assert_eq!(alpha2.len(), all_countries().len());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("worldbank"), Some(Provider::WorldBank));
        assert_eq!(Provider::parse("REST_COUNTRIES"), Some(Provider::RestCountries));
        assert_eq!(Provider::parse("nope"), None);
        for provider in Provider::ALL {
            assert_eq!(Provider::parse(provider.as_str()), Some(provider));
        }
    }
}
