//! Unit formatting and free-text number parsing

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const BILLION: f64 = 1_000_000_000.0;
const MILLION: f64 = 1_000_000.0;
const TRILLION: f64 = 1_000_000_000_000.0;

/// First number in a Factbook field plus the word or sign right after it
static NUMBER_WITH_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(-?\d[\d,]*(?:\.\d+)?)\s*(%|trillion|billion|million)?")
        .expect("static regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeScale {
    Billions,
    Millions,
    Dollars,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedValue {
    /// Original dollar amount
    pub raw: f64,
    /// Amount in `scale` units, one decimal for millions/billions
    pub value: f64,
    pub scale: TradeScale,
    pub formatted: String,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Two buckets only: >= 1e9 in billions, >= 1e6 in millions, otherwise whole
/// dollars with thousands separators. Buckets use the magnitude after
/// rounding, so the text never disagrees with `value`; deficits get a leading
/// minus.
pub fn format_trade_value(amount: f64) -> FormattedValue {
    let sign = if amount < 0.0 { "-" } else { "" };
    let magnitude = amount.abs();

    let dollars = magnitude.round();
    let millions = round1(magnitude / MILLION);
    let (value, scale, formatted) = if dollars < MILLION {
        (dollars, TradeScale::Dollars, format!("{}${}", sign, group_thousands(dollars as u64)))
    } else if millions < 1_000.0 {
        (millions, TradeScale::Millions, format!("{}${:.1}M", sign, millions))
    } else {
        let billions = round1(magnitude / BILLION);
        (billions, TradeScale::Billions, format!("{}${:.1}B", sign, billions))
    };

    FormattedValue {
        raw: amount,
        value: if amount < 0.0 { -value } else { value },
        scale,
        formatted,
    }
}

/// Partner share of a total as a percentage string with one decimal
pub fn partner_share(partner_value: f64, total_value: f64) -> String {
    if total_value == 0.0 {
        return "0".to_string();
    }
    format!("{:.1}", partner_value / total_value * 100.0)
}

/// Parse the first numeric token of a Factbook string, applying a
/// million/billion/trillion multiplier. Percentages come back bare.
pub fn parse_factbook_number(text: &str) -> Option<f64> {
    let caps = NUMBER_WITH_SUFFIX.captures(text)?;
    let number: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;

    let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(s) if s == "trillion" => TRILLION,
        Some(s) if s == "billion" => BILLION,
        Some(s) if s == "million" => MILLION,
        _ => 1.0,
    };
    Some(number * multiplier)
}

/// Whether the first numeric token is a percentage
pub fn is_percentage(text: &str) -> bool {
    NUMBER_WITH_SUFFIX
        .captures(text)
        .and_then(|c| c.get(2))
        .is_some_and(|m| m.as_str() == "%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_value_billions_bucket_has_no_trillions() {
        let f = format_trade_value(1_645_000_000_000.0);
        assert_eq!(f.scale, TradeScale::Billions);
        assert_eq!(f.value, 1645.0);
        assert_eq!(f.formatted, "$1645.0B");
    }

    #[test]
    fn test_trade_value_millions_and_dollars() {
        let f = format_trade_value(12_345_678.0);
        assert_eq!(f.value, 12.3);
        assert_eq!(f.formatted, "$12.3M");

        let f = format_trade_value(999_999.0);
        assert_eq!(f.scale, TradeScale::Dollars);
        assert_eq!(f.formatted, "$999,999");

        assert_eq!(format_trade_value(0.0).formatted, "$0");
        assert_eq!(format_trade_value(1_000.0).formatted, "$1,000");
    }

    #[test]
    fn test_trade_value_bucket_edges() {
        assert_eq!(format_trade_value(1_000_000_000.0).formatted, "$1.0B");
        assert_eq!(format_trade_value(1_000_000.0).formatted, "$1.0M");
    }

    #[test]
    fn test_trade_value_text_matches_rounded_value() {
        let f = format_trade_value(1_250_000_000.0);
        assert_eq!(f.value, 1.3);
        assert_eq!(f.formatted, "$1.3B");

        let f = format_trade_value(999_999.6);
        assert_eq!(f.scale, TradeScale::Millions);
        assert_eq!(f.value, 1.0);
        assert_eq!(f.formatted, "$1.0M");

        let f = format_trade_value(999_960_000.0);
        assert_eq!(f.scale, TradeScale::Billions);
        assert_eq!(f.formatted, "$1.0B");
    }

    #[test]
    fn test_trade_deficit_keeps_sign() {
        let f = format_trade_value(-773_400_000_000.0);
        assert_eq!(f.formatted, "-$773.4B");
        assert_eq!(f.value, -773.4);
    }

    #[test]
    fn test_partner_share() {
        assert_eq!(partner_share(25.0, 200.0), "12.5");
        assert_eq!(partner_share(1.0, 3.0), "33.3");
        assert_eq!(partner_share(5.0, 0.0), "0");
    }

    #[test]
    fn test_parse_factbook_numbers() {
        assert_eq!(parse_factbook_number("$25.46 trillion (2022 est.)"), Some(25.46e12));
        assert_eq!(parse_factbook_number("334,914,895 (2023 est.)"), Some(334_914_895.0));
        assert_eq!(parse_factbook_number("$2.1 billion"), Some(2.1e9));
        assert_eq!(parse_factbook_number("38.5 million (2020)"), Some(38.5e6));
        assert_eq!(parse_factbook_number("total: 9,833,517 sq km"), Some(9_833_517.0));
        assert_eq!(parse_factbook_number("no data"), None);
    }

    #[test]
    fn test_percentage_is_not_multiplied() {
        assert_eq!(parse_factbook_number("3.6% (2023 est.)"), Some(3.6));
        assert_eq!(parse_factbook_number("-0.3% (2020 est.)"), Some(-0.3));
        assert!(is_percentage("3.6% (2023 est.)"));
        assert!(!is_percentage("$2.1 billion"));
    }
}
