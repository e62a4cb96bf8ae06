//! Domain Models
//!
//! Market findings produced by an analysis provider. Every item is created
//! fresh per poll cycle and replaced wholesale by the next cycle.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderKind;

/// Trade recommendation attached to a finding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
    Hold,
}

impl Signal {
    /// Lenient parse of whatever the model wrote; unknown values fall back
    /// to `Neutral`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BUY" => Self::Buy,
            "SELL" => Self::Sell,
            "HOLD" => Self::Hold,
            _ => Self::Neutral,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Neutral => "NEUTRAL",
            Self::Hold => "HOLD",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analysis finding
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    /// Provider-assigned or synthesized; not unique across cycles
    pub id: String,

    /// Always a valid instant after normalization
    pub timestamp: DateTime<Utc>,

    pub title: String,

    pub summary: String,

    /// Free-text source label
    pub source: String,

    /// Ticker symbols in the order the provider listed them
    pub related_coins: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_chain_insight: Option<String>,

    pub signal: Signal,

    /// Model confidence in the signal, 0-100
    pub confidence: u8,

    /// Reliability score of the source, 0-10
    pub source_credibility: u8,

    /// Citation link, only set from grounding metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One poll result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    pub items: Vec<MarketItem>,

    pub overall_sentiment: String,

    /// Wall-clock time of the fetch, not of the items
    pub last_updated: DateTime<Utc>,

    /// Which provider produced the report
    pub provider: ProviderKind,
}

/// Coerce a model-written timestamp into a valid instant.
///
/// Accepts RFC 3339, naive date-times and bare dates. Anything else,
/// including a missing value, becomes `now`.
///
/// Offset-less values are read as UTC on purpose, not in the host's local
/// zone, so the watermark comparison does not depend on where the server runs.
pub fn coerce_timestamp(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(parse_instant)
        .unwrap_or(now)
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn valid_rfc3339_is_kept() {
        let ts = coerce_timestamp(Some("2025-02-28T08:30:00Z"), now());
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 2, 28, 8, 30, 0).unwrap());

        let offset = coerce_timestamp(Some("2025-02-28T16:30:00+08:00"), now());
        assert_eq!(offset, Utc.with_ymd_and_hms(2025, 2, 28, 8, 30, 0).unwrap());
    }

    #[test]
    fn naive_and_date_only_inputs_are_read_as_utc() {
        assert_eq!(
            coerce_timestamp(Some("2025-02-28 08:30:00"), now()),
            Utc.with_ymd_and_hms(2025, 2, 28, 8, 30, 0).unwrap()
        );
        assert_eq!(
            coerce_timestamp(Some("2025-02-28"), now()),
            Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn garbage_becomes_now() {
        for raw in ["ISO8601_time", "yesterday", "", "2025-13-45T99:00:00Z"] {
            assert_eq!(coerce_timestamp(Some(raw), now()), now(), "input {raw:?}");
        }
        assert_eq!(coerce_timestamp(None, now()), now());
    }

    #[test]
    fn signal_parsing_is_lenient() {
        assert_eq!(Signal::parse_lenient("buy"), Signal::Buy);
        assert_eq!(Signal::parse_lenient(" HOLD "), Signal::Hold);
        assert_eq!(Signal::parse_lenient("BUY/SELL"), Signal::Neutral);
    }

    #[test]
    fn item_serializes_in_camel_case() {
        let item = MarketItem {
            id: "a".into(),
            timestamp: now(),
            title: "t".into(),
            summary: "s".into(),
            source: "src".into(),
            related_coins: vec!["BTC".into()],
            on_chain_insight: None,
            signal: Signal::Buy,
            confidence: 80,
            source_credibility: 7,
            url: None,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["relatedCoins"][0], "BTC");
        assert_eq!(value["sourceCredibility"], 7);
        assert_eq!(value["signal"], "BUY");
        assert!(value.get("url").is_none());
    }
}
