//! Turning recovered model JSON into a `MarketReport`.
//!
//! Both adapter shapes share this path: extract, check for `items`, then
//! normalize each entry (timestamps coerced, scores clamped, ids filled in).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{PulseError, Result};
use crate::extract::extract_json;
use crate::market::{MarketItem, MarketReport, Signal, coerce_timestamp};
use crate::provider::ProviderKind;

/// Report payload as written by the model, before normalization
#[derive(Debug, Clone)]
pub struct RawReport {
    pub overall_sentiment: Option<String>,
    pub items: Vec<RawItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawItem {
    pub id: Option<Value>,
    pub timestamp: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub source: Option<String>,
    pub related_coins: Option<Vec<String>>,
    pub on_chain_insight: Option<String>,
    pub signal: Option<String>,
    pub confidence: Option<Value>,
    pub source_credibility: Option<Value>,
}

impl RawReport {
    /// Recover the report from free-form model text.
    ///
    /// Fails when no JSON can be extracted or the object has no `items`
    /// array. Individual entries that are not objects are skipped.
    pub fn from_text(text: &str) -> Result<Self> {
        let value = extract_json(text)
            .ok_or_else(|| PulseError::MalformedPayload("no JSON object in response".into()))?;

        let items = value
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| PulseError::MalformedPayload("missing `items` array".into()))?;

        let items = items
            .iter()
            .filter_map(|entry| match RawItem::deserialize(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable report item");
                    None
                }
            })
            .collect();

        Ok(Self {
            overall_sentiment: value
                .get("overallSentiment")
                .and_then(Value::as_str)
                .map(str::to_owned),
            items,
        })
    }

    /// Normalize into a report stamped with `now`.
    ///
    /// `citations[i]` becomes the `url` of item `i` when present; callers
    /// without grounding metadata pass an empty slice.
    pub fn into_report(
        self,
        provider: ProviderKind,
        citations: &[Option<String>],
        now: DateTime<Utc>,
    ) -> MarketReport {
        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let url = citations.get(index).cloned().flatten();
                raw.into_item(url, now)
            })
            .collect();

        MarketReport {
            items,
            overall_sentiment: self.overall_sentiment.unwrap_or_default(),
            last_updated: now,
            provider,
        }
    }
}

impl RawItem {
    fn into_item(self, url: Option<String>, now: DateTime<Utc>) -> MarketItem {
        MarketItem {
            id: self
                .id
                .as_ref()
                .and_then(id_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            timestamp: coerce_timestamp(self.timestamp.as_deref(), now),
            title: self.title.unwrap_or_default(),
            summary: self.summary.unwrap_or_default(),
            source: self.source.unwrap_or_default(),
            related_coins: self.related_coins.unwrap_or_default(),
            on_chain_insight: self.on_chain_insight.filter(|s| !s.trim().is_empty()),
            signal: self
                .signal
                .as_deref()
                .map_or(Signal::Neutral, Signal::parse_lenient),
            confidence: score(self.confidence.as_ref(), 100),
            source_credibility: score(self.source_credibility.as_ref(), 10),
            url,
        }
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a number or numeric string and clamp it into `0..=max`.
fn score(value: Option<&Value>, max: u8) -> u8 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    raw.filter(|v| v.is_finite())
        .map_or(0, |v| v.round().clamp(0.0, f64::from(max)) as u8)
}
