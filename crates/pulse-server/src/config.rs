//! Server configuration from environment variables

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use pulse_core::{ApiKeys, ProviderKind};

/// Which spot-price source to poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceSource {
    CoinGecko,
    Mock,
}

#[derive(Clone, Debug)]
pub struct PulseConfig {
    pub bind_addr: String,
    pub refresh_interval: Duration,
    pub settle_delay: Duration,
    pub notify_pause: Duration,
    pub default_provider: ProviderKind,
    pub settings_dir: PathBuf,
    pub output_language: String,
    pub price_source: PriceSource,
    /// Environment-level keys, one slot per provider
    pub env_keys: ApiKeys,
}

impl PulseConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; unset and blank values take defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let millis = |name: &str, default: u64| -> anyhow::Result<Duration> {
            var(name).map_or(Ok(Duration::from_millis(default)), |raw| {
                raw.trim()
                    .parse()
                    .map(Duration::from_millis)
                    .with_context(|| format!("{name} must be a number of milliseconds"))
            })
        };

        let default_provider = match var("PULSE_DEFAULT_PROVIDER") {
            Some(raw) => raw.parse::<ProviderKind>().context("PULSE_DEFAULT_PROVIDER")?,
            None => ProviderKind::default(),
        };

        let price_source = match var("PULSE_PRICE_FEED").as_deref().map(str::trim) {
            None | Some("coingecko") => PriceSource::CoinGecko,
            Some("mock") => PriceSource::Mock,
            Some(other) => bail!("PULSE_PRICE_FEED must be `coingecko` or `mock`, got `{other}`"),
        };

        let refresh_interval = millis("PULSE_REFRESH_INTERVAL_MS", 600_000)?;
        if refresh_interval.is_zero() {
            bail!("PULSE_REFRESH_INTERVAL_MS must be positive");
        }

        // `{ID}_API_KEY` per provider; bare `API_KEY` only ever means Gemini
        let mut env_keys = ApiKeys::default();
        for kind in ProviderKind::ALL {
            let mut key = var(&format!("{}_API_KEY", kind.label()));
            if kind == ProviderKind::Gemini {
                key = key.or_else(|| var("API_KEY"));
            }
            if let Some(key) = key {
                env_keys.set(kind, key.trim());
            }
        }

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            refresh_interval,
            settle_delay: millis("PULSE_SETTLE_DELAY_MS", 500)?,
            notify_pause: millis("PULSE_NOTIFY_PAUSE_MS", 500)?,
            default_provider,
            settings_dir: var("PULSE_SETTINGS_DIR").map_or_else(|| PathBuf::from("data"), PathBuf::from),
            output_language: var("PULSE_OUTPUT_LANGUAGE")
                .unwrap_or_else(|| "Simplified Chinese".into()),
            price_source,
            env_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<PulseConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        PulseConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
        assert_eq!(cfg.refresh_interval, Duration::from_secs(600));
        assert_eq!(cfg.settle_delay, Duration::from_millis(500));
        assert_eq!(cfg.notify_pause, Duration::from_millis(500));
        assert_eq!(cfg.default_provider, ProviderKind::Gemini);
        assert_eq!(cfg.settings_dir, PathBuf::from("data"));
        assert_eq!(cfg.output_language, "Simplified Chinese");
        assert_eq!(cfg.price_source, PriceSource::CoinGecko);
        assert_eq!(cfg.env_keys, ApiKeys::default());
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("PULSE_REFRESH_INTERVAL_MS", "60000"),
            ("PULSE_DEFAULT_PROVIDER", "deepseek"),
            ("PULSE_PRICE_FEED", "mock"),
            ("API_KEY", "generic"),
        ])
        .unwrap();
        assert_eq!(cfg.refresh_interval, Duration::from_secs(60));
        assert_eq!(cfg.default_provider, ProviderKind::DeepSeek);
        assert_eq!(cfg.price_source, PriceSource::Mock);
        assert_eq!(cfg.env_keys.get(ProviderKind::Gemini), Some("generic"));
    }

    #[test]
    fn gemini_key_beats_generic_key() {
        let cfg = config(&[("API_KEY", "generic"), ("GEMINI_API_KEY", "specific")]).unwrap();
        assert_eq!(cfg.env_keys.get(ProviderKind::Gemini), Some("specific"));
    }

    #[test]
    fn gemini_key_stays_with_gemini_under_another_default() {
        let cfg = config(&[
            ("PULSE_DEFAULT_PROVIDER", "deepseek"),
            ("GEMINI_API_KEY", "AIza-gemini"),
            ("QWEN_API_KEY", "q-env"),
        ])
        .unwrap();
        assert_eq!(cfg.default_provider, ProviderKind::DeepSeek);
        assert_eq!(cfg.env_keys.get(ProviderKind::Gemini), Some("AIza-gemini"));
        assert_eq!(cfg.env_keys.get(ProviderKind::DeepSeek), None);
        assert_eq!(cfg.env_keys.get(ProviderKind::Qwen), Some("q-env"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("PULSE_DEFAULT_PROVIDER", "claude")]).is_err());
        assert!(config(&[("PULSE_SETTLE_DELAY_MS", "soon")]).is_err());
        assert!(config(&[("PULSE_REFRESH_INTERVAL_MS", "0")]).is_err());
        assert!(config(&[("PULSE_PRICE_FEED", "binance")]).is_err());
    }
}
