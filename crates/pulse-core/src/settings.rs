//! User settings: provider API keys and the messaging target.
//!
//! Persisted as two independent JSON blobs; each one loads or falls back to
//! defaults on its own.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::Result;
use crate::provider::ProviderKind;

const TELEGRAM_FILE: &str = "telegram_config.json";
const API_KEYS_FILE: &str = "api_keys.json";

/// Per-provider API keys, stored as opaque strings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepseek: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grok: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qwen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chatgpt: Option<String>,
}

impl ApiKeys {
    /// Non-blank key stored for `kind`
    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        let slot = match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::DeepSeek => &self.deepseek,
            ProviderKind::Grok => &self.grok,
            ProviderKind::Qwen => &self.qwen,
            ProviderKind::ChatGpt => &self.chatgpt,
        };
        slot.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn set(&mut self, kind: ProviderKind, key: impl Into<String>) {
        let slot = match kind {
            ProviderKind::Gemini => &mut self.gemini,
            ProviderKind::DeepSeek => &mut self.deepseek,
            ProviderKind::Grok => &mut self.grok,
            ProviderKind::Qwen => &mut self.qwen,
            ProviderKind::ChatGpt => &mut self.chatgpt,
        };
        *slot = Some(key.into());
    }

    /// Copy safe to show back to the user: only the last four characters
    pub fn masked(&self) -> Self {
        let mut out = Self::default();
        for kind in ProviderKind::ALL {
            if let Some(key) = self.get(kind) {
                out.set(kind, mask(key));
            }
        }
        out
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****{tail}")
}

/// Messaging target as configured by the user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramConfig {
    /// Deliverable target, only when enabled and fully filled in
    pub fn target(&self) -> Option<TelegramTarget> {
        let token = self.bot_token.trim();
        let chat = self.chat_id.trim();
        (self.enabled && !token.is_empty() && !chat.is_empty()).then(|| TelegramTarget {
            bot_token: token.to_string(),
            chat_id: chat.to_string(),
        })
    }
}

/// Bot token + chat pair a message can actually be sent to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramTarget {
    pub bot_token: String,
    pub chat_id: String,
}

/// Everything the user can configure
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub telegram: TelegramConfig,
    pub api_keys: ApiKeys,
}

/// File-backed settings with an in-memory copy
pub struct SettingsStore {
    dir: PathBuf,
    current: RwLock<Settings>,
}

impl SettingsStore {
    /// Load settings from `dir`. Missing or malformed files fall back to
    /// defaults; this never fails.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let settings = Settings {
            telegram: load_blob(&dir.join(TELEGRAM_FILE)),
            api_keys: load_blob(&dir.join(API_KEYS_FILE)),
        };
        tracing::info!(
            dir = %dir.display(),
            telegram_enabled = settings.telegram.enabled,
            keys = ProviderKind::ALL.iter().filter(|k| settings.api_keys.get(**k).is_some()).count(),
            "settings loaded"
        );
        Self {
            dir,
            current: RwLock::new(settings),
        }
    }

    pub fn current(&self) -> Settings {
        self.current
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn api_keys(&self) -> ApiKeys {
        self.current().api_keys
    }

    pub fn telegram(&self) -> TelegramConfig {
        self.current().telegram
    }

    /// Replace and persist both blobs
    pub fn save(&self, settings: Settings) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        write_blob(&self.dir.join(TELEGRAM_FILE), &settings.telegram)?;
        write_blob(&self.dir.join(API_KEYS_FILE), &settings.api_keys)?;

        if let Ok(mut guard) = self.current.write() {
            *guard = settings;
        }
        Ok(())
    }
}

fn load_blob<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> T {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
            T::default()
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => T::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "settings file unreadable");
            T::default()
        }
    }
}

fn write_blob<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(tmp, path)?;
    Ok(())
}
