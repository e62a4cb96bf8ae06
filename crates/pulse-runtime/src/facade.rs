//! Analysis Facade
//!
//! The single seam the orchestrator talks to: resolve a credential, build
//! the prompt, dispatch to the adapter registered for the provider.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};

use pulse_core::{
    AnalysisProvider, ApiKeys, MarketReport, PromptBuilder, ProviderKind, PulseError, Result,
};

use crate::chat_completion::ChatCompletionProvider;
use crate::gemini::GeminiProvider;

/// Provider registry plus credential resolution
pub struct AnalysisService {
    prompts: PromptBuilder,
    adapters: HashMap<ProviderKind, Arc<dyn AnalysisProvider>>,
    default_provider: ProviderKind,
    env_keys: ApiKeys,
}

impl AnalysisService {
    /// Empty registry; adapters are added with [`Self::register`]
    pub fn new(prompts: PromptBuilder, default_provider: ProviderKind) -> Self {
        Self {
            prompts,
            adapters: HashMap::new(),
            default_provider,
            env_keys: ApiKeys::default(),
        }
    }

    /// Registry with the production adapter for every provider
    pub fn with_default_providers(prompts: PromptBuilder, default_provider: ProviderKind) -> Self {
        let mut service = Self::new(prompts, default_provider);
        service.register(Arc::new(GeminiProvider::new()));
        for kind in ProviderKind::ALL {
            if let Some(adapter) = ChatCompletionProvider::for_kind(kind) {
                service.register(Arc::new(adapter));
            }
        }
        service
    }

    /// Environment-level keys, each used only for its own provider when
    /// the user stored none.
    #[must_use]
    pub fn with_env_keys(mut self, keys: ApiKeys) -> Self {
        self.env_keys = keys;
        self
    }

    /// Add or replace the adapter serving `adapter.kind()`
    pub fn register(&mut self, adapter: Arc<dyn AnalysisProvider>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub const fn default_provider(&self) -> ProviderKind {
        self.default_provider
    }

    /// User key first, then the environment key for the same provider
    pub fn resolve_credential<'a>(&'a self, kind: ProviderKind, keys: &'a ApiKeys) -> Option<&'a str> {
        keys.get(kind).or_else(|| self.env_keys.get(kind))
    }

    pub fn has_credential(&self, kind: ProviderKind, keys: &ApiKeys) -> bool {
        self.resolve_credential(kind, keys).is_some()
    }

    /// Produce a report with `kind`.
    ///
    /// Fails with `MissingCredential` before any network call when no key
    /// resolves. Adapter failures are logged and returned unchanged.
    pub async fn analyze(&self, kind: ProviderKind, keys: &ApiKeys) -> Result<MarketReport> {
        let Some(credential) = self.resolve_credential(kind, keys) else {
            return Err(PulseError::MissingCredential(kind));
        };
        let adapter = self
            .adapters
            .get(&kind)
            .ok_or_else(|| PulseError::UnknownProvider(kind.to_string()))?;

        let prompt = self.prompts.build(kind, Utc::now());
        debug!(
            provider = %kind,
            language = self.prompts.language(),
            prompt_chars = prompt.len(),
            "dispatching analysis"
        );

        adapter
            .produce_report(&prompt, credential)
            .await
            .inspect_err(|e| error!(provider = %kind, error = %e, "analysis failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every call instead of touching the network
    struct RecordingProvider {
        kind: ProviderKind,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl RecordingProvider {
        fn new(kind: ProviderKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnalysisProvider for RecordingProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn produce_report(&self, prompt: &str, credential: &str) -> Result<MarketReport> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), credential.to_string()));
            Ok(MarketReport {
                items: Vec::new(),
                overall_sentiment: "ok".into(),
                last_updated: Utc::now(),
                provider: self.kind,
            })
        }
    }

    fn gemini_env_key() -> ApiKeys {
        let mut keys = ApiKeys::default();
        keys.set(ProviderKind::Gemini, "env-key");
        keys
    }

    fn service(providers: &[Arc<RecordingProvider>]) -> AnalysisService {
        let mut service = AnalysisService::new(PromptBuilder::default(), ProviderKind::Gemini)
            .with_env_keys(gemini_env_key());
        for p in providers {
            service.register(p.clone());
        }
        service
    }

    #[tokio::test]
    async fn missing_key_never_reaches_the_adapter() {
        let grok = RecordingProvider::new(ProviderKind::Grok);
        let service = service(&[grok.clone()]);

        let err = service
            .analyze(ProviderKind::Grok, &ApiKeys::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PulseError::MissingCredential(ProviderKind::Grok)));
        assert!(grok.calls().is_empty());
    }

    #[tokio::test]
    async fn falls_back_to_env_key() {
        let gemini = RecordingProvider::new(ProviderKind::Gemini);
        let service = service(&[gemini.clone()]);

        service
            .analyze(ProviderKind::Gemini, &ApiKeys::default())
            .await
            .unwrap();

        let calls = gemini.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "env-key");
        assert!(calls[0].0.contains("Google Search"));
    }

    #[tokio::test]
    async fn user_key_wins_over_env_key() {
        let gemini = RecordingProvider::new(ProviderKind::Gemini);
        let service = service(&[gemini.clone()]);
        let mut keys = ApiKeys::default();
        keys.set(ProviderKind::Gemini, "user-key");

        service.analyze(ProviderKind::Gemini, &keys).await.unwrap();
        assert_eq!(gemini.calls()[0].1, "user-key");
    }

    #[test]
    fn env_key_only_serves_its_own_provider() {
        let service = service(&[]);
        let keys = ApiKeys::default();
        assert!(service.has_credential(ProviderKind::Gemini, &keys));
        assert!(!service.has_credential(ProviderKind::DeepSeek, &keys));
    }

    #[test]
    fn non_gemini_default_never_borrows_the_gemini_key() {
        let service = AnalysisService::new(PromptBuilder::default(), ProviderKind::DeepSeek)
            .with_env_keys(gemini_env_key());
        let keys = ApiKeys::default();

        assert_eq!(service.resolve_credential(ProviderKind::DeepSeek, &keys), None);
        assert_eq!(
            service.resolve_credential(ProviderKind::Gemini, &keys),
            Some("env-key")
        );
    }

    #[test]
    fn default_registry_covers_every_provider() {
        let service =
            AnalysisService::with_default_providers(PromptBuilder::default(), ProviderKind::Gemini);
        for kind in ProviderKind::ALL {
            assert!(service.adapters.contains_key(&kind), "{kind} missing");
        }
    }
}
