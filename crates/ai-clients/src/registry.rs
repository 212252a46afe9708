//! Registry of constructed adapters, keyed by provider.

use std::collections::BTreeMap;

use crate::error::ClientError;
use crate::llm::{
    AnthropicClient, CohereClient, GeminiClient, GenerationOptions, HuggingFaceClient, Message,
    OpenAIClient, Provider, ProviderId, Response,
};
use crate::settings::{ProviderConfig, SettingsSource};

/// Adapters for every provider that has a usable credential
#[derive(Default)]
pub struct ClientRegistry {
    providers: BTreeMap<ProviderId, Box<dyn Provider>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct one adapter per configured credential. Providers whose
    /// construction fails are logged and left out.
    pub fn from_settings(settings: &dyn SettingsSource) -> Self {
        let mut registry = Self::new();
        for id in ProviderId::ALL {
            let Some(config) = ProviderConfig::from_settings(id, settings) else {
                continue;
            };
            match build_provider(id, config) {
                Ok(provider) => {
                    tracing::debug!(provider = %id, model = provider.default_model(), "provider ready");
                    registry.providers.insert(id, provider);
                }
                Err(e) => {
                    tracing::warn!(provider = %id, error = %e, "skipping provider");
                }
            }
        }
        registry
    }

    /// Add or replace an adapter
    pub fn with_provider(mut self, provider: Box<dyn Provider>) -> Self {
        self.providers.insert(provider.id(), provider);
        self
    }

    pub fn get(&self, id: ProviderId) -> Option<&dyn Provider> {
        self.providers.get(&id).map(|p| p.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Configured providers in stable order
    pub fn list_available_providers(&self) -> Vec<ProviderId> {
        self.providers.keys().copied().collect()
    }

    pub async fn get_response(
        &self,
        provider: &str,
        conversation: &[Message],
        options: &GenerationOptions,
    ) -> Result<Response, ClientError> {
        let client = self.resolve(provider)?;
        options.validate()?;
        client.get_response(conversation, options).await
    }

    pub fn available_models(&self, provider: &str) -> Result<&'static [&'static str], ClientError> {
        Ok(self.resolve(provider)?.available_models())
    }

    /// Look up by user-supplied name. Unknown names and unconfigured
    /// providers fail the same way.
    pub fn resolve(&self, provider: &str) -> Result<&dyn Provider, ClientError> {
        if self.is_empty() {
            return Err(ClientError::NoProvidersConfigured);
        }
        provider
            .parse::<ProviderId>()
            .ok()
            .and_then(|id| self.get(id))
            .ok_or_else(|| ClientError::ProviderUnavailable {
                provider: provider.to_string(),
                available: self
                    .providers
                    .keys()
                    .map(|id| id.as_str().to_string())
                    .collect(),
            })
    }
}

fn build_provider(id: ProviderId, config: ProviderConfig) -> Result<Box<dyn Provider>, ClientError> {
    Ok(match id {
        ProviderId::OpenAI => Box::new(OpenAIClient::new(config)?),
        ProviderId::Anthropic => Box::new(AnthropicClient::new(config)?),
        ProviderId::Gemini => Box::new(GeminiClient::new(config)?),
        ProviderId::Cohere => Box::new(CohereClient::new(config)?),
        ProviderId::HuggingFace => Box::new(HuggingFaceClient::new(config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    struct EchoProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Provider for EchoProvider {
        async fn get_response(
            &self,
            conversation: &[Message],
            _options: &GenerationOptions,
        ) -> Result<Response, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let last = conversation.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(Response::Complete(format!("echo: {last}")))
        }

        fn available_models(&self) -> &'static [&'static str] {
            &["echo-1"]
        }

        fn id(&self) -> ProviderId {
            ProviderId::Cohere
        }

        fn default_model(&self) -> &str {
            "echo-1"
        }
    }

    #[test]
    fn test_no_credentials_means_empty() {
        let registry = ClientRegistry::from_settings(&settings(&[]));
        assert!(registry.is_empty());
        assert!(registry.list_available_providers().is_empty());
        let err = registry.available_models("openai").unwrap_err();
        assert!(matches!(err, ClientError::NoProvidersConfigured));
        assert!(err.to_string().contains("termux-ai config set"));
    }

    #[tokio::test]
    async fn test_get_response_without_providers() {
        let registry = ClientRegistry::new();
        let valid = GenerationOptions::default();
        let out_of_range = GenerationOptions::default().with_temperature(3.0);

        for options in [valid, out_of_range] {
            let err = registry
                .get_response("openai", &[Message::user("Hi")], &options)
                .await
                .unwrap_err();
            assert!(matches!(err, ClientError::NoProvidersConfigured));
        }
    }

    #[test]
    fn test_single_credential() {
        let registry = ClientRegistry::from_settings(&settings(&[("anthropic_api_key", "sk-ant-x")]));
        assert_eq!(registry.list_available_providers(), vec![ProviderId::Anthropic]);
        assert_eq!(registry.available_models("anthropic").unwrap().len(), 5);

        let err = registry.available_models("openai").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provider 'openai' not available. Available providers: anthropic"
        );
    }

    #[test]
    fn test_all_credentials_sorted() {
        let registry = ClientRegistry::from_settings(&settings(&[
            ("huggingface_api_key", "hf_x"),
            ("openai_api_key", "sk-x"),
            ("gemini_api_key", "g"),
            ("cohere_api_key", "c"),
            ("anthropic_api_key", "a"),
        ]));
        assert_eq!(registry.list_available_providers(), ProviderId::ALL.to_vec());
    }

    #[test]
    fn test_unusable_credential_is_skipped() {
        let registry = ClientRegistry::from_settings(&settings(&[
            ("openai_api_key", "sk-bad\r\nInjected: 1"),
            ("cohere_api_key", "co-ok"),
        ]));
        assert_eq!(registry.list_available_providers(), vec![ProviderId::Cohere]);
    }

    #[test]
    fn test_unknown_provider_name_is_unavailable() {
        let registry = ClientRegistry::from_settings(&settings(&[("openai_api_key", "sk-x")]));
        let err = registry.available_models("mistral").unwrap_err();
        assert!(matches!(err, ClientError::ProviderUnavailable { ref provider, .. } if provider == "mistral"));
    }

    #[tokio::test]
    async fn test_dispatch_to_injected_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ClientRegistry::new().with_provider(Box::new(EchoProvider {
            calls: calls.clone(),
        }));

        let response = registry
            .get_response("Cohere", &[Message::user("ping")], &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(response.collect_text().await.unwrap(), "echo: ping");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_options_never_reach_provider() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ClientRegistry::new().with_provider(Box::new(EchoProvider {
            calls: calls.clone(),
        }));

        let options = GenerationOptions::default().with_temperature(3.0);
        let err = registry
            .get_response("cohere", &[Message::user("ping")], &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidOptions(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Naming a provider that is not set up wins over bad options
        let err = registry
            .get_response("gemini", &[Message::user("ping")], &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ProviderUnavailable { .. }));
    }
}
