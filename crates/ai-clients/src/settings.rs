//! Credential and default-value lookup consumed at adapter construction.

use std::collections::HashMap;

use crate::llm::ProviderId;

pub const DEFAULT_TEMPERATURE_KEY: &str = "default_temperature";
pub const DEFAULT_MAX_TOKENS_KEY: &str = "default_max_tokens";

/// Read-only key/value source for API keys and per-provider defaults
pub trait SettingsSource {
    fn get(&self, key: &str) -> Option<String>;
}

impl SettingsSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl<T: SettingsSource + ?Sized> SettingsSource for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Everything one adapter needs at construction time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl ProviderConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    /// Custom base URL for compatible endpoints (local gateways, mock servers)
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// Collect a provider's settings. `None` when no usable credential exists.
    pub fn from_settings(provider: ProviderId, settings: &dyn SettingsSource) -> Option<Self> {
        let api_key = non_blank(settings.get(&provider.api_key_setting()))?;

        let temperature = non_blank(settings.get(DEFAULT_TEMPERATURE_KEY)).and_then(|raw| {
            raw.parse::<f64>()
                .map_err(|_| tracing::warn!(value = %raw, "ignoring unparsable default_temperature"))
                .ok()
        });
        let max_tokens = non_blank(settings.get(DEFAULT_MAX_TOKENS_KEY)).and_then(|raw| {
            raw.parse::<u32>()
                .map_err(|_| tracing::warn!(value = %raw, "ignoring unparsable default_max_tokens"))
                .ok()
        });

        Some(Self {
            api_key,
            model: non_blank(settings.get(&provider.model_setting())),
            base_url: non_blank(settings.get(&provider.base_url_setting())),
            temperature,
            max_tokens,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
