use std::fmt;
use std::pin::Pin;
use std::str::FromStr;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Message role in conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Conversation message. A conversation is an ordered slice of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(text: &str) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: &str) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: &str) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// Per-call generation options. Absent fields fall back to adapter defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

pub const MIN_TEMPERATURE: f64 = 0.0;
pub const MAX_TEMPERATURE: f64 = 2.0;
pub const MAX_TOKENS_LIMIT: u32 = 100_000;

impl GenerationOptions {
    pub fn streaming() -> Self {
        Self {
            stream: true,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Reject out-of-range values before anything goes on the wire
    pub fn validate(&self) -> Result<(), ClientError> {
        if let Some(t) = self.temperature {
            if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&t) {
                return Err(ClientError::InvalidOptions(format!(
                    "temperature {t} is outside {MIN_TEMPERATURE}-{MAX_TEMPERATURE}"
                )));
            }
        }
        if let Some(n) = self.max_tokens {
            if n == 0 || n > MAX_TOKENS_LIMIT {
                return Err(ClientError::InvalidOptions(format!(
                    "max_tokens {n} is outside 1-{MAX_TOKENS_LIMIT}"
                )));
            }
        }
        Ok(())
    }
}

/// The closed set of supported vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAI,
    Anthropic,
    Gemini,
    Cohere,
    HuggingFace,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::OpenAI,
        ProviderId::Anthropic,
        ProviderId::Gemini,
        ProviderId::Cohere,
        ProviderId::HuggingFace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAI => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Gemini => "gemini",
            ProviderId::Cohere => "cohere",
            ProviderId::HuggingFace => "huggingface",
        }
    }

    /// Human-readable vendor name
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::OpenAI => "OpenAI (ChatGPT)",
            ProviderId::Anthropic => "Anthropic (Claude)",
            ProviderId::Gemini => "Google Gemini",
            ProviderId::Cohere => "Cohere",
            ProviderId::HuggingFace => "Hugging Face",
        }
    }

    /// Settings key holding this provider's credential
    pub fn api_key_setting(&self) -> String {
        format!("{}_api_key", self.as_str())
    }

    pub fn model_setting(&self) -> String {
        format!("{}_model", self.as_str())
    }

    pub fn base_url_setting(&self) -> String {
        format!("{}_base_url", self.as_str())
    }

    /// Environment variables consulted when no key is configured, in order
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            ProviderId::OpenAI => &["OPENAI_API_KEY"],
            ProviderId::Anthropic => &["ANTHROPIC_API_KEY"],
            ProviderId::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            ProviderId::Cohere => &["COHERE_API_KEY"],
            ProviderId::HuggingFace => &["HUGGINGFACE_API_KEY", "HF_TOKEN"],
        }
    }

    /// Where to obtain a key
    pub fn key_help_url(&self) -> &'static str {
        match self {
            ProviderId::OpenAI => "https://platform.openai.com/api-keys",
            ProviderId::Anthropic => "https://console.anthropic.com/",
            ProviderId::Gemini => "https://ai.google.dev/",
            ProviderId::Cohere => "https://dashboard.cohere.ai/api-keys",
            ProviderId::HuggingFace => "https://huggingface.co/settings/tokens",
        }
    }

    /// Cheap shape check on a key (length and known prefix). Not authoritative.
    pub fn looks_like_valid_key(&self, key: &str) -> bool {
        let key = key.trim();
        let (min_len, prefix) = match self {
            ProviderId::OpenAI => (20, Some("sk-")),
            ProviderId::Anthropic => (20, Some("sk-ant-")),
            ProviderId::Gemini => (30, None),
            ProviderId::Cohere => (20, None),
            ProviderId::HuggingFace => (20, Some("hf_")),
        };
        key.len() >= min_len && prefix.map_or(true, |p| key.starts_with(p))
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| ClientError::UnknownProvider(s.to_string()))
    }
}

/// Lazy, forward-only sequence of generated text fragments
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// Result of a generation call
pub enum Response {
    /// Full decoded text
    Complete(String),
    /// Fragments pulled on demand; dropping it releases the connection
    Stream(FragmentStream),
}

impl Response {
    /// Drain into a single string (stream fragments concatenated in order)
    pub async fn collect_text(self) -> Result<String, ClientError> {
        use futures::StreamExt;

        match self {
            Response::Complete(text) => Ok(text),
            Response::Stream(mut stream) => {
                let mut text = String::new();
                while let Some(fragment) = stream.next().await {
                    text.push_str(&fragment?);
                }
                Ok(text)
            }
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            Response::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_roundtrip_names() {
        for id in ProviderId::ALL {
            assert_eq!(id.as_str().parse::<ProviderId>().unwrap(), id);
        }
        assert_eq!("  OpenAI ".parse::<ProviderId>().unwrap(), ProviderId::OpenAI);
    }

    #[test]
    fn test_unknown_provider() {
        let err = "mistral".parse::<ProviderId>().unwrap_err();
        assert!(matches!(err, ClientError::UnknownProvider(ref name) if name == "mistral"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn test_options_validation() {
        assert!(GenerationOptions::default().validate().is_ok());
        assert!(GenerationOptions::default()
            .with_temperature(2.0)
            .validate()
            .is_ok());
        assert!(GenerationOptions::default()
            .with_temperature(2.5)
            .validate()
            .is_err());
        assert!(GenerationOptions::default()
            .with_temperature(-0.1)
            .validate()
            .is_err());
        assert!(GenerationOptions::default()
            .with_max_tokens(0)
            .validate()
            .is_err());
        assert!(GenerationOptions::default()
            .with_max_tokens(100_001)
            .validate()
            .is_err());
    }

    #[test]
    fn test_key_shape_check() {
        assert!(ProviderId::OpenAI.looks_like_valid_key("sk-abcdefghijklmnopqrstu"));
        assert!(!ProviderId::OpenAI.looks_like_valid_key("abcdefghijklmnopqrstuvw"));
        assert!(!ProviderId::Anthropic.looks_like_valid_key("sk-abcdefghijklmnopqrstu"));
        assert!(ProviderId::Cohere.looks_like_valid_key("abcdefghijklmnopqrstuvw"));
        assert!(!ProviderId::Gemini.looks_like_valid_key("short"));
    }

    #[tokio::test]
    async fn test_collect_text_from_stream() {
        let stream = futures::stream::iter(vec![
            Ok::<_, ClientError>("Hel".to_string()),
            Ok("lo".to_string()),
        ]);
        let response = Response::Stream(Box::pin(stream));
        assert_eq!(response.collect_text().await.unwrap(), "Hello");
    }
}
