use reqwest::StatusCode;
use thiserror::Error;

use crate::llm::ProviderId;

/// Errors surfaced by adapters and the registry. Each renders as a one-line
/// diagnostic that names the provider involved.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No AI providers configured. Set an API key with `termux-ai config set <provider>_api_key <key>`")]
    NoProvidersConfigured,

    #[error("Provider '{provider}' not available. Available providers: {}", available.join(", "))]
    ProviderUnavailable {
        provider: String,
        available: Vec<String>,
    },

    #[error("unknown provider '{0}' (expected one of: openai, anthropic, gemini, cohere, huggingface)")]
    UnknownProvider(String),

    #[error("{provider} client could not be initialized: {reason}")]
    InitFailed { provider: ProviderId, reason: String },

    #[error("invalid generation options: {0}")]
    InvalidOptions(String),

    #[error("{provider} API error: {source}")]
    Transport {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error ({status}): {body}")]
    Status {
        provider: ProviderId,
        status: StatusCode,
        body: String,
    },

    #[error("{provider} returned an invalid response: {reason}")]
    InvalidResponse { provider: ProviderId, reason: String },

    #[error("{provider} stream aborted: {reason}")]
    Stream { provider: ProviderId, reason: String },
}

impl ClientError {
    pub fn transport(provider: ProviderId, source: reqwest::Error) -> Self {
        Self::Transport { provider, source }
    }

    pub fn invalid_response(provider: ProviderId, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider,
            reason: reason.into(),
        }
    }
}
