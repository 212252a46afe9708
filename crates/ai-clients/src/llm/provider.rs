use async_trait::async_trait;

use super::types::{GenerationOptions, Message, ProviderId, Response};
use crate::error::ClientError;

/// Text-generation provider - abstraction over OpenAI, Anthropic, Gemini, etc.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send the conversation and return the full text, or a fragment stream
    /// when `options.stream` is set and the vendor supports it.
    async fn get_response(
        &self,
        conversation: &[Message],
        options: &GenerationOptions,
    ) -> Result<Response, ClientError>;

    /// Static model catalog (no network call)
    fn available_models(&self) -> &'static [&'static str];

    fn id(&self) -> ProviderId;

    /// Model used when the call does not name one
    fn default_model(&self) -> &str;
}
