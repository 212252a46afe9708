use async_trait::async_trait;
use serde_json::{json, Value};

use super::http::{extract_text, HttpBase, PathSegment::*};
use super::provider::Provider;
use super::streaming::{decode_anthropic_line, fragment_stream};
use super::types::*;
use crate::error::ClientError;
use crate::settings::ProviderConfig;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
/// The Messages API requires max_tokens on every request
const DEFAULT_MAX_TOKENS: u32 = 1000;
const MODELS: &[&str] = &[
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
    "claude-2.1",
    "claude-2.0",
];

/// Anthropic Messages API client
pub struct AnthropicClient {
    base: HttpBase,
}

impl AnthropicClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ClientError> {
        let base = HttpBase::new(
            ProviderId::Anthropic,
            config,
            ANTHROPIC_BASE_URL,
            DEFAULT_MODEL,
        )?;
        Ok(Self { base })
    }

    fn api_url(&self) -> String {
        self.base.url("messages")
    }

    /// Build Anthropic API request body. Roles are passed through as-is.
    fn build_request_body(&self, conversation: &[Message], options: &GenerationOptions) -> Value {
        json!({
            "model": self.base.model(options),
            "messages": conversation,
            "max_tokens": self.base.max_tokens(options).unwrap_or(DEFAULT_MAX_TOKENS),
            "temperature": self.base.temperature(options),
            "stream": options.stream,
        })
    }

    /// Text of the first content block
    fn parse_response(&self, body: &Value) -> Result<String, ClientError> {
        extract_text(
            ProviderId::Anthropic,
            body,
            &[Key("content"), Index(0), Key("text")],
        )
    }
}

#[async_trait]
impl Provider for AnthropicClient {
    async fn get_response(
        &self,
        conversation: &[Message],
        options: &GenerationOptions,
    ) -> Result<Response, ClientError> {
        let body = self.build_request_body(conversation, options);
        tracing::debug!(
            provider = "anthropic",
            model = self.base.model(options),
            messages = conversation.len(),
            stream = options.stream,
            "Sending request"
        );

        let request = self
            .base
            .client
            .post(self.api_url())
            .header("x-api-key", &self.base.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);
        let response = self.base.send(request, &body).await?;

        if options.stream {
            let bytes = self.base.byte_stream(response);
            return Ok(Response::Stream(fragment_stream(
                bytes,
                ProviderId::Anthropic,
                decode_anthropic_line,
            )));
        }

        let api_response = self.base.read_json(response).await?;
        self.parse_response(&api_response).map(Response::Complete)
    }

    fn available_models(&self) -> &'static [&'static str] {
        MODELS
    }

    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn default_model(&self) -> &str {
        &self.base.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AnthropicClient {
        AnthropicClient::new(ProviderConfig::new("sk-ant-test")).unwrap()
    }

    #[test]
    fn test_build_request_body() {
        let messages = vec![Message::system("Be brief"), Message::user("Hello")];
        let body = client().build_request_body(&messages, &GenerationOptions::default());

        assert_eq!(
            body,
            json!({
                "model": "claude-3-sonnet-20240229",
                "messages": [
                    {"role": "system", "content": "Be brief"},
                    {"role": "user", "content": "Hello"},
                ],
                "max_tokens": 1000,
                "temperature": 0.7,
                "stream": false,
            })
        );
    }

    #[test]
    fn test_max_tokens_override() {
        let options = GenerationOptions::streaming().with_max_tokens(64);
        let body = client().build_request_body(&[Message::user("Hi")], &options);
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_parse_response_text() {
        let api_resp = json!({
            "id": "msg_123",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Hello!"}],
            "model": "claude-3-sonnet-20240229",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });
        assert_eq!(client().parse_response(&api_resp).unwrap(), "Hello!");
    }

    #[test]
    fn test_parse_response_empty_content() {
        let err = client().parse_response(&json!({"content": []})).unwrap_err();
        assert!(err.to_string().contains("missing content.0.text"));
    }

    #[test]
    fn test_catalog() {
        let c = client();
        assert_eq!(c.id(), ProviderId::Anthropic);
        assert_eq!(c.available_models().len(), 5);
        assert_eq!(c.default_model(), "claude-3-sonnet-20240229");
    }
}
