use async_trait::async_trait;
use serde_json::{json, Value};

use super::http::{extract_text, HttpBase, PathSegment::*};
use super::provider::Provider;
use super::streaming::{decode_openai_line, fragment_stream};
use super::types::*;
use crate::error::ClientError;
use crate::settings::ProviderConfig;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const MODELS: &[&str] = &["gpt-4", "gpt-4-turbo", "gpt-3.5-turbo", "gpt-3.5-turbo-16k"];

/// OpenAI Chat Completions API client
pub struct OpenAIClient {
    base: HttpBase,
}

impl OpenAIClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ClientError> {
        let base = HttpBase::new(ProviderId::OpenAI, config, OPENAI_BASE_URL, DEFAULT_MODEL)?;
        Ok(Self { base })
    }

    fn api_url(&self) -> String {
        self.base.url("chat/completions")
    }

    /// Build OpenAI API request body. Messages pass through unchanged.
    fn build_request_body(&self, conversation: &[Message], options: &GenerationOptions) -> Value {
        let mut body = json!({
            "model": self.base.model(options),
            "messages": conversation,
            "temperature": self.base.temperature(options),
            "stream": options.stream,
        });

        if let Some(max_tokens) = self.base.max_tokens(options) {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }

    /// Parse OpenAI API response
    fn parse_response(&self, body: &Value) -> Result<String, ClientError> {
        extract_text(
            ProviderId::OpenAI,
            body,
            &[Key("choices"), Index(0), Key("message"), Key("content")],
        )
    }
}

#[async_trait]
impl Provider for OpenAIClient {
    async fn get_response(
        &self,
        conversation: &[Message],
        options: &GenerationOptions,
    ) -> Result<Response, ClientError> {
        let body = self.build_request_body(conversation, options);
        tracing::debug!(
            provider = "openai",
            model = self.base.model(options),
            messages = conversation.len(),
            stream = options.stream,
            "Sending request"
        );

        let request = self
            .base
            .client
            .post(self.api_url())
            .header("Authorization", format!("Bearer {}", self.base.api_key));
        let response = self.base.send(request, &body).await?;

        if options.stream {
            let bytes = self.base.byte_stream(response);
            return Ok(Response::Stream(fragment_stream(
                bytes,
                ProviderId::OpenAI,
                decode_openai_line,
            )));
        }

        let api_response = self.base.read_json(response).await?;
        self.parse_response(&api_response).map(Response::Complete)
    }

    fn available_models(&self) -> &'static [&'static str] {
        MODELS
    }

    fn id(&self) -> ProviderId {
        ProviderId::OpenAI
    }

    fn default_model(&self) -> &str {
        &self.base.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAIClient {
        OpenAIClient::new(ProviderConfig::new("test-key")).unwrap()
    }

    #[test]
    fn test_build_request_body() {
        let messages = vec![Message::system("Be helpful"), Message::user("Hello")];
        let body = client().build_request_body(&messages, &GenerationOptions::default());

        assert_eq!(
            body,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "Be helpful"},
                    {"role": "user", "content": "Hello"},
                ],
                "temperature": 0.7,
                "stream": false,
            })
        );
    }

    #[test]
    fn test_build_request_body_with_options() {
        let options = GenerationOptions::streaming()
            .with_model("gpt-4")
            .with_temperature(1.2)
            .with_max_tokens(50);
        let body = client().build_request_body(&[Message::user("Hi")], &options);

        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["temperature"], 1.2);
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 50);
    }

    #[test]
    fn test_parse_response_text() {
        let api_resp = json!({
            "model": "gpt-3.5-turbo",
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}, "finish_reason": "stop"}],
        });
        assert_eq!(client().parse_response(&api_resp).unwrap(), "Hello!");
    }

    #[test]
    fn test_parse_response_without_choices() {
        let err = client().parse_response(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse { provider: ProviderId::OpenAI, .. }));
    }

    #[test]
    fn test_custom_base_url() {
        let client = OpenAIClient::new(
            ProviderConfig::new("key").with_base_url("http://localhost:11434/v1/"),
        )
        .unwrap();
        assert_eq!(client.api_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_catalog() {
        let c = client();
        assert_eq!(c.available_models().len(), 4);
        assert!(c.available_models().iter().any(|m| *m == c.default_model()));
    }
}
