use async_trait::async_trait;
use serde_json::{json, Value};

use super::http::HttpBase;
use super::provider::Provider;
use super::types::*;
use crate::error::ClientError;
use crate::settings::ProviderConfig;

const HUGGINGFACE_BASE_URL: &str = "https://api-inference.huggingface.co/models";
const DEFAULT_MODEL: &str = "microsoft/DialoGPT-medium";
const MODELS: &[&str] = &[
    "microsoft/DialoGPT-medium",
    "microsoft/DialoGPT-large",
    "facebook/blenderbot-400M-distill",
    "gpt2",
];

/// Hugging Face Inference API client. Sends only the latest message and
/// never streams.
pub struct HuggingFaceClient {
    base: HttpBase,
}

impl HuggingFaceClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ClientError> {
        let base = HttpBase::new(
            ProviderId::HuggingFace,
            config,
            HUGGINGFACE_BASE_URL,
            DEFAULT_MODEL,
        )?;
        Ok(Self { base })
    }

    fn api_url(&self, model: &str) -> String {
        self.base.url(model)
    }

    fn build_request_body(&self, conversation: &[Message]) -> Value {
        let inputs = conversation.last().map(|m| m.content.as_str()).unwrap_or("");
        json!({ "inputs": inputs })
    }

    /// Text-generation models answer with `[{"generated_text": ...}]`; anything
    /// else is handed back verbatim as JSON text.
    fn parse_response(&self, body: &Value) -> String {
        match body.as_array() {
            Some(items) if !items.is_empty() => items[0]["generated_text"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            _ => body.to_string(),
        }
    }
}

#[async_trait]
impl Provider for HuggingFaceClient {
    async fn get_response(
        &self,
        conversation: &[Message],
        options: &GenerationOptions,
    ) -> Result<Response, ClientError> {
        let model = self.base.model(options);
        if options.stream {
            tracing::warn!(
                provider = "huggingface",
                model,
                "streaming not supported, returning the complete response"
            );
        }

        let body = self.build_request_body(conversation);
        tracing::debug!(
            provider = "huggingface",
            model,
            messages = conversation.len(),
            "Sending request"
        );

        let request = self
            .base
            .client
            .post(self.api_url(model))
            .header("Authorization", format!("Bearer {}", self.base.api_key));
        let response = self.base.send(request, &body).await?;
        let api_response = self.base.read_json(response).await?;
        Ok(Response::Complete(self.parse_response(&api_response)))
    }

    fn available_models(&self) -> &'static [&'static str] {
        MODELS
    }

    fn id(&self) -> ProviderId {
        ProviderId::HuggingFace
    }

    fn default_model(&self) -> &str {
        &self.base.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HuggingFaceClient {
        HuggingFaceClient::new(ProviderConfig::new("hf_test_token")).unwrap()
    }

    #[test]
    fn test_only_last_message_is_sent() {
        let conversation = vec![
            Message::system("ignored"),
            Message::user("first"),
            Message::user("second"),
        ];
        assert_eq!(
            client().build_request_body(&conversation),
            json!({"inputs": "second"})
        );
        assert_eq!(client().build_request_body(&[]), json!({"inputs": ""}));
    }

    #[test]
    fn test_model_is_part_of_the_path() {
        assert_eq!(
            client().api_url("gpt2"),
            "https://api-inference.huggingface.co/models/gpt2"
        );
        assert_eq!(
            client().api_url(DEFAULT_MODEL),
            "https://api-inference.huggingface.co/models/microsoft/DialoGPT-medium"
        );
    }

    #[test]
    fn test_parse_response_shapes() {
        let c = client();
        assert_eq!(c.parse_response(&json!([{"generated_text": "hey"}])), "hey");
        assert_eq!(c.parse_response(&json!([{"score": 0.9}])), "");
        assert_eq!(
            c.parse_response(&json!({"error": "loading"})),
            r#"{"error":"loading"}"#
        );
        assert_eq!(c.parse_response(&json!([])), "[]");
    }
}
