use async_trait::async_trait;
use serde_json::{json, Value};

use super::http::{extract_text, HttpBase, PathSegment::*};
use super::provider::Provider;
use super::streaming::{decode_gemini_line, fragment_stream};
use super::types::*;
use crate::error::ClientError;
use crate::settings::ProviderConfig;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-pro";
const MODELS: &[&str] = &["gemini-pro", "gemini-pro-vision"];

/// Google Gemini API client
pub struct GeminiClient {
    base: HttpBase,
}

impl GeminiClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ClientError> {
        let base = HttpBase::new(ProviderId::Gemini, config, GEMINI_BASE_URL, DEFAULT_MODEL)?;
        Ok(Self { base })
    }

    /// Endpoint for generate or stream, without the key.
    /// NOTE: Gemini takes the key as a query parameter; it is attached at send
    /// time and the full URL is never logged.
    fn api_url(&self, model: &str, stream: bool) -> String {
        let method = if stream {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        self.base.url(&format!("models/{model}:{method}"))
    }

    /// Build Gemini API request body. Only `user` keeps its role; everything
    /// else is sent as `model`.
    fn build_request_body(&self, conversation: &[Message], options: &GenerationOptions) -> Value {
        let contents: Vec<Value> = conversation
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::System | Role::Assistant => "model",
                };
                json!({"role": role, "parts": [{"text": m.content}]})
            })
            .collect();

        let mut generation_config = json!({
            "temperature": self.base.temperature(options),
        });
        if let Some(max_tokens) = self.base.max_tokens(options) {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }

        json!({
            "contents": contents,
            "generationConfig": generation_config,
        })
    }

    fn parse_response(&self, body: &Value) -> Result<String, ClientError> {
        extract_text(
            ProviderId::Gemini,
            body,
            &[
                Key("candidates"),
                Index(0),
                Key("content"),
                Key("parts"),
                Index(0),
                Key("text"),
            ],
        )
    }
}

#[async_trait]
impl Provider for GeminiClient {
    async fn get_response(
        &self,
        conversation: &[Message],
        options: &GenerationOptions,
    ) -> Result<Response, ClientError> {
        let model = self.base.model(options);
        let body = self.build_request_body(conversation, options);
        tracing::debug!(
            provider = "gemini",
            model,
            messages = conversation.len(),
            stream = options.stream,
            "Sending request"
        );

        let mut request = self.base.client.post(self.api_url(model, options.stream));
        if options.stream {
            request = request.query(&[("alt", "sse")]);
        }
        let request = request.query(&[("key", self.base.api_key.as_str())]);
        let response = self.base.send(request, &body).await?;

        if options.stream {
            let bytes = self.base.byte_stream(response);
            return Ok(Response::Stream(fragment_stream(
                bytes,
                ProviderId::Gemini,
                decode_gemini_line,
            )));
        }

        let api_response = self.base.read_json(response).await?;
        self.parse_response(&api_response).map(Response::Complete)
    }

    fn available_models(&self) -> &'static [&'static str] {
        MODELS
    }

    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn default_model(&self) -> &str {
        &self.base.model
    }
}
