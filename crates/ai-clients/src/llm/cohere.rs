use async_trait::async_trait;
use serde_json::{json, Value};

use super::http::{extract_text, HttpBase, PathSegment::*};
use super::provider::Provider;
use super::streaming::{decode_cohere_line, fragment_stream};
use super::types::*;
use crate::error::ClientError;
use crate::settings::ProviderConfig;

const COHERE_BASE_URL: &str = "https://api.cohere.ai/v1";
const DEFAULT_MODEL: &str = "command";
const DEFAULT_MAX_TOKENS: u32 = 1000;
const MODELS: &[&str] = &["command", "command-light", "command-nightly"];

/// Cohere Generate API client. The conversation is flattened into a single
/// prompt string.
pub struct CohereClient {
    base: HttpBase,
}

impl CohereClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ClientError> {
        let base = HttpBase::new(ProviderId::Cohere, config, COHERE_BASE_URL, DEFAULT_MODEL)?;
        Ok(Self { base })
    }

    fn api_url(&self) -> String {
        self.base.url("generate")
    }

    fn build_request_body(&self, conversation: &[Message], options: &GenerationOptions) -> Value {
        json!({
            "model": self.base.model(options),
            "prompt": render_prompt(conversation),
            "temperature": self.base.temperature(options),
            "max_tokens": self.base.max_tokens(options).unwrap_or(DEFAULT_MAX_TOKENS),
            "stream": options.stream,
        })
    }

    fn parse_response(&self, body: &Value) -> Result<String, ClientError> {
        extract_text(
            ProviderId::Cohere,
            body,
            &[Key("generations"), Index(0), Key("text")],
        )
    }
}

/// `Role: content` per line, then an open `Assistant:` turn
fn render_prompt(conversation: &[Message]) -> String {
    let mut prompt = String::new();
    for message in conversation {
        prompt.push_str(capitalized_role(message.role));
        prompt.push_str(": ");
        prompt.push_str(&message.content);
        prompt.push('\n');
    }
    prompt.push_str("Assistant:");
    prompt
}

fn capitalized_role(role: Role) -> &'static str {
    match role {
        Role::System => "System",
        Role::User => "User",
        Role::Assistant => "Assistant",
    }
}

#[async_trait]
impl Provider for CohereClient {
    async fn get_response(
        &self,
        conversation: &[Message],
        options: &GenerationOptions,
    ) -> Result<Response, ClientError> {
        let body = self.build_request_body(conversation, options);
        tracing::debug!(
            provider = "cohere",
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
                ProviderId::Cohere,
                decode_cohere_line,
            )));
        }

        let api_response = self.base.read_json(response).await?;
        self.parse_response(&api_response).map(Response::Complete)
    }

    fn available_models(&self) -> &'static [&'static str] {
        MODELS
    }

    fn id(&self) -> ProviderId {
        ProviderId::Cohere
    }

    fn default_model(&self) -> &str {
        &self.base.model
    }
}
