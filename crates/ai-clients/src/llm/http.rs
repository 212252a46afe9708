//! HTTP plumbing shared by every adapter: client construction, request
//! dispatch with status checking, and JSON body decoding.

use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::HeaderValue;
use reqwest::{Client, ClientBuilder, RequestBuilder, Url};
use serde_json::Value;

use super::types::{GenerationOptions, ProviderId};
use crate::error::ClientError;
use crate::settings::ProviderConfig;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// State common to all adapters
pub(crate) struct HttpBase {
    pub provider: ProviderId,
    pub client: Client,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl HttpBase {
    pub fn new(
        provider: ProviderId,
        config: ProviderConfig,
        default_base_url: &str,
        default_model: &str,
    ) -> Result<Self, ClientError> {
        let init_failed = |reason: String| ClientError::InitFailed { provider, reason };

        let api_key = config.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(init_failed("API key is empty".into()));
        }
        // Keys end up in headers or query strings; control characters never belong there
        if HeaderValue::from_str(&format!("Bearer {api_key}")).is_err() {
            return Err(init_failed("API key contains invalid characters".into()));
        }

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(default_base_url)
            .trim_end_matches('/')
            .to_string();
        Url::parse(&base_url).map_err(|e| init_failed(format!("invalid base URL {base_url}: {e}")))?;

        let client = ClientBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| init_failed(format!("HTTP client: {e}")))?;

        Ok(Self {
            provider,
            client,
            api_key,
            base_url,
            model: config.model.unwrap_or_else(|| default_model.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn model<'a>(&'a self, options: &'a GenerationOptions) -> &'a str {
        options.model.as_deref().unwrap_or(&self.model)
    }

    pub fn temperature(&self, options: &GenerationOptions) -> f64 {
        options
            .temperature
            .or(self.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_tokens(&self, options: &GenerationOptions) -> Option<u32> {
        options.max_tokens.or(self.max_tokens)
    }

    /// Send a JSON body and fail on non-2xx. No retries.
    pub async fn send(
        &self,
        request: RequestBuilder,
        body: &Value,
    ) -> Result<reqwest::Response, ClientError> {
        let response = request
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(provider = %self.provider, error = %redact_key(&e.to_string(), &self.api_key), "request failed");
                ClientError::transport(self.provider, e.without_url())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(provider = %self.provider, %status, "provider returned error status");
            return Err(ClientError::Status {
                provider: self.provider,
                status,
                body: redact_key(error_body.trim(), &self.api_key),
            });
        }

        Ok(response)
    }

    /// Read the whole body as JSON
    pub async fn read_json(&self, response: reqwest::Response) -> Result<Value, ClientError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::transport(self.provider, e.without_url()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::invalid_response(self.provider, format!("body is not JSON: {e}")))
    }

    /// Incremental body with read failures attributed to this provider
    pub fn byte_stream(
        &self,
        response: reqwest::Response,
    ) -> impl Stream<Item = Result<Bytes, ClientError>> + Send + 'static {
        let provider = self.provider;
        response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| ClientError::transport(provider, e.without_url())))
    }
}

/// Redact API key from error text to prevent leaking it into logs
pub(crate) fn redact_key(body: &str, key: &str) -> String {
    if key.chars().count() > 4 {
        let prefix: String = key.chars().take(4).collect();
        body.replace(key, &format!("{prefix}..."))
    } else {
        body.to_string()
    }
}

/// Walk a JSON path like `choices.0.message.content` down to a string
pub(crate) fn extract_text(
    provider: ProviderId,
    body: &Value,
    path: &[PathSegment],
) -> Result<String, ClientError> {
    let mut current = body;
    for segment in path {
        let next = match segment {
            PathSegment::Key(k) => current.get(*k),
            PathSegment::Index(i) => current.get(*i),
        };
        current = next.ok_or_else(|| {
            ClientError::invalid_response(provider, format!("missing {}", render_path(path)))
        })?;
    }
    current
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ClientError::invalid_response(provider, format!("{} is not a string", render_path(path))))
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum PathSegment {
    Key(&'static str),
    Index(usize),
}

fn render_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(|s| match s {
            PathSegment::Key(k) => k.to_string(),
            PathSegment::Index(i) => i.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}
