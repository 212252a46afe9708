pub mod ask;
pub mod chat;
pub mod config;
pub mod init;
pub mod providers;
pub mod setup;
pub mod usage;

use ai_clients::{ClientError, ClientRegistry, FragmentStream, GenerationOptions, ProviderId, Response};
use anyhow::{bail, Result};
use futures::StreamExt;
use std::future::Future;
use std::io::Write;

use crate::cli::GenerationArgs;
use crate::config::{ConfigStore, DEFAULT_PROVIDER_KEY};

/// How a command finished when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// Ctrl-C while a request was in flight
    Interrupted,
}

/// Provider named on the command line, else `default_provider`
pub fn resolve_provider(explicit: Option<String>, config: &ConfigStore) -> Result<String> {
    match explicit.or_else(|| config.get(DEFAULT_PROVIDER_KEY)) {
        Some(p) if !p.trim().is_empty() => Ok(p.trim().to_string()),
        _ => bail!(
            "No provider given. Use --provider <{}> or `termux-ai config set default_provider <name>`",
            ProviderId::ALL.map(|p| p.as_str()).join("|")
        ),
    }
}

pub fn generation_options(args: &GenerationArgs, stream: bool) -> GenerationOptions {
    GenerationOptions {
        model: args.model.clone(),
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        stream,
    }
}

/// Model name recorded in the usage log
pub fn model_label(registry: &ClientRegistry, provider: &str, options: &GenerationOptions) -> String {
    if let Some(model) = &options.model {
        return model.clone();
    }
    registry
        .resolve(provider)
        .map(|p| p.default_model().to_string())
        .unwrap_or_else(|_| provider.to_string())
}

/// Write fragments as they arrive, flushing after each. Returns the
/// concatenated text.
pub async fn render_stream<W: Write>(mut stream: FragmentStream, out: &mut W) -> Result<String> {
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        write!(out, "{fragment}")?;
        out.flush()?;
        text.push_str(&fragment);
    }
    writeln!(out)?;
    Ok(text)
}

/// Print a response the way the caller asked for it. Streams are rendered
/// incrementally; complete text gets the `AI: ` prefix.
pub async fn print_response<W: Write>(response: Response, out: &mut W) -> Result<String> {
    match response {
        Response::Stream(stream) => render_stream(stream, out).await,
        Response::Complete(text) => {
            if text.is_empty() {
                writeln!(out, "No response received.")?;
            } else {
                writeln!(out, "AI: {text}")?;
            }
            Ok(text)
        }
    }
}

/// Run `work` until it finishes or Ctrl-C arrives. The future (and any HTTP
/// connection it owns) is dropped on interruption.
pub async fn interruptible<T>(work: impl Future<Output = Result<T>>) -> Result<Option<T>> {
    tokio::select! {
        result = work => result.map(Some),
        _ = ctrl_c() => Ok(None),
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!(error = %e, "Ctrl-C handler unavailable");
        futures::future::pending::<()>().await;
    }
}

/// Registry over the current config, failing early when nothing is set up
pub fn build_registry(config: &ConfigStore) -> Result<ClientRegistry> {
    let registry = ClientRegistry::from_settings(config);
    if registry.is_empty() {
        return Err(ClientError::NoProvidersConfigured.into());
    }
    Ok(registry)
}
