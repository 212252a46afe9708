use ai_clients::{ClientRegistry, GenerationOptions, Message, Response};
use anyhow::{anyhow, Result};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::{
    build_registry, generation_options, interruptible, model_label, render_stream, resolve_provider,
};
use crate::cli::GenerationArgs;
use crate::config::ConfigStore;
use crate::usage::UsageLog;

const BANNER: &str = r#"
╔═══════════════════════════════════════╗
║            Termux AI Tool             ║
║      Multi-AI API Integration CLI     ║
║                                       ║
║  Supports: OpenAI, Anthropic,         ║
║            Gemini, Cohere, HuggingFace║
╚═══════════════════════════════════════╝"#;

/// Interactive chat. Replies always stream; Ctrl-C cancels the current reply,
/// Ctrl-C or EOF at the prompt leaves.
pub async fn execute(
    config: &ConfigStore,
    provider: Option<String>,
    generation: GenerationArgs,
) -> Result<()> {
    let registry = build_registry(config)?;
    let provider = match resolve_provider(provider, config) {
        Ok(p) => p,
        Err(_) => registry
            .list_available_providers()
            .first()
            .map(|p| p.to_string())
            .ok_or_else(|| anyhow!("No AI providers configured"))?,
    };
    // Fail before the banner when the provider is unusable
    registry.resolve(&provider)?;

    let options = generation_options(&generation, true);
    let usage = UsageLog::in_dir(&config.dir());
    info!(provider = %provider, "Starting chat session");

    println!("{BANNER}");
    println!("Starting interactive mode with {provider}");
    println!("Type 'quit', 'exit', or Ctrl+C to stop");
    println!("{}", "-".repeat(50));

    let mut history: Vec<Message> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        print!("You: ");
        stdout.flush()?;

        let next_line = async { lines.next_line().await.map_err(anyhow::Error::from) };
        let line = match interruptible(next_line).await? {
            Some(Some(line)) => line,
            // EOF or Ctrl-C at the prompt
            Some(None) | None => {
                println!("\n\nGoodbye!");
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        history.push(Message::user(input));
        let turn = reply(&registry, &provider, &history, &options);
        match interruptible(turn).await {
            Ok(Some(text)) => {
                usage.record(&provider, &model_label(&registry, &provider, &options), input, &text);
                history.push(Message::assistant(&text));
            }
            Ok(None) => {
                history.pop();
                println!("\n[interrupted]");
            }
            Err(e) => {
                history.pop();
                eprintln!("\nError: {e}");
            }
        }
    }

    Ok(())
}

async fn reply(
    registry: &ClientRegistry,
    provider: &str,
    history: &[Message],
    options: &GenerationOptions,
) -> Result<String> {
    let response = registry.get_response(provider, history, options).await?;

    let mut stdout = io::stdout();
    write!(stdout, "AI: ")?;
    stdout.flush()?;
    match response {
        Response::Stream(stream) => render_stream(stream, &mut stdout).await,
        Response::Complete(text) => {
            writeln!(stdout, "{text}")?;
            Ok(text)
        }
    }
}
