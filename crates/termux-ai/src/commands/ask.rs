use ai_clients::Message;
use anyhow::Result;
use std::io;
use tracing::info;

use super::{
    build_registry, generation_options, interruptible, model_label, print_response,
    resolve_provider, Outcome,
};
use crate::cli::GenerationArgs;
use crate::config::{ConfigStore, STREAM_BY_DEFAULT_KEY};
use crate::usage::UsageLog;

pub struct AskRequest {
    pub provider: Option<String>,
    pub prompt: String,
    pub generation: GenerationArgs,
    pub stream: bool,
    pub system: Option<String>,
}

/// Send one prompt and print the answer
pub async fn execute(config: &ConfigStore, request: AskRequest) -> Result<Outcome> {
    let provider = resolve_provider(request.provider, config)?;
    let registry = build_registry(config)?;

    let stream = request.stream || config.flag(STREAM_BY_DEFAULT_KEY);
    let options = generation_options(&request.generation, stream);

    let mut conversation = Vec::new();
    if let Some(system) = &request.system {
        conversation.push(Message::system(system));
    }
    conversation.push(Message::user(&request.prompt));

    info!(provider = %provider, stream, "Sending prompt");
    let turn = async {
        let response = registry
            .get_response(&provider, &conversation, &options)
            .await?;
        print_response(response, &mut io::stdout()).await
    };

    let Some(text) = interruptible(turn).await? else {
        eprintln!("\n\nOperation cancelled by user");
        return Ok(Outcome::Interrupted);
    };

    UsageLog::in_dir(&config.dir()).record(
        &provider,
        &model_label(&registry, &provider, &options),
        &request.prompt,
        &text,
    );
    Ok(Outcome::Done)
}
