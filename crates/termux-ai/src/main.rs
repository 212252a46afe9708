mod cli;
mod commands;
mod config;
mod usage;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use commands::Outcome;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status after Ctrl-C, as a shell would report SIGINT
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();
    ai_clients::init_logging(cli.log_level(), cli.log_json);

    match run(cli) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Interrupted) => ExitCode::from(EXIT_INTERRUPTED),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    // Handle init early (doesn't need an existing config)
    if let Commands::Init { path } = &cli.command {
        let target = path
            .clone()
            .or_else(|| cli.config.clone())
            .map(|p| PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).to_string()))
            .unwrap_or_else(config::default_path);
        commands::init::run_init(&target)?;
        return Ok(Outcome::Done);
    }

    let mut config = config::ConfigStore::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Ask {
            provider,
            prompt,
            generation,
            stream,
            system,
        } => {
            let request = commands::ask::AskRequest {
                provider,
                prompt,
                generation,
                stream,
                system,
            };
            block_on(commands::ask::execute(&config, request))
        }
        Commands::Chat {
            provider,
            generation,
        } => {
            block_on(commands::chat::execute(&config, provider, generation))?;
            Ok(Outcome::Done)
        }
        Commands::Providers => {
            commands::providers::list_providers(&config);
            Ok(Outcome::Done)
        }
        Commands::Models { provider } => {
            commands::providers::list_models(&config, &provider)?;
            Ok(Outcome::Done)
        }
        Commands::Config { action } => {
            commands::config::execute(&mut config, action)?;
            Ok(Outcome::Done)
        }
        Commands::Setup => {
            commands::setup::run_wizard(&mut config)?;
            Ok(Outcome::Done)
        }
        Commands::Usage { action } => {
            commands::usage::execute(&config, action)?;
            Ok(Outcome::Done)
        }
    }
}

/// Single-threaded runtime: at most one request is in flight
fn block_on<T>(future: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let output = runtime.block_on(future);
    // A pending stdin read must not hold up exit
    runtime.shutdown_background();
    output
}
