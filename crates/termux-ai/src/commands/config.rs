use ai_clients::ProviderId;
use anyhow::Result;

use super::setup::prompt_line;
use crate::cli::ConfigCommands;
use crate::config::{is_secret_key, ConfigStore};

pub fn execute(config: &mut ConfigStore, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Set { key, value } => {
            if let Some(warning) = key_warning(&key, &value) {
                eprintln!("Warning: {warning}");
            }
            config.set(&key, &value)?;
            println!("Configuration set: {key}");
        }
        ConfigCommands::Get { key } => match config.get(&key) {
            Some(value) => println!("{key}: {value}"),
            None => println!("Configuration key '{key}' not found"),
        },
        ConfigCommands::Delete { key } => {
            if config.delete(&key)? {
                println!("Configuration key '{key}' deleted");
            } else {
                println!("Configuration key '{key}' not found");
            }
        }
        ConfigCommands::List => {
            println!("Configuration ({}):", config.path().display());
            for (key, value) in config.entries() {
                println!("  {key}: {}", display_value(&key, &value));
            }
        }
        ConfigCommands::Clear { yes } => {
            if !yes && prompt_line("Remove all configuration? (y/N): ")?.to_lowercase() != "y" {
                println!("Aborted.");
                return Ok(());
            }
            config.clear()?;
            println!("Configuration cleared.");
        }
        ConfigCommands::Export { path } => {
            config.export(&path)?;
            println!("Configuration exported to {} (API keys masked)", path.display());
        }
        ConfigCommands::Import { path } => {
            let merged = config.import(&path)?;
            println!("Imported {merged} entries from {}", path.display());
        }
        ConfigCommands::Check => {
            for (id, configured) in config.validate_api_keys() {
                let mark = if configured { "✓" } else { "✗" };
                println!("  {mark} {}", id.display_name());
            }
        }
    }
    Ok(())
}

/// Secrets are never echoed back
fn display_value(key: &str, value: &str) -> String {
    if !is_secret_key(key) {
        value.to_string()
    } else if value.is_empty() {
        "Not set".to_string()
    } else {
        "********".to_string()
    }
}

/// Shape check for `<provider>_api_key` values. Advisory only.
fn key_warning(key: &str, value: &str) -> Option<String> {
    let provider = ProviderId::ALL
        .into_iter()
        .find(|id| id.api_key_setting() == key)?;
    if provider.looks_like_valid_key(value) {
        None
    } else {
        Some(format!(
            "this does not look like a {} API key (see {})",
            provider.display_name(),
            provider.key_help_url()
        ))
    }
}
