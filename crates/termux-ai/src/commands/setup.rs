use ai_clients::ProviderId;
use anyhow::Result;
use std::io::{self, BufRead, Write};

use crate::config::ConfigStore;

const MIN_KEY_LEN: usize = 11;

/// Walk through every provider and ask for an API key
pub fn run_wizard(config: &mut ConfigStore) -> Result<()> {
    println!("Welcome to Termux AI Tool Configuration Wizard!");
    println!("{}", "=".repeat(50));

    for id in ProviderId::ALL {
        println!("\n{}:", id.display_name());
        println!("  Get your API key from {}", id.key_help_url());

        let key_name = id.api_key_setting();
        if config.get(&key_name).is_some_and(|v| !v.trim().is_empty()) {
            println!("  Current API key: ********");
            if prompt_line("  Update API key? (y/N): ")?.to_lowercase() != "y" {
                continue;
            }
        }

        loop {
            let key = prompt_line("  Enter API key (or press Enter to skip): ")?;
            if key.is_empty() {
                break;
            }
            if key.len() >= MIN_KEY_LEN {
                config.set(&key_name, &key)?;
                println!("  ✓ API key saved for {}", id.display_name());
                break;
            }
            println!("  Invalid API key. Please try again.");
        }
    }

    println!("\n{}", "=".repeat(50));
    println!("Configuration complete!");

    let configured: Vec<&str> = config
        .validate_api_keys()
        .into_iter()
        .filter(|(_, ok)| *ok)
        .map(|(id, _)| id.display_name())
        .collect();
    if configured.is_empty() {
        println!("\nNo providers configured. You can add API keys later using:");
        println!("  termux-ai config set <provider>_api_key <your_api_key>");
    } else {
        println!("\nConfigured providers: {}", configured.join(", "));
    }
    Ok(())
}

/// Print a prompt and read one trimmed line. EOF reads as empty.
pub fn prompt_line(prompt: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
