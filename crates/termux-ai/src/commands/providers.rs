use anyhow::Result;
use std::fmt::Write;

use super::build_registry;
use crate::config::ConfigStore;

/// All supported providers with their configuration status
pub fn list_providers(config: &ConfigStore) {
    println!("Available providers:");
    for (id, configured) in config.validate_api_keys() {
        let status = if configured { "configured" } else { "not configured" };
        println!("  - {:<12} {:<20} ({status})", id.as_str(), id.display_name());
    }
}

/// Static model catalog of one configured provider
pub fn list_models(config: &ConfigStore, provider: &str) -> Result<()> {
    let registry = build_registry(config)?;
    let models = registry.available_models(provider)?;
    println!("{}", format_model_list(models, provider));
    Ok(())
}

fn format_model_list(models: &[&str], provider: &str) -> String {
    if models.is_empty() {
        return format!("No models available for {provider}");
    }
    let mut out = format!("Available models for {provider}:");
    for (i, model) in models.iter().enumerate() {
        let _ = write!(out, "\n  {}. {model}", i + 1);
    }
    out
}
