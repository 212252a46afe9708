use anyhow::{Context, Result};
use std::path::Path;

const EXAMPLE_CONFIG: &str = r#"# Termux AI Tool configuration
# Values here take precedence over OPENAI_API_KEY and friends.

openai_api_key = "your_openai_api_key_here"
anthropic_api_key = "your_anthropic_api_key_here"
gemini_api_key = "your_gemini_api_key_here"
cohere_api_key = "your_cohere_api_key_here"
huggingface_api_key = "your_huggingface_api_key_here"

default_provider = "openai"
default_temperature = 0.7
default_max_tokens = 1000
stream_by_default = false

openai_model = "gpt-3.5-turbo"
anthropic_model = "claude-3-sonnet-20240229"
gemini_model = "gemini-pro"
cohere_model = "command"
huggingface_model = "microsoft/DialoGPT-medium"

# Per-provider overrides (model, base_url)
[openai_settings]
base_url = "https://api.openai.com/v1"

[anthropic_settings]
base_url = "https://api.anthropic.com/v1"
"#;

/// Write the example config. Never overwrites.
pub fn run_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config already exists at {:?}", path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }
    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {:?}", path))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    println!("Created config at {:?}", path);
    println!("Replace the placeholder keys, or run `termux-ai setup`.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use tempfile::TempDir;

    #[test]
    fn test_example_config_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        run_init(&path).unwrap();

        let config = ConfigStore::load(Some(path.as_path())).unwrap();
        assert_eq!(config.get("default_provider").as_deref(), Some("openai"));
        assert_eq!(config.get("default_max_tokens").as_deref(), Some("1000"));
        assert!(!config.flag("stream_by_default"));
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "keep = true").unwrap();

        assert!(run_init(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep = true");
    }
}
