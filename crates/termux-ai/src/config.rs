use ai_clients::{ProviderId, SettingsSource};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

pub const CONFIG_DIR: &str = "~/.config/termux-ai-tool";
pub const CONFIG_FILE: &str = "config.toml";
pub const MASKED: &str = "***masked***";

pub const DEFAULT_PROVIDER_KEY: &str = "default_provider";
pub const STREAM_BY_DEFAULT_KEY: &str = "stream_by_default";

/// Flat TOML key/value store backing the CLI. Every mutation is saved
/// immediately.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    values: Table,
    env_fallback: bool,
}

impl ConfigStore {
    /// Load from `path`, or the default location. A missing file is an empty
    /// store; an unparsable one is logged and treated as empty.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => expand(&p.to_string_lossy()),
            None => default_path(),
        };

        let values = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            match toml::from_str::<Table>(&content) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Failed to parse config file, starting empty");
                    Table::new()
                }
            }
        } else {
            Table::new()
        };

        Ok(Self {
            path,
            values,
            env_fallback: true,
        })
    }

    /// Ignore provider environment variables (tests, explicit configs)
    pub fn without_env(mut self) -> Self {
        self.env_fallback = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the config file (and the usage log)
    pub fn dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Value as stored in the file, rendered as text
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(render_value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
        self.save()
    }

    /// Returns whether the key existed
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        if self.values.remove(key).is_none() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// All stored entries, sorted by key
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), render_value(v)))
            .collect();
        entries.sort();
        entries
    }

    pub fn clear(&mut self) -> Result<()> {
        self.values.clear();
        self.save()
    }

    /// Write a copy with every secret replaced by a placeholder
    pub fn export(&self, path: &Path) -> Result<()> {
        let masked: Table = self
            .values
            .iter()
            .map(|(k, v)| {
                let v = if is_secret_key(k) {
                    Value::String(MASKED.to_string())
                } else {
                    v.clone()
                };
                (k.clone(), v)
            })
            .collect();
        let content = toml::to_string_pretty(&masked).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    /// Merge another config file over this one. Masked placeholders never
    /// overwrite real values.
    pub fn import(&mut self, path: &Path) -> Result<usize> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let imported: Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML in {:?}", path))?;

        let mut merged = 0;
        for (key, value) in imported {
            if value.as_str() == Some(MASKED) {
                continue;
            }
            self.values.insert(key, value);
            merged += 1;
        }
        self.save()?;
        Ok(merged)
    }

    /// Whether each provider has a usable credential
    pub fn validate_api_keys(&self) -> Vec<(ProviderId, bool)> {
        ProviderId::ALL
            .into_iter()
            .map(|id| (id, SettingsSource::get(self, &id.api_key_setting()).is_some()))
            .collect()
    }

    /// The `<provider>_settings` sub-table, empty when absent
    pub fn provider_settings(&self, provider: ProviderId) -> Table {
        self.values
            .get(&format!("{}_settings", provider.as_str()))
            .and_then(Value::as_table)
            .cloned()
            .unwrap_or_default()
    }

    /// Boolean flag stored as text or TOML bool
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
    }

    /// Save with owner-only permissions, via temp file and rename
    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            create_private_dir(parent)?;
        }

        let content = toml::to_string_pretty(&self.values).context("Failed to serialize config")?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", temp_path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))
                .context("Failed to set config file permissions")?;
        }

        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace config file: {:?}", self.path))?;
        tracing::debug!(path = ?self.path, "Config saved");
        Ok(())
    }
}

/// Lookup used by the provider registry: the file first, then the
/// provider's `<provider>_settings` table, then environment variables for
/// API keys.
impl SettingsSource for ConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = ConfigStore::get(self, key).filter(|v| !v.trim().is_empty()) {
            return Some(value);
        }

        let (provider, field) = ProviderId::ALL
            .into_iter()
            .find_map(|id| key.strip_prefix(id.as_str())?.strip_prefix('_').map(|f| (id, f)))?;

        if let Some(value) = self.provider_settings(provider).get(field).map(render_value) {
            return Some(value);
        }

        if self.env_fallback && key == provider.api_key_setting() {
            return provider
                .env_vars()
                .iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|v| !v.trim().is_empty());
        }
        None
    }
}

/// `api_key`, `token` and `secret` entries are never shown or exported
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    ["api_key", "token", "secret"]
        .iter()
        .any(|marker| key.contains(marker))
}

pub fn default_path() -> PathBuf {
    expand(CONFIG_DIR).join(CONFIG_FILE)
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

fn create_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = fs::set_permissions(dir, fs::Permissions::from_mode(0o700)) {
            tracing::debug!(dir = ?dir, error = %e, "Could not restrict config directory");
        }
    }
    Ok(())
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ConfigStore {
        ConfigStore::load(Some(dir.path().join("cfg").join("config.toml").as_path()))
            .unwrap()
            .without_env()
    }

    #[test]
    fn test_set_get_persists() {
        let dir = TempDir::new().unwrap();
        let mut config = store(&dir);
        config.set("openai_api_key", "sk-123").unwrap();
        config.set("default_provider", "openai").unwrap();

        let reloaded = store(&dir);
        assert_eq!(reloaded.get("openai_api_key").as_deref(), Some("sk-123"));
        assert_eq!(
            reloaded.entries(),
            vec![
                ("default_provider".to_string(), "openai".to_string()),
                ("openai_api_key".to_string(), "sk-123".to_string()),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mut config = store(&dir);
        config.set("k", "v").unwrap();

        let file_mode = fs::metadata(config.path()).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
        let dir_mode = fs::metadata(config.dir()).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[test]
    fn test_delete_and_clear() {
        let dir = TempDir::new().unwrap();
        let mut config = store(&dir);
        config.set("a", "1").unwrap();
        config.set("b", "2").unwrap();

        assert!(config.delete("a").unwrap());
        assert!(!config.delete("a").unwrap());
        config.clear().unwrap();
        assert!(store(&dir).entries().is_empty());
    }

    #[test]
    fn test_unparsable_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();
        let config = ConfigStore::load(Some(path.as_path())).unwrap();
        assert!(config.entries().is_empty());
    }

    #[test]
    fn test_export_masks_secrets_and_import_merges() {
        let dir = TempDir::new().unwrap();
        let mut config = store(&dir);
        config.set("openai_api_key", "sk-real").unwrap();
        config.set("hf_token", "hf_real").unwrap();
        config.set("default_provider", "openai").unwrap();

        let exported = dir.path().join("export.toml");
        config.export(&exported).unwrap();
        let text = fs::read_to_string(&exported).unwrap();
        assert!(text.contains(MASKED));
        assert!(!text.contains("sk-real"));
        assert!(!text.contains("hf_real"));

        let mut other = ConfigStore::load(Some(dir.path().join("other.toml").as_path()))
            .unwrap()
            .without_env();
        other.set("openai_api_key", "sk-other").unwrap();
        let merged = other.import(&exported).unwrap();
        assert_eq!(merged, 1);
        assert_eq!(other.get("openai_api_key").as_deref(), Some("sk-other"));
        assert_eq!(other.get("default_provider").as_deref(), Some("openai"));
    }

    #[test]
    fn test_typed_values_render_as_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "default_temperature = 0.5\nstream_by_default = true\n\n[cohere_settings]\nmodel = \"command-light\"\n",
        )
        .unwrap();
        let config = ConfigStore::load(Some(path.as_path())).unwrap().without_env();

        assert_eq!(config.get("default_temperature").as_deref(), Some("0.5"));
        assert!(config.flag(STREAM_BY_DEFAULT_KEY));
        assert_eq!(
            SettingsSource::get(&config, "cohere_model").as_deref(),
            Some("command-light")
        );
        assert_eq!(
            config.provider_settings(ProviderId::Cohere).get("model"),
            Some(&Value::String("command-light".into()))
        );
    }

    #[test]
    fn test_validate_api_keys() {
        let dir = TempDir::new().unwrap();
        let mut config = store(&dir);
        config.set("gemini_api_key", "g-key").unwrap();
        config.set("openai_api_key", "   ").unwrap();

        let status = config.validate_api_keys();
        assert_eq!(status.len(), 5);
        assert!(status.contains(&(ProviderId::Gemini, true)));
        assert!(status.contains(&(ProviderId::OpenAI, false)));
    }

    #[test]
    fn test_secret_detection() {
        assert!(is_secret_key("openai_api_key"));
        assert!(is_secret_key("HF_TOKEN"));
        assert!(is_secret_key("client_secret"));
        assert!(!is_secret_key("default_provider"));
    }
}
