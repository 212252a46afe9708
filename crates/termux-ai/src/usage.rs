use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const TOP_MODELS: usize = 5;

/// One line of `logs/usage.log`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageEntry {
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub prompt_tokens: usize,
    #[serde(default)]
    pub response_tokens: usize,
}

#[derive(Debug, Default, PartialEq)]
pub struct UsageStats {
    pub total_calls: usize,
    pub by_provider: BTreeMap<String, usize>,
    /// Most used models first, at most five
    pub top_models: Vec<(String, usize)>,
    pub total_tokens: usize,
}

/// Append-only JSONL record of completed requests
pub struct UsageLog {
    path: PathBuf,
}

impl UsageLog {
    pub fn in_dir(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join("logs").join("usage.log"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best effort: failures are logged and swallowed
    pub fn record(&self, provider: &str, model: &str, prompt: &str, response: &str) {
        let entry = UsageEntry {
            timestamp: Utc::now(),
            provider: provider.to_string(),
            model: model.to_string(),
            prompt_tokens: estimate_tokens(prompt),
            response_tokens: estimate_tokens(response),
        };
        if let Err(e) = self.append(&entry) {
            tracing::debug!(error = %e, path = ?self.path, "Failed to write usage log");
        }
    }

    fn append(&self, entry: &UsageEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(entry)?)?;
        Ok(())
    }

    /// `None` when nothing has been recorded yet
    pub fn stats(&self) -> Result<Option<UsageStats>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {:?}", self.path))?;
        Ok(Some(summarize(&content)))
    }

    /// Returns whether there was anything to remove
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).with_context(|| format!("Failed to remove {:?}", self.path))?;
        Ok(true)
    }
}

/// Roughly four characters per token
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

fn summarize(content: &str) -> UsageStats {
    let mut stats = UsageStats::default();
    let mut models: BTreeMap<String, usize> = BTreeMap::new();

    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        stats.total_calls += 1;
        let Ok(entry) = serde_json::from_str::<UsageEntry>(line) else {
            continue;
        };
        *stats.by_provider.entry(entry.provider).or_default() += 1;
        *models.entry(entry.model).or_default() += 1;
        stats.total_tokens += entry.prompt_tokens + entry.response_tokens;
    }

    let mut top: Vec<(String, usize)> = models.into_iter().collect();
    // Stable sort keeps ties in name order
    top.sort_by(|a, b| b.1.cmp(&a.1));
    top.truncate(TOP_MODELS);
    stats.top_models = top;
    stats
}

pub fn print_stats(stats: &UsageStats) {
    println!("Total API calls: {}", stats.total_calls);

    println!("\nProviders used:");
    for (provider, count) in &stats.by_provider {
        println!("  {provider}: {count} calls");
    }

    println!("\nTop models:");
    for (model, count) in &stats.top_models {
        println!("  {model}: {count} calls");
    }

    println!("\nApproximate total tokens: {}", stats.total_tokens);
}
