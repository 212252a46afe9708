use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "termux-ai")]
#[command(about = "Termux AI Tool - Multi-AI API Integration", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (default: ~/.config/termux-ai-tool/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a single prompt
    Ask {
        /// AI provider to use (falls back to `default_provider`)
        #[arg(short, long)]
        provider: Option<String>,
        /// Prompt to send to the AI
        #[arg(short = 'q', long)]
        prompt: String,
        #[command(flatten)]
        generation: GenerationArgs,
        /// Stream the response in real time
        #[arg(long)]
        stream: bool,
        /// System message sent before the prompt
        #[arg(long)]
        system: Option<String>,
    },
    /// Interactive chat (responses are always streamed)
    Chat {
        #[arg(short, long)]
        provider: Option<String>,
        #[command(flatten)]
        generation: GenerationArgs,
    },
    /// List all providers and whether they are configured
    Providers,
    /// List the model catalog of a provider
    Models {
        #[arg(short, long)]
        provider: String,
    },
    /// Read and write configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Interactive API key setup
    Setup,
    /// Write an example config file
    Init {
        /// Path for the new config file (default: the standard location)
        path: Option<PathBuf>,
    },
    /// Usage statistics
    Usage {
        #[command(subcommand)]
        action: UsageCommands,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct GenerationArgs {
    /// Model to use (e.g. gpt-4, claude-3-opus-20240229, gemini-pro)
    #[arg(short, long)]
    pub model: Option<String>,
    /// Sampling temperature (0.0-2.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,
    /// Maximum tokens in the response (1-100000)
    #[arg(long)]
    pub max_tokens: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set { key: String, value: String },
    /// Print a configuration value
    Get { key: String },
    /// Remove a configuration value
    Delete { key: String },
    /// List all configuration (secrets hidden)
    List,
    /// Remove every configuration value
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Write the configuration to a file with secrets masked
    Export { path: PathBuf },
    /// Merge configuration from a file
    Import { path: PathBuf },
    /// Show which providers have an API key
    Check,
}

#[derive(Subcommand, Debug)]
pub enum UsageCommands {
    /// Show usage statistics
    Show,
    /// Delete the usage log
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "termux-ai",
            "ask",
            "-p",
            "openai",
            "-q",
            "Hello",
            "--model",
            "gpt-4",
            "-t",
            "0.3",
            "--max-tokens",
            "20",
            "--stream",
        ])
        .unwrap();

        match cli.command {
            Commands::Ask {
                provider,
                prompt,
                generation,
                stream,
                system,
            } => {
                assert_eq!(provider.as_deref(), Some("openai"));
                assert_eq!(prompt, "Hello");
                assert_eq!(generation.model.as_deref(), Some("gpt-4"));
                assert_eq!(generation.temperature, Some(0.3));
                assert_eq!(generation.max_tokens, Some(20));
                assert!(stream);
                assert!(system.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_ask_requires_prompt() {
        assert!(Cli::try_parse_from(["termux-ai", "ask", "-p", "openai"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "termux-ai",
            "providers",
            "--config",
            "/tmp/x.toml",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
        assert_eq!(cli.log_level(), "debug");
        assert!(!cli.log_json);
    }

    #[test]
    fn test_parse_config_set() {
        let cli =
            Cli::try_parse_from(["termux-ai", "config", "set", "openai_api_key", "sk-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigCommands::Set { ref key, ref value }
            } if key == "openai_api_key" && value == "sk-1"
        ));
    }

    #[test]
    fn test_init_path_optional() {
        let cli = Cli::try_parse_from(["termux-ai", "init"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { path: None }));
    }
}
