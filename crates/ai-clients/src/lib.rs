pub mod error;
pub mod llm;
pub mod registry;
pub mod settings;

pub use error::ClientError;
pub use llm::{
    AnthropicClient, CohereClient, FragmentStream, GeminiClient, GenerationOptions,
    HuggingFaceClient, Message, OpenAIClient, Provider, ProviderId, Response, Role,
};
pub use registry::ClientRegistry;
pub use settings::{ProviderConfig, SettingsSource};

/// Initialize logging on stderr. `RUST_LOG` wins over `level` when set.
/// Output is structured JSON when `json` is true, human-readable otherwise.
pub fn init_logging(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);

    // A second call (tests, embedding callers) keeps the first subscriber
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.with_target(false).try_init()
    };
}
