pub mod anthropic;
pub mod cohere;
pub mod gemini;
pub(crate) mod http;
pub mod huggingface;
pub mod openai;
pub mod provider;
pub mod streaming;
pub mod types;

pub use anthropic::AnthropicClient;
pub use cohere::CohereClient;
pub use gemini::GeminiClient;
pub use huggingface::HuggingFaceClient;
pub use openai::OpenAIClient;
pub use provider::Provider;
pub use streaming::{fragment_stream, LineOutcome};
pub use types::{FragmentStream, GenerationOptions, Message, ProviderId, Response, Role};
