pub mod anthropic_provider;
pub mod gateway;
pub mod generator;
pub mod openai_compatible_provider;
pub mod provider;
pub mod testing;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use gateway::{GatewayError, LlmGateway};
pub use generator::ContentGenerator;
pub use openai_compatible_provider::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
pub use provider::{GenerationConfig, LlmProvider, LlmResponse, Message, MessageRole, ProviderError};
