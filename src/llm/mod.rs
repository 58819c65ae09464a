pub mod providers;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Text generation provider types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GeneratorProvider {
    OpenAI,
    LMStudio,
}

/// Text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub provider: GeneratorProvider,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: GeneratorProvider::OpenAI,
            endpoint: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout_seconds: 60,
        }
    }
}

/// Chat message for generation backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Abstract text generation capability.
///
/// An empty response body from the backend is a valid empty result, not an
/// error. Stages that require non-empty content enforce that themselves.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String>;
    fn provider_type(&self) -> GeneratorProvider;
}

/// Create a generator instance based on configuration
pub fn create_generator(config: &LLMConfig) -> Result<Box<dyn TextGenerator>> {
    match config.provider {
        GeneratorProvider::OpenAI => Ok(Box::new(providers::OpenAIProvider::new(config.clone())?)),
        GeneratorProvider::LMStudio => {
            Ok(Box::new(providers::LMStudioProvider::new(config.clone())?))
        }
    }
}
