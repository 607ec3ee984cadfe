//! Generative model seam. The pipeline talks to one remote completion
//! endpoint; everything it needs is `complete(prompt, options)`.

pub mod external;

pub use external::ExternalProvider;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;

/// External API providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    Google,
    OpenAi,
    Ollama,
    Custom { endpoint: String },
}

/// Sampling settings for one completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: usize,
}

impl GenerationOptions {
    /// Temperature zero, for reproducible classification and answering.
    pub fn deterministic(max_output_tokens: usize) -> Self {
        Self {
            temperature: 0.0,
            max_output_tokens,
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::deterministic(1024)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
}

/// Core trait for completion providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for the prompt.
    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;

    /// Get provider info for logging.
    fn info(&self) -> ProviderInfo;
}

/// Build the configured completion backend, resolving the API key from the
/// environment variable the config names. Local backends (Ollama, custom
/// endpoints) work without a key.
pub fn from_config(config: &ModelConfig) -> Result<Arc<dyn CompletionProvider>> {
    let api_key = match &config.provider {
        ApiProvider::Google | ApiProvider::OpenAi => std::env::var(&config.api_key_env)
            .with_context(|| format!("{} is not set", config.api_key_env))?,
        ApiProvider::Ollama | ApiProvider::Custom { .. } => {
            std::env::var(&config.api_key_env).unwrap_or_default()
        }
    };

    Ok(Arc::new(ExternalProvider::new(
        config.provider.clone(),
        api_key,
        config.model.clone(),
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_options_pin_temperature_to_zero() {
        let options = GenerationOptions::deterministic(512);
        assert_eq!(options.temperature, 0.0);
        assert_eq!(options.max_output_tokens, 512);
    }

    #[test]
    fn provider_names_deserialize_lowercase() {
        assert!(matches!(
            serde_json::from_str::<ApiProvider>("\"google\"").unwrap(),
            ApiProvider::Google
        ));
        assert!(matches!(
            serde_json::from_str::<ApiProvider>("\"openai\"").unwrap(),
            ApiProvider::OpenAi
        ));
        assert!(matches!(
            serde_json::from_str::<ApiProvider>("\"ollama\"").unwrap(),
            ApiProvider::Ollama
        ));
    }
}
