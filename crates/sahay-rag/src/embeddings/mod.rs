//! Embedding provider seam. Queries and documents must land in the same
//! vector space or index lookups are meaningless, so one provider instance
//! serves both the ingest and the query path.

pub mod remote;

pub use remote::{GoogleEmbeddings, OpenAiCompatibleEmbeddings};

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::llm::ApiProvider;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a search query (with the query-side task hint where the backend
    /// distinguishes them).
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a document passage for indexing.
    async fn embed_document(&self, text: &str) -> Result<Vec<f32>>;

    /// Batch embed documents for ingestion.
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_document(text).await?);
        }
        Ok(vectors)
    }

    /// Embedding vector dimension.
    fn dimension(&self) -> usize;
}

/// Build the configured embedding backend, resolving the API key from the
/// environment variable the config names.
pub fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match &config.provider {
        ApiProvider::Google => {
            let api_key = std::env::var(&config.api_key_env)
                .with_context(|| format!("{} is not set", config.api_key_env))?;
            Ok(Arc::new(GoogleEmbeddings::new(
                api_key,
                config.model.clone(),
                config.dimension,
            )?))
        }
        ApiProvider::OpenAi => {
            let api_key = std::env::var(&config.api_key_env)
                .with_context(|| format!("{} is not set", config.api_key_env))?;
            Ok(Arc::new(OpenAiCompatibleEmbeddings::new(
                "https://api.openai.com/v1".to_string(),
                api_key,
                config.model.clone(),
                config.dimension,
            )?))
        }
        ApiProvider::Ollama => {
            let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
            Ok(Arc::new(OpenAiCompatibleEmbeddings::new(
                "http://localhost:11434/v1".to_string(),
                api_key,
                config.model.clone(),
                config.dimension,
            )?))
        }
        ApiProvider::Custom { endpoint } => {
            let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
            Ok(Arc::new(OpenAiCompatibleEmbeddings::new(
                endpoint.clone(),
                api_key,
                config.model.clone(),
                config.dimension,
            )?))
        }
    }
}
