use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::llm::ApiProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportConfig {
    pub data_dir: PathBuf,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: ApiProvider,
    pub model: String,
    pub dimension: usize,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per query. Fixed per deployment, never
    /// adjustable per request.
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: ApiProvider,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub max_output_tokens: usize,
}

impl SupportConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.embedding.dimension == 0 {
            return Err("embedding.dimension must be > 0".into());
        }
        if self.embedding.model.is_empty() {
            return Err("embedding.model must not be empty".into());
        }
        if self.chunking.chunk_size < 50 {
            return Err("chunking.chunk_size must be >= 50".into());
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err("chunking.chunk_overlap must be < chunk_size".into());
        }
        if self.chunking.min_chunk_size >= self.chunking.chunk_size {
            return Err("chunking.min_chunk_size must be < chunk_size".into());
        }
        if self.retrieval.top_k == 0 {
            return Err("retrieval.top_k must be > 0".into());
        }
        if self.model.model.is_empty() {
            return Err("model.model must not be empty".into());
        }
        if self.model.max_output_tokens == 0 {
            return Err("model.max_output_tokens must be > 0".into());
        }
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Where the vector index lives on disk.
    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }
}

impl Default for SupportConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sahay");

        Self {
            data_dir,
            embedding: EmbeddingConfig {
                provider: ApiProvider::Google,
                model: "embedding-001".to_string(),
                dimension: 768,
                api_key_env: "GOOGLE_API_KEY".to_string(),
            },
            chunking: ChunkingConfig {
                chunk_size: 500,
                chunk_overlap: 50,
                min_chunk_size: 25,
            },
            retrieval: RetrievalConfig { top_k: 3 },
            model: ModelConfig {
                provider: ApiProvider::Google,
                model: "gemini-2.5-flash".to_string(),
                api_key_env: "GOOGLE_API_KEY".to_string(),
                max_output_tokens: 1024,
            },
        }
    }
}
