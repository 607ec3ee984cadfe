pub mod classifier;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod escalation;
pub mod indexing;
pub mod llm;
pub mod processing;
pub mod responder;
pub mod retrieval;
pub mod storage;
pub mod types;
pub mod workflow;

// Re-export primary types for convenience
pub use classifier::{normalize, Classifier};
pub use config::SupportConfig;
pub use error::PipelineError;
pub use escalation::{HUMAN_ESCALATION_MESSAGE, RETURNS_POLICY_MESSAGE};
pub use indexing::Ingestor;
pub use responder::{RagResponder, NO_INFORMATION_ANSWER};
pub use retrieval::Retriever;
pub use storage::{LanceStore, SearchHit, SemanticIndex};
pub use types::{Category, ChunkRecord};
pub use workflow::{route, Exchange, Route, SupportWorkflow};

// Re-export LLM types
pub use llm::{ApiProvider, CompletionProvider, GenerationOptions, ProviderInfo};

// Re-export common types
pub use anyhow::{Error, Result};
pub use uuid::Uuid;
