pub mod lance_store;

pub use lance_store::LanceStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::ChunkRecord;

/// One retrieval result, ranked by descending similarity.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub doc_id: String,
    pub chunk_index: u32,
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// Persisted nearest-neighbor store over chunk embeddings. The serving path
/// only ever calls `search`; writes happen through ingestion.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Insert chunk records with their vectors.
    async fn add(&self, chunks: Vec<ChunkRecord>) -> Result<()>;

    /// Return up to `k` chunks nearest to the query vector, best first.
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit>>;

    /// Remove every chunk ingested under the given source label, returning
    /// how many were removed.
    async fn delete_by_source(&self, source: &str) -> Result<usize>;

    /// Total number of stored chunks.
    async fn count(&self) -> Result<usize>;
}
