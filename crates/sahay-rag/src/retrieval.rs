use std::sync::Arc;

use anyhow::{Context, Result};

use crate::embeddings::EmbeddingProvider;
use crate::storage::{SearchHit, SemanticIndex};

/// Embeds a question and pulls the top-k nearest chunks from the index.
/// `top_k` is fixed at construction; requests cannot vary it.
pub struct Retriever {
    embeddings: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn SemanticIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn SemanticIndex>,
        top_k: usize,
    ) -> Self {
        Self {
            embeddings,
            index,
            top_k,
        }
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchHit>> {
        let vector = self
            .embeddings
            .embed_query(question)
            .await
            .context("Failed to embed query")?;

        let hits = self
            .index
            .search(&vector, self.top_k)
            .await
            .context("Semantic index search failed")?;

        tracing::debug!(
            requested = self.top_k,
            returned = hits.len(),
            top_score = hits.first().map(|h| h.score).unwrap_or(0.0),
            "Retrieved context chunks"
        );

        Ok(hits)
    }
}
