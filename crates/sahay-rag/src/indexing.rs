//! Document ingestion into the semantic index.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::embeddings::EmbeddingProvider;
use crate::processing::TextChunker;
use crate::storage::SemanticIndex;
use crate::types::ChunkRecord;

/// Splits documents into chunks, embeds them and writes them to the index.
pub struct Ingestor {
    chunker: TextChunker,
    embeddings: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn SemanticIndex>,
}

impl Ingestor {
    pub fn new(
        chunker: TextChunker,
        embeddings: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn SemanticIndex>,
    ) -> Self {
        Self {
            chunker,
            embeddings,
            index,
        }
    }

    /// Ingest a text file, using its path as the source label.
    pub async fn ingest_file(&self, path: &Path) -> Result<usize> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.ingest_text(&text, &path.display().to_string()).await
    }

    /// Chunk, embed and store one document. Returns the number of chunks
    /// written. Chunks previously indexed under the same source are replaced,
    /// so re-running ingestion does not duplicate records.
    pub async fn ingest_text(&self, text: &str, source: &str) -> Result<usize> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            tracing::warn!(source = %source, "Document produced no chunks, skipping");
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = self
            .embeddings
            .embed_documents(&texts)
            .await
            .with_context(|| format!("Failed to embed {} chunks from {}", texts.len(), source))?;

        let doc_id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();
        let records: Vec<ChunkRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| ChunkRecord {
                id: chunk.id.to_string(),
                doc_id: doc_id.clone(),
                chunk_index: chunk.index as u32,
                source: source.to_string(),
                text: chunk.text.clone(),
                vector,
                indexed_at: now,
            })
            .collect();

        let replaced = self.index.delete_by_source(source).await?;
        if replaced > 0 {
            tracing::info!(source = %source, replaced, "Replaced previously indexed chunks");
        }

        let count = records.len();
        self.index.add(records).await?;
        tracing::info!(source = %source, chunks = count, "Ingested document");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SearchHit;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.2; 4])
        }

        async fn embed_document(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.2; 4])
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    struct MemoryIndex {
        records: Mutex<Vec<ChunkRecord>>,
    }

    impl MemoryIndex {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SemanticIndex for MemoryIndex {
        async fn add(&self, chunks: Vec<ChunkRecord>) -> Result<()> {
            self.records.lock().unwrap().extend(chunks);
            Ok(())
        }

        async fn search(&self, _vector: &[f32], _k: usize) -> Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }

        async fn delete_by_source(&self, source: &str) -> Result<usize> {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| r.source != source);
            Ok(before - records.len())
        }

        async fn count(&self) -> Result<usize> {
            Ok(self.records.lock().unwrap().len())
        }
    }

    fn ingestor_over(index: Arc<MemoryIndex>) -> Ingestor {
        Ingestor::new(
            TextChunker::new(200, 40, 10),
            Arc::new(FakeEmbedder),
            index as _,
        )
    }

    #[tokio::test]
    async fn short_document_becomes_one_labeled_record() {
        let index = Arc::new(MemoryIndex::new());
        let ingestor = ingestor_over(Arc::clone(&index));

        let written = ingestor
            .ingest_text("The Wireless Earbuds Elite cost $79.99.", "catalog.txt")
            .await
            .unwrap();

        assert_eq!(written, 1);
        let records = index.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, "catalog.txt");
        assert_eq!(records[0].chunk_index, 0);
        assert_eq!(records[0].vector.len(), 4);
        assert!(records[0].indexed_at > 0);
    }

    #[tokio::test]
    async fn long_document_shares_one_doc_id_across_chunks() {
        let index = Arc::new(MemoryIndex::new());
        let ingestor = ingestor_over(Arc::clone(&index));
        let text = "The SmartWatch Pro X battery lasts days. ".repeat(20);

        let written = ingestor.ingest_text(&text, "manual.txt").await.unwrap();

        assert!(written >= 2);
        let records = index.records.lock().unwrap();
        assert_eq!(records.len(), written);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.doc_id, records[0].doc_id);
            assert_eq!(record.chunk_index, i as u32);
        }
    }

    #[tokio::test]
    async fn reingesting_a_source_replaces_its_chunks() {
        let index = Arc::new(MemoryIndex::new());
        let ingestor = ingestor_over(Arc::clone(&index));

        ingestor
            .ingest_text("The HomeHub Mini supports two assistants.", "catalog.txt")
            .await
            .unwrap();
        ingestor
            .ingest_text("The HomeHub Mini supports two assistants.", "catalog.txt")
            .await
            .unwrap();

        assert_eq!(index.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_document_is_a_no_op() {
        let index = Arc::new(MemoryIndex::new());
        let ingestor = ingestor_over(Arc::clone(&index));

        let written = ingestor.ingest_text("   \n  ", "blank.txt").await.unwrap();

        assert_eq!(written, 0);
        assert_eq!(index.records.lock().unwrap().len(), 0);
    }
}
