//! Grounded answering for product questions.
//!
//! Retrieval output becomes a Context block; the prompt instructs the model
//! to answer from that block alone and to emit [`NO_INFORMATION_ANSWER`]
//! when it cannot. Grounding is enforced by the prompt contract only; the
//! model's reply is returned verbatim, with no post-hoc check against the
//! retrieved text.

use std::sync::Arc;

use crate::error::PipelineError;
use crate::llm::{CompletionProvider, GenerationOptions};
use crate::retrieval::Retriever;
use crate::storage::SearchHit;

/// The refusal string the model is told to emit when the context lacks the
/// answer.
pub const NO_INFORMATION_ANSWER: &str = "I don't have that information in my knowledge base.";

/// Join retrieved chunk texts in rank order, separated by a blank line.
fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_answer_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question based only on the following context. \nIf the answer is not in the context, say \"{}\"\n\nContext:\n{}\n\nQuestion: {}\n\nAnswer:",
        NO_INFORMATION_ANSWER, context, question
    )
}

pub struct RagResponder {
    retriever: Retriever,
    model: Arc<dyn CompletionProvider>,
    options: GenerationOptions,
}

impl RagResponder {
    pub fn new(
        retriever: Retriever,
        model: Arc<dyn CompletionProvider>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            retriever,
            model,
            options,
        }
    }

    /// Answer a product question from retrieved context. An empty retrieval
    /// is not short-circuited: the model sees an empty Context block and is
    /// expected to refuse per the prompt.
    pub async fn respond(&self, question: &str) -> Result<String, PipelineError> {
        let hits = self
            .retriever
            .retrieve(question)
            .await
            .map_err(PipelineError::Retrieval)?;

        let context = format_context(&hits);
        tracing::debug!(
            chunks = hits.len(),
            context_len = context.len(),
            "Built grounding context"
        );

        let prompt = build_answer_prompt(&context, question);
        let answer = self
            .model
            .complete(&prompt, &self.options)
            .await
            .map_err(PipelineError::Generation)?;

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::EmbeddingProvider;
    use crate::llm::ProviderInfo;
    use crate::storage::SemanticIndex;
    use crate::types::ChunkRecord;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5; 4])
        }

        async fn embed_document(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5; 4])
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    struct FakeIndex {
        texts: Vec<&'static str>,
    }

    #[async_trait]
    impl SemanticIndex for FakeIndex {
        async fn add(&self, _chunks: Vec<ChunkRecord>) -> Result<()> {
            Ok(())
        }

        async fn search(&self, _vector: &[f32], k: usize) -> Result<Vec<SearchHit>> {
            Ok(self
                .texts
                .iter()
                .take(k)
                .enumerate()
                .map(|(i, text)| SearchHit {
                    id: format!("c{}", i),
                    doc_id: "doc".to_string(),
                    chunk_index: i as u32,
                    text: text.to_string(),
                    source: "catalog.txt".to_string(),
                    score: 0.9 - i as f32 * 0.1,
                })
                .collect())
        }

        async fn delete_by_source(&self, _source: &str) -> Result<usize> {
            Ok(0)
        }

        async fn count(&self) -> Result<usize> {
            Ok(self.texts.len())
        }
    }

    struct BrokenIndex;

    #[async_trait]
    impl SemanticIndex for BrokenIndex {
        async fn add(&self, _chunks: Vec<ChunkRecord>) -> Result<()> {
            Ok(())
        }

        async fn search(&self, _vector: &[f32], _k: usize) -> Result<Vec<SearchHit>> {
            Err(anyhow!("index unavailable"))
        }

        async fn delete_by_source(&self, _source: &str) -> Result<usize> {
            Ok(0)
        }

        async fn count(&self) -> Result<usize> {
            Ok(0)
        }
    }

    /// Records the prompt it was given; refuses on an empty Context block,
    /// otherwise answers with a fixed string.
    struct CapturingModel {
        prompt: Mutex<Option<String>>,
        fail: bool,
    }

    impl CapturingModel {
        fn new() -> Self {
            Self {
                prompt: Mutex::new(None),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for CapturingModel {
        async fn complete(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
            if self.fail {
                return Err(anyhow!("quota exceeded"));
            }
            *self.prompt.lock().unwrap() = Some(prompt.to_string());
            let context = prompt
                .split("Context:\n")
                .nth(1)
                .and_then(|rest| rest.split("\n\nQuestion:").next())
                .unwrap_or("");
            if context.is_empty() {
                Ok(NO_INFORMATION_ANSWER.to_string())
            } else {
                Ok("The earbuds cost $79.99.".to_string())
            }
        }

        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "capturing".to_string(),
                model: "test".to_string(),
            }
        }
    }

    fn responder_over(index: Arc<dyn SemanticIndex>, model: Arc<CapturingModel>) -> RagResponder {
        let retriever = Retriever::new(Arc::new(FixedEmbedder), index, 3);
        RagResponder::new(retriever, model, GenerationOptions::deterministic(256))
    }

    #[test]
    fn context_joins_chunks_with_blank_lines() {
        let hits: Vec<SearchHit> = ["first", "second", "third"]
            .iter()
            .enumerate()
            .map(|(i, text)| SearchHit {
                id: i.to_string(),
                doc_id: "d".to_string(),
                chunk_index: i as u32,
                text: text.to_string(),
                source: "s".to_string(),
                score: 1.0,
            })
            .collect();
        assert_eq!(format_context(&hits), "first\n\nsecond\n\nthird");
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn answer_prompt_is_byte_exact() {
        let prompt = build_answer_prompt("A\n\nB", "What is A?");
        assert_eq!(
            prompt,
            "Answer the question based only on the following context. \nIf the answer is not in the context, say \"I don't have that information in my knowledge base.\"\n\nContext:\nA\n\nB\n\nQuestion: What is A?\n\nAnswer:"
        );
    }

    #[tokio::test]
    async fn prompt_carries_top_three_chunks_in_rank_order() {
        let index = Arc::new(FakeIndex {
            texts: vec!["alpha", "beta", "gamma", "delta", "epsilon"],
        });
        let model = Arc::new(CapturingModel::new());
        let responder = responder_over(index, Arc::clone(&model));

        responder.respond("What is alpha?").await.unwrap();

        let prompt = model.prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Context:\nalpha\n\nbeta\n\ngamma"));
        assert!(!prompt.contains("delta"));
    }

    #[tokio::test]
    async fn empty_index_yields_the_refusal() {
        let index = Arc::new(FakeIndex { texts: vec![] });
        let model = Arc::new(CapturingModel::new());
        let responder = responder_over(index, Arc::clone(&model));

        let answer = responder.respond("What is the price?").await.unwrap();
        assert_eq!(answer, NO_INFORMATION_ANSWER);
    }

    #[tokio::test]
    async fn index_failure_maps_to_retrieval_error() {
        let model = Arc::new(CapturingModel::new());
        let responder = responder_over(Arc::new(BrokenIndex), model);

        let err = responder.respond("q").await.unwrap_err();
        assert!(matches!(err, PipelineError::Retrieval(_)));
    }

    #[tokio::test]
    async fn model_failure_maps_to_generation_error() {
        let index = Arc::new(FakeIndex {
            texts: vec!["some chunk"],
        });
        let model = Arc::new(CapturingModel {
            prompt: Mutex::new(None),
            fail: true,
        });
        let responder = responder_over(index, model);

        let err = responder.respond("q").await.unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
    }
}
