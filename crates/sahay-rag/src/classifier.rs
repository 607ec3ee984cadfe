//! Query classification.
//!
//! A single completion call labels the question as products, returns, or
//! general. The model's free-text reply is folded into the closed enum by
//! [`normalize`], whose default branch makes classification total: malformed
//! or empty model output becomes `general`, never an error. Only a failed
//! call is an error.

use std::sync::Arc;

use crate::error::PipelineError;
use crate::llm::{CompletionProvider, GenerationOptions};
use crate::types::Category;

fn build_classification_prompt(question: &str) -> String {
    format!(
        "Classify the following user query into exactly one of these categories: 'products', 'returns', or 'general'.\nQuery: {}\nCategory:",
        question
    )
}

/// Map raw model output to a Category: trim, lowercase, then a priority
/// substring test. "products" wins over "returns"; anything else falls
/// through to the `general` default.
pub fn normalize(raw: &str) -> Category {
    let cleaned = raw.trim().to_lowercase();
    if cleaned.contains("products") {
        Category::Products
    } else if cleaned.contains("returns") {
        Category::Returns
    } else {
        Category::General
    }
}

pub struct Classifier {
    model: Arc<dyn CompletionProvider>,
    options: GenerationOptions,
}

impl Classifier {
    pub fn new(model: Arc<dyn CompletionProvider>, options: GenerationOptions) -> Self {
        Self { model, options }
    }

    /// Classify a question. One model call; the reply is normalized into a
    /// Category and the decision is logged with the raw output.
    pub async fn classify(&self, question: &str) -> Result<Category, PipelineError> {
        let prompt = build_classification_prompt(question);
        let raw = self
            .model
            .complete(&prompt, &self.options)
            .await
            .map_err(PipelineError::Classification)?;

        let category = normalize(&raw);
        tracing::info!(
            raw = %raw.trim(),
            category = %category,
            "Classified query"
        );

        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use crate::llm::ProviderInfo;

    struct StubModel {
        reply: &'static str,
    }

    #[async_trait]
    impl CompletionProvider for StubModel {
        async fn complete(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            Ok(self.reply.to_string())
        }

        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "stub".to_string(),
                model: "stub".to_string(),
            }
        }
    }

    struct FailingModel;

    #[async_trait]
    impl CompletionProvider for FailingModel {
        async fn complete(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String> {
            Err(anyhow!("connection refused"))
        }

        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "failing".to_string(),
                model: "failing".to_string(),
            }
        }
    }

    #[test]
    fn normalize_exact_labels() {
        assert_eq!(normalize("products"), Category::Products);
        assert_eq!(normalize("returns"), Category::Returns);
        assert_eq!(normalize("general"), Category::General);
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Products\n"), Category::Products);
        assert_eq!(normalize("RETURNS"), Category::Returns);
    }

    #[test]
    fn normalize_matches_inside_surrounding_text() {
        assert_eq!(
            normalize("The category is: products."),
            Category::Products
        );
        assert_eq!(
            normalize("This looks like a RETURNS question to me"),
            Category::Returns
        );
    }

    #[test]
    fn normalize_prefers_products_over_returns() {
        assert_eq!(normalize("products and returns"), Category::Products);
        assert_eq!(normalize("returns or products"), Category::Products);
    }

    #[test]
    fn normalize_defaults_to_general() {
        assert_eq!(normalize(""), Category::General);
        assert_eq!(normalize("   "), Category::General);
        assert_eq!(normalize("no idea what this is"), Category::General);
        assert_eq!(normalize("return policy"), Category::General);
    }

    #[test]
    fn prompt_embeds_question_verbatim() {
        let prompt = build_classification_prompt("Is it waterproof?");
        assert_eq!(
            prompt,
            "Classify the following user query into exactly one of these categories: 'products', 'returns', or 'general'.\nQuery: Is it waterproof?\nCategory:"
        );
    }

    #[tokio::test]
    async fn classify_uses_normalized_model_output() {
        let classifier = Classifier::new(
            Arc::new(StubModel { reply: " Products " }),
            GenerationOptions::deterministic(64),
        );
        let category = classifier.classify("What does it cost?").await.unwrap();
        assert_eq!(category, Category::Products);
    }

    #[tokio::test]
    async fn classify_garbled_output_falls_back_to_general() {
        let classifier = Classifier::new(
            Arc::new(StubModel { reply: "¯\\_(ツ)_/¯" }),
            GenerationOptions::deterministic(64),
        );
        let category = classifier.classify("Who are you?").await.unwrap();
        assert_eq!(category, Category::General);
    }

    #[tokio::test]
    async fn classify_surfaces_call_failures() {
        let classifier = Classifier::new(
            Arc::new(FailingModel),
            GenerationOptions::deterministic(64),
        );
        let err = classifier.classify("anything").await.unwrap_err();
        assert!(matches!(err, PipelineError::Classification(_)));
    }
}
