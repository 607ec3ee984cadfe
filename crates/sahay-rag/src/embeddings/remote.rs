use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::EmbeddingProvider;

const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

fn build_client() -> Result<Client> {
    let client = Client::builder()
        .connect_timeout(std::time::Duration::from_secs(15))
        .timeout(std::time::Duration::from_secs(120))
        .tcp_nodelay(true)
        .build()?;
    Ok(client)
}

/// Google Gemini embedding backend (`embedContent` / `batchEmbedContents`).
pub struct GoogleEmbeddings {
    api_key: String,
    model: String,
    dimension: usize,
    client: Client,
}

impl GoogleEmbeddings {
    pub fn new(api_key: String, model: String, dimension: usize) -> Result<Self> {
        Ok(Self {
            api_key,
            model,
            dimension,
            client: build_client()?,
        })
    }

    async fn embed_with_task(&self, text: &str, task_type: &str) -> Result<Vec<f32>> {
        let endpoint = format!("{}/{}:embedContent", GOOGLE_API_BASE, self.model);
        let request = json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] },
            "taskType": task_type,
        });

        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await?;
            return Err(anyhow!("Google embedding API error ({}): {}", status, error));
        }

        let result: EmbedContentResponse = response.json().await?;
        self.check_dimension(result.embedding.values)
    }

    fn check_dimension(&self, vector: Vec<f32>) -> Result<Vec<f32>> {
        if vector.len() != self.dimension {
            return Err(anyhow!(
                "embedding dimension mismatch: model '{}' returned {} values, config expects {}",
                self.model,
                vector.len(),
                self.dimension
            ));
        }
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for GoogleEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_task(text, "RETRIEVAL_QUERY").await
    }

    async fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_task(text, "RETRIEVAL_DOCUMENT").await
    }

    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let endpoint = format!("{}/{}:batchEmbedContents", GOOGLE_API_BASE, self.model);
        let requests: Vec<_> = texts
            .iter()
            .map(|text| {
                json!({
                    "model": format!("models/{}", self.model),
                    "content": { "parts": [{ "text": text }] },
                    "taskType": "RETRIEVAL_DOCUMENT",
                })
            })
            .collect();

        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await?;
            return Err(anyhow!("Google embedding API error ({}): {}", status, error));
        }

        let result: BatchEmbedContentsResponse = response.json().await?;
        if result.embeddings.len() != texts.len() {
            return Err(anyhow!(
                "Google embedding API returned {} vectors for {} inputs",
                result.embeddings.len(),
                texts.len()
            ));
        }

        tracing::debug!(count = texts.len(), "embedded document batch");
        result
            .embeddings
            .into_iter()
            .map(|e| self.check_dimension(e.values))
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// OpenAI-style embedding backend (`POST {endpoint}/embeddings`), also used
/// for Ollama and custom endpoints that speak the same protocol.
pub struct OpenAiCompatibleEmbeddings {
    endpoint: String,
    api_key: String,
    model: String,
    dimension: usize,
    client: Client,
}

impl OpenAiCompatibleEmbeddings {
    pub fn new(endpoint: String, api_key: String, model: String, dimension: usize) -> Result<Self> {
        Ok(Self {
            endpoint,
            api_key,
            model,
            dimension,
            client: build_client()?,
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let endpoint = format!("{}/embeddings", self.endpoint.trim_end_matches('/'));
        let request = json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await?;
            return Err(anyhow!("Embedding API error ({}): {}", status, error));
        }

        let result: EmbeddingsResponse = response.json().await?;
        if result.data.len() != texts.len() {
            return Err(anyhow!(
                "embedding API returned {} vectors for {} inputs",
                result.data.len(),
                texts.len()
            ));
        }

        result
            .data
            .into_iter()
            .map(|d| {
                if d.embedding.len() != self.dimension {
                    Err(anyhow!(
                        "embedding dimension mismatch: model '{}' returned {} values, config expects {}",
                        self.model,
                        d.embedding.len(),
                        self.dimension
                    ))
                } else {
                    Ok(d.embedding)
                }
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow!("embedding API returned no vector"))
    }

    async fn embed_document(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_query(text).await
    }

    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_batch(texts).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ---------------------------------------------------------------------------
// Wire formats
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedContentsResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
