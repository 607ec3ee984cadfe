use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{ApiProvider, CompletionProvider, GenerationOptions, ProviderInfo};

/// Remote completion provider. Google Gemini speaks its own `generateContent`
/// protocol; everything else here is OpenAI-compatible `chat/completions`.
pub struct ExternalProvider {
    provider: ApiProvider,
    api_key: String,
    model: String,
    client: Client,
}

impl ExternalProvider {
    pub fn new(provider: ApiProvider, api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .timeout(std::time::Duration::from_secs(300))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()?;

        tracing::info!(
            provider = ?provider,
            model = %model,
            "Creating external completion provider"
        );

        Ok(Self {
            provider,
            api_key,
            model,
            client,
        })
    }

    fn endpoint(&self) -> String {
        match &self.provider {
            ApiProvider::Google => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                self.model
            ),
            ApiProvider::OpenAi => "https://api.openai.com/v1/chat/completions".to_string(),
            ApiProvider::Ollama => "http://localhost:11434/v1/chat/completions".to_string(),
            ApiProvider::Custom { endpoint } => endpoint.clone(),
        }
    }

    /// Parse a response body as JSON, returning a clear error if the server
    /// returned HTML (e.g. a gateway error page) instead of valid JSON.
    async fn parse_json_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response body from {}: {}", endpoint, e))?;

        let trimmed = body.trim_start();
        if trimmed.starts_with('<') {
            let preview: String = trimmed.chars().take(200).collect();
            return Err(anyhow!(
                "Endpoint {} returned HTML instead of JSON (HTTP {}): {}",
                endpoint,
                status,
                preview
            ));
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            let preview: String = body.chars().take(300).collect();
            anyhow!(
                "Failed to parse JSON from {} (HTTP {}): {}. Response body: {}",
                endpoint,
                status,
                e,
                preview
            )
        })
    }

    async fn google_generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let request = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_output_tokens,
            }
        });

        let endpoint = self.endpoint();
        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, &endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await?;
            return Err(anyhow!("Google API error ({}): {}", status, error));
        }

        let result: GoogleResponse = Self::parse_json_response(response, &endpoint).await?;
        if let Some(candidate) = result.candidates.first() {
            if let Some(part) = candidate.content.parts.first() {
                return Ok(part.text.clone());
            }
        }

        Err(anyhow!("No response from Google Gemini"))
    }

    async fn openai_compatible_generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let endpoint = self.endpoint();
        tracing::debug!(
            endpoint = %endpoint,
            model = %self.model,
            max_tokens = options.max_output_tokens,
            prompt_len = prompt.len(),
            "Sending OpenAI-compatible request"
        );

        let request = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "max_tokens": options.max_output_tokens,
            "temperature": options.temperature,
            "stream": false
        });

        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport_error(e, &endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await?;
            tracing::error!(endpoint = %endpoint, status = %status, error = %error, "API returned error");
            return Err(anyhow!("API error ({}): {}", status, error));
        }

        let result: OpenAIResponse = Self::parse_json_response(response, &endpoint).await?;

        if result.choices.is_empty() {
            return Err(anyhow!("No choices returned from API"));
        }

        Ok(result.choices[0].message.content.clone())
    }
}

fn classify_transport_error(e: reqwest::Error, endpoint: &str) -> anyhow::Error {
    if e.is_timeout() {
        tracing::error!(endpoint = %endpoint, "Request timed out");
        anyhow!("Request to {} timed out", endpoint)
    } else if e.is_connect() {
        tracing::error!(endpoint = %endpoint, error = %e, "Connection failed");
        anyhow!("Failed to connect to {}: {}", endpoint, e)
    } else {
        tracing::error!(endpoint = %endpoint, error = %e, "Request failed");
        anyhow!("Request to {} failed: {}", endpoint, e)
    }
}

#[async_trait]
impl CompletionProvider for ExternalProvider {
    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        match &self.provider {
            ApiProvider::Google => self.google_generate(prompt, options).await,
            ApiProvider::OpenAi | ApiProvider::Ollama | ApiProvider::Custom { .. } => {
                self.openai_compatible_generate(prompt, options).await
            }
        }
    }

    fn info(&self) -> ProviderInfo {
        let name = match &self.provider {
            ApiProvider::Google => "google",
            ApiProvider::OpenAi => "openai",
            ApiProvider::Ollama => "ollama",
            ApiProvider::Custom { .. } => "custom",
        };
        ProviderInfo {
            name: name.to_string(),
            model: self.model.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Response structures
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: String,
}

#[derive(Deserialize)]
struct GoogleResponse {
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: GoogleContent,
}

#[derive(Deserialize)]
struct GoogleContent {
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(api: ApiProvider, model: &str) -> ExternalProvider {
        ExternalProvider::new(api, "test-key".to_string(), model.to_string()).unwrap()
    }

    #[test]
    fn google_endpoint_embeds_model_name() {
        let p = provider(ApiProvider::Google, "gemini-2.5-flash");
        assert_eq!(
            p.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn custom_endpoint_is_used_verbatim() {
        let p = provider(
            ApiProvider::Custom {
                endpoint: "http://10.0.0.5:8080/v1/chat/completions".to_string(),
            },
            "local",
        );
        assert_eq!(p.endpoint(), "http://10.0.0.5:8080/v1/chat/completions");
    }

    #[test]
    fn parses_google_generate_response() {
        let body = r#"{
            "candidates": [
                { "content": { "parts": [{ "text": "products" }], "role": "model" }, "finishReason": "STOP" }
            ]
        }"#;
        let parsed: GoogleResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.candidates[0].content.parts[0].text, "products");
    }

    #[test]
    fn parses_openai_chat_response() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "returns" }, "finish_reason": "stop" }
            ]
        }"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "returns");
    }

    #[test]
    fn info_names_backend_and_model() {
        let p = provider(ApiProvider::Ollama, "llama3");
        let info = p.info();
        assert_eq!(info.name, "ollama");
        assert_eq!(info.model, "llama3");
    }
}
