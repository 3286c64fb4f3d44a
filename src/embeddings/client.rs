//! Gemini embedding API client

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::errors::VibeMatchError;

/// Client for the Gemini `embedContent` endpoint
pub struct EmbeddingClient {
    model: String,
    endpoint: String,
    api_key: String,
    client: Client,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(model: String, endpoint: String, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| VibeMatchError::Http(e.to_string()))?;

        Ok(Self {
            model,
            endpoint,
            api_key,
            client,
        })
    }

    /// Generate an embedding vector for a single text
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication)
    /// - Invalid API responses (malformed JSON, empty embedding)
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        struct EmbedRequest<'a> {
            model: String,
            content: Content<'a>,
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            embedding: EmbeddingValues,
        }

        #[derive(Deserialize)]
        struct EmbeddingValues {
            values: Vec<f32>,
        }

        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.endpoint, self.model, self.api_key
        );
        debug!("Calling Gemini embedContent API: model={}", self.model);

        let request = EmbedRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: vec![Part { text }],
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| VibeMatchError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(VibeMatchError::Embedding(format!(
                "Gemini API error ({status}): {error_text}"
            )));
        }

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| VibeMatchError::Embedding(format!("Failed to parse response: {e}")))?;

        if result.embedding.values.is_empty() {
            return Err(VibeMatchError::Embedding(
                "No embedding values in response".to_string(),
            ));
        }

        Ok(result.embedding.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires API key"]
    async fn test_gemini_embedding() {
        let client = EmbeddingClient::new(
            "text-embedding-004".to_string(),
            "https://generativelanguage.googleapis.com/v1beta".to_string(),
            std::env::var("GEMINI_API_KEY").unwrap_or_default(),
        )
        .unwrap();

        let embedding = client.generate("late-night energy, grounded and open").await.unwrap();
        assert_eq!(embedding.len(), 768);
    }
}
