//! Embedding service: wraps the client with dimension checks

use std::sync::Arc;

use tracing::debug;

use super::client::EmbeddingClient;
use crate::errors::Result;
use crate::errors::VibeMatchError;

/// Service for generating profile embeddings at a fixed dimensionality
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    dimension: usize,
}

impl EmbeddingService {
    /// Create a new embedding service from configuration
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.embedding_model().to_string(),
            config.llm_endpoint().to_string(),
            config.llm_api_key().to_string(),
        )?;

        Ok(Self {
            client: Arc::new(client),
            dimension: config.embedding_dimension(),
        })
    }

    /// The fixed output width every stored embedding must have
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Generate an embedding for a text, verifying the output width.
    ///
    /// Blank text is rejected up front: the API would embed it happily but
    /// the vector would carry no signal worth ranking on.
    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VibeMatchError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }

        let embedding = self.client.generate(text).await?;
        if embedding.len() != self.dimension {
            return Err(VibeMatchError::Embedding(format!(
                "Expected {} dimensions, got {}",
                self.dimension,
                embedding.len()
            )));
        }

        debug!("Generated {}-dimension embedding", embedding.len());
        Ok(embedding)
    }
}
