use thiserror::Error;

#[derive(Error, Debug)]
pub enum VibeMatchError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("No embedding stored for profile: {0}")]
    NoEmbedding(String),

    #[error("Stored embedding for profile {0} contains no finite values")]
    EmbeddingUnavailable(String),

    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Places error: {0}")]
    Places(String),

    #[error("Weather error: {0}")]
    Weather(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VibeMatchError {
    /// True for the errors that abort a ranking call because the querying
    /// user's own vector cannot be resolved.
    #[must_use]
    pub const fn is_unrankable(&self) -> bool {
        matches!(self, Self::NoEmbedding(_) | Self::EmbeddingUnavailable(_))
    }

    /// True for infrastructure failures a caller may choose to retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, VibeMatchError>;
