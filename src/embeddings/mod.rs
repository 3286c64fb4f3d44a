//! Vibe embedding generation: Gemini client, service, and backfill.

mod backfill;
mod client;
mod service;

pub use backfill::backfill_embeddings;
pub use backfill::BackfillStats;
pub use client::EmbeddingClient;
pub use service::EmbeddingService;
