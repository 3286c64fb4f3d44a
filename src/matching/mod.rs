//! Vibe matching: embedding normalization and candidate ranking.

pub mod engine;
pub mod vector;

pub use engine::CandidateStore;
pub use engine::MatchEngine;
pub use engine::MatchFilters;
pub use engine::DEFAULT_OVERSAMPLE;
pub use vector::sanitize_vector;
pub use vector::RawEmbedding;
