/// API request handlers
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;

use crate::api::types::ApiResponse;
use crate::api::types::HealthResponse;
use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::errors::VibeMatchError;
use crate::llm::LlmService;
use crate::matching::MatchEngine;
use crate::onboarding::OnboardingService;
use crate::places::PlacesService;
use crate::planner::Planner;
use crate::weather::WeatherService;

// Re-export sub-modules
pub mod matches;
pub mod misc;
pub mod plans;
pub mod profile;

// Re-export handlers
pub use matches::*;
pub use misc::*;
pub use plans::*;
pub use profile::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<Database>,
    pub engine: Arc<MatchEngine<Database>>,
    pub embedding_service: Arc<EmbeddingService>,
    pub llm_service: Arc<LlmService>,
    pub places_service: Arc<PlacesService>,
    pub weather_service: Arc<WeatherService>,
    pub planner: Arc<Planner>,
    pub onboarding_service: Arc<OnboardingService>,
    pub default_match_limit: usize,
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Map a domain error to a status code plus an error envelope.
///
/// A ranking failure is an explicit error, never an empty match list; zero
/// matches go out as a successful empty result elsewhere.
pub(crate) fn error_response<T>(err: &VibeMatchError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = match err {
        VibeMatchError::ProfileNotFound(_)
        | VibeMatchError::NoEmbedding(_)
        | VibeMatchError::EmbeddingUnavailable(_) => StatusCode::NOT_FOUND,
        VibeMatchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        VibeMatchError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::error(err.to_string())))
}
