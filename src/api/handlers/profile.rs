/// Profile and onboarding handlers
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::error;
use tracing::info;

use super::error_response;
use super::AppState;
use crate::api::types::ApiResponse;
use crate::models::Profile;
use crate::onboarding::OnboardingOutcome;
use crate::onboarding::OnboardingRequest;

/// Complete onboarding: validate answers, embed, store, reflect
pub async fn complete_onboarding(
    State(state): State<AppState>,
    Json(request): Json<OnboardingRequest>,
) -> Result<Json<ApiResponse<OnboardingOutcome>>, (StatusCode, Json<ApiResponse<OnboardingOutcome>>)>
{
    info!("POST /api/onboarding");

    match state.onboarding_service.complete(request).await {
        Ok(outcome) => Ok(Json(ApiResponse::success(outcome))),
        Err(e) => {
            error!("Onboarding failed: {e}");
            Err(error_response(&e))
        }
    }
}

/// Get a profile by id (embedding excluded)
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Profile>>, StatusCode> {
    info!("GET /api/profiles/{id}");

    match state.database.get_profile(&id).await {
        Ok(Some(profile)) => Ok(Json(ApiResponse::success(profile))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Error fetching profile {id}: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
