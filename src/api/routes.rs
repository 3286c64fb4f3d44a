//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Onboarding and profiles
        .route("/onboarding", post(handlers::complete_onboarding))
        .route("/profiles/:id", get(handlers::get_profile))
        // Match ranking
        .route("/matches", get(handlers::get_matches))
        // Narrative content
        .route("/match-details", get(handlers::match_details))
        .route("/match-reasoning", get(handlers::match_reasoning))
        // Planning
        .route("/hangout-planner", get(handlers::hangout_planner))
        .route("/location-mapper", post(handlers::location_mapper))
        .route("/full-match-plan", get(handlers::full_match_plan))
        .route("/express-interest", post(handlers::express_interest))
        .route("/reveal", post(handlers::reveal))
        // Weather and photos
        .route("/weather", get(handlers::weather))
        .route("/place-photo", get(handlers::place_photo))
        .with_state(state)
}
