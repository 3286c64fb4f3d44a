/// Narrative and planning handlers
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;
use tracing::info;

use super::error_response;
use super::AppState;
use crate::api::types::ApiResponse;
use crate::api::types::ExpressInterestRequest;
use crate::api::types::LocationMapperRequest;
use crate::api::types::PairQuery;
use crate::api::types::RevealRequest;
use crate::planner::DateIdea;
use crate::planner::FullMatchPlan;
use crate::planner::HangoutIdea;
use crate::planner::LocatedIdea;
use crate::planner::MatchDetails;
use crate::planner::MatchReasoning;

type HandlerResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

/// Rule-based why-matched plus the LLM complementary-strength line
pub async fn match_details(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> HandlerResult<MatchDetails> {
    info!(
        "GET /api/match-details?user_id={}&match_id={}",
        query.user_id, query.match_id
    );

    state
        .planner
        .match_details(&query.user_id, &query.match_id)
        .await
        .map(|details| Json(ApiResponse::success(details)))
        .map_err(|e| {
            error!("Match details failed: {e}");
            error_response(&e)
        })
}

/// LLM reasoning: why they vibe plus shared vibe tags
pub async fn match_reasoning(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> HandlerResult<MatchReasoning> {
    info!(
        "GET /api/match-reasoning?user_id={}&match_id={}",
        query.user_id, query.match_id
    );

    state
        .planner
        .reasoning(&query.user_id, &query.match_id)
        .await
        .map(|reasoning| Json(ApiResponse::success(reasoning)))
        .map_err(|e| {
            error!("Match reasoning failed: {e}");
            error_response(&e)
        })
}

#[derive(Debug, Serialize)]
pub struct HangoutIdeasResponse {
    #[serde(rename = "hangoutIdeas")]
    pub hangout_ideas: Vec<HangoutIdea>,
}

/// Three LLM hangout ideas for a matched pair
pub async fn hangout_planner(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> HandlerResult<HangoutIdeasResponse> {
    info!(
        "GET /api/hangout-planner?user_id={}&match_id={}",
        query.user_id, query.match_id
    );

    state
        .planner
        .hangout_ideas(&query.user_id, &query.match_id, query.city.as_deref())
        .await
        .map(|ideas| {
            Json(ApiResponse::success(HangoutIdeasResponse {
                hangout_ideas: ideas,
            }))
        })
        .map_err(|e| {
            error!("Hangout planner failed: {e}");
            error_response(&e)
        })
}

#[derive(Debug, Serialize)]
pub struct LocatedIdeasResponse {
    pub ideas: Vec<LocatedIdea>,
}

/// Enrich caller-supplied ideas with maps links and photos
pub async fn location_mapper(
    State(state): State<AppState>,
    Json(request): Json<LocationMapperRequest>,
) -> HandlerResult<LocatedIdeasResponse> {
    info!(
        "POST /api/location-mapper ({} ideas for {})",
        request.ideas.len(),
        request.city
    );

    if request.city.trim().is_empty() || request.ideas.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("city and ideas[] are required")),
        ));
    }

    state
        .planner
        .locate_ideas(&request.city, request.ideas)
        .await
        .map(|ideas| Json(ApiResponse::success(LocatedIdeasResponse { ideas })))
        .map_err(|e| {
            error!("Location mapper failed: {e}");
            error_response(&e)
        })
}

/// Reasoning plus mapped hangout ideas in one response
pub async fn full_match_plan(
    State(state): State<AppState>,
    Query(query): Query<PairQuery>,
) -> HandlerResult<FullMatchPlan> {
    info!(
        "GET /api/full-match-plan?user_id={}&match_id={}",
        query.user_id, query.match_id
    );

    state
        .planner
        .full_match_plan(&query.user_id, &query.match_id, query.city.as_deref())
        .await
        .map(|plan| Json(ApiResponse::success(plan)))
        .map_err(|e| {
            error!("Full match plan failed: {e}");
            error_response(&e)
        })
}

#[derive(Debug, Serialize)]
pub struct ExpressInterestResponse {
    #[serde(rename = "hangoutPlans")]
    pub hangout_plans: Vec<LocatedIdea>,
}

/// Plan and map hangout ideas when a user expresses interest
pub async fn express_interest(
    State(state): State<AppState>,
    Json(request): Json<ExpressInterestRequest>,
) -> HandlerResult<ExpressInterestResponse> {
    info!(
        "POST /api/express-interest ({} -> {})",
        request.user_id, request.match_id
    );

    if request.city.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("user_id, match_id, and city are required")),
        ));
    }

    state
        .planner
        .express_interest(&request.user_id, &request.match_id, &request.city)
        .await
        .map(|plans| {
            Json(ApiResponse::success(ExpressInterestResponse {
                hangout_plans: plans,
            }))
        })
        .map_err(|e| {
            error!("Express interest failed: {e}");
            error_response(&e)
        })
}

#[derive(Debug, Serialize)]
pub struct RevealResponse {
    #[serde(rename = "matchId")]
    pub match_id: String,
    pub ideas: Vec<DateIdea>,
}

/// Preference-driven date ideas for the reveal flow
pub async fn reveal(
    State(state): State<AppState>,
    Json(request): Json<RevealRequest>,
) -> HandlerResult<RevealResponse> {
    info!("POST /api/reveal (match_id={})", request.match_id);

    let bias = match (request.lat, request.lon) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        _ => None,
    };

    state
        .planner
        .reveal_ideas(
            request.city.as_deref(),
            &request.hangout,
            &request.peace,
            bias,
        )
        .await
        .map(|ideas| {
            Json(ApiResponse::success(RevealResponse {
                match_id: request.match_id,
                ideas,
            }))
        })
        .map_err(|e| {
            error!("Reveal failed: {e}");
            error_response(&e)
        })
}
