/// Match ranking handlers
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use futures::stream::StreamExt;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::error_response;
use super::AppState;
use crate::api::types::ApiResponse;
use crate::api::types::MatchCard;
use crate::api::types::MatchesQuery;
use crate::llm;
use crate::models::MatchCandidate;

/// Fallback portrait when a candidate has no photo
const FALLBACK_PORTRAIT: &str = "https://images.unsplash.com/photo-1517841905240-472988babdf9";

/// Ranked matches for a user, shaped as match cards.
///
/// Zero matches is a successful empty list; a ranking failure (no usable
/// embedding, store down) is an error response.
pub async fn get_matches(
    State(state): State<AppState>,
    Query(query): Query<MatchesQuery>,
) -> Result<Json<ApiResponse<Vec<MatchCard>>>, (StatusCode, Json<ApiResponse<Vec<MatchCard>>>)> {
    let limit = query.limit.unwrap_or(state.default_match_limit);
    info!(
        "GET /api/matches?user_id={}&limit={limit}&global={}&enrich={}",
        query.user_id, query.global, query.enrich
    );

    let ranked = match state
        .engine
        .rank_for_user(&query.user_id, limit, query.global)
        .await
    {
        Ok(ranked) => ranked,
        Err(e) => {
            error!("Ranking failed for {}: {e}", query.user_id);
            return Err(error_response(&e));
        }
    };

    let cards = if query.enrich {
        enrich_cards(&state, &query.user_id, ranked).await
    } else {
        ranked.into_iter().map(|c| to_card(c, None)).collect()
    };

    Ok(Json(ApiResponse::success(cards)))
}

fn to_card(candidate: MatchCandidate, complementary_strength: Option<String>) -> MatchCard {
    MatchCard {
        id: candidate.profile_id,
        name: candidate.display.name,
        age: candidate.display.age,
        photo: candidate
            .display
            .photo_url
            .unwrap_or_else(|| FALLBACK_PORTRAIT.to_string()),
        match_percentage: (candidate.similarity.clamp(0.0, 1.0) * 100.0).round() as i32,
        vibe_bio: candidate.display.vibe_bio,
        complementary_strength,
    }
}

/// Generate a complementary-strength line per candidate, concurrently.
///
/// Each enrichment is independent; a failure leaves that one card without
/// the line and never aborts the list. Order follows the ranking.
async fn enrich_cards(
    state: &AppState,
    user_id: &str,
    ranked: Vec<MatchCandidate>,
) -> Vec<MatchCard> {
    let subject_answers = match state.database.get_profile(user_id).await {
        Ok(Some(profile)) => profile.answers,
        Ok(None) | Err(_) => serde_json::Value::Null,
    };

    futures::stream::iter(ranked.into_iter().map(|candidate| {
        let database = state.database.clone();
        let llm_service = state.llm_service.clone();
        let subject_answers = subject_answers.clone();
        async move {
            let strength = match database.get_profile(&candidate.profile_id).await {
                Ok(Some(matched)) => {
                    let prompt =
                        llm::complementary_strength_prompt(&subject_answers, &matched.answers);
                    match llm_service.generate_text(&prompt).await {
                        Ok(text) if !text.is_empty() && text.len() <= 120 => Some(text),
                        Ok(_) => None,
                        Err(e) => {
                            warn!(
                                "Complementary strength failed for {}: {e}",
                                candidate.profile_id
                            );
                            None
                        }
                    }
                }
                Ok(None) => None,
                Err(e) => {
                    warn!("Profile load failed for {}: {e}", candidate.profile_id);
                    None
                }
            };
            to_card(candidate, strength)
        }
    }))
    .buffered(8)
    .collect()
    .await
}
