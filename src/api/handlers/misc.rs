/// Weather and photo-proxy handlers
use axum::extract::Query;
use axum::extract::State;
use axum::http::header;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::error;
use tracing::info;

use super::AppState;
use crate::api::types::ApiResponse;
use crate::api::types::PhotoQuery;
use crate::api::types::WeatherQuery;
use crate::weather::suggest_best_day;
use crate::weather::BestDay;
use crate::weather::DailyForecast;

#[derive(Debug, Serialize)]
pub struct WeatherResponse {
    pub days: Vec<DailyForecast>,
    pub suggested: Option<BestDay>,
}

/// 7-day forecast with a suggested hangout day
pub async fn weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<ApiResponse<WeatherResponse>>, (StatusCode, Json<ApiResponse<WeatherResponse>>)> {
    info!("GET /api/weather?lat={}&lon={}", query.lat, query.lon);

    match state.weather_service.seven_day(query.lat, query.lon).await {
        Ok(days) => {
            let suggested = suggest_best_day(&days);
            Ok(Json(ApiResponse::success(WeatherResponse {
                days,
                suggested,
            })))
        }
        Err(e) => {
            error!("Weather lookup failed: {e}");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::error(e.to_string())),
            ))
        }
    }
}

/// Stream a place photo without exposing the upstream API key.
///
/// The image is cacheable for a day; photo references are stable enough for
/// that.
pub async fn place_photo(
    State(state): State<AppState>,
    Query(query): Query<PhotoQuery>,
) -> Response {
    info!("GET /api/place-photo (maxwidth={})", query.maxwidth);

    if query.photo_ref.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error("photo reference required")),
        )
            .into_response();
    }

    match state
        .places_service
        .fetch_photo(&query.photo_ref, query.maxwidth)
        .await
    {
        Ok(photo) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, photo.content_type),
                (
                    header::CACHE_CONTROL,
                    "public, max-age=86400".to_string(),
                ),
            ],
            photo.bytes,
        )
            .into_response(),
        Err(e) => {
            error!("Photo proxy failed: {e}");
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::error("photo not found")),
            )
                .into_response()
        }
    }
}
