//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::planner::HangoutIdea;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Query parameters for the matches endpoint
#[derive(Debug, Deserialize)]
pub struct MatchesQuery {
    pub user_id: String,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Global mode skips every attribute filter
    #[serde(default)]
    pub global: bool,
    /// Generate a per-card complementary-strength line
    #[serde(default)]
    pub enrich: bool,
}

/// One ranked match, shaped for a match card
#[derive(Debug, Serialize)]
pub struct MatchCard {
    pub id: String,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub photo: String,
    #[serde(rename = "matchPercentage")]
    pub match_percentage: i32,
    #[serde(rename = "vibeBio")]
    pub vibe_bio: Option<String>,
    #[serde(
        rename = "complementaryStrength",
        skip_serializing_if = "Option::is_none"
    )]
    pub complementary_strength: Option<String>,
}

/// Query parameters for the pairwise content endpoints
#[derive(Debug, Deserialize)]
pub struct PairQuery {
    pub user_id: String,
    pub match_id: String,
    #[serde(default)]
    pub city: Option<String>,
}

/// Request body for the location mapper
#[derive(Debug, Deserialize)]
pub struct LocationMapperRequest {
    pub city: String,
    pub ideas: Vec<HangoutIdea>,
}

/// Request body for express-interest
#[derive(Debug, Deserialize)]
pub struct ExpressInterestRequest {
    pub user_id: String,
    pub match_id: String,
    pub city: String,
}

/// Request body for the reveal flow
#[derive(Debug, Deserialize)]
pub struct RevealRequest {
    pub match_id: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub hangout: Vec<String>,
    #[serde(default)]
    pub peace: String,
}

/// Query parameters for the weather endpoint
#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lon: f64,
}

/// Query parameters for the photo proxy
#[derive(Debug, Deserialize)]
pub struct PhotoQuery {
    #[serde(rename = "ref")]
    pub photo_ref: String,
    #[serde(default = "default_maxwidth")]
    pub maxwidth: u32,
}

fn default_maxwidth() -> u32 {
    800
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let response = ApiResponse::success(vec![1, 2, 3]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["error"], serde_json::Value::Null);
    }

    #[test]
    fn test_error_envelope_shape() {
        let response: ApiResponse<()> = ApiResponse::error("no embedding");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "no embedding");
    }

    #[test]
    fn test_match_card_hides_absent_enrichment() {
        let card = MatchCard {
            id: "u_1".to_string(),
            name: Some("Ada".to_string()),
            age: None,
            photo: "https://example.com/p.jpg".to_string(),
            match_percentage: 87,
            vibe_bio: None,
            complementary_strength: None,
        };
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("matchPercentage"));
        assert!(!json.contains("complementaryStrength"));
    }

    #[test]
    fn test_photo_query_defaults_maxwidth() {
        let query: PhotoQuery = serde_json::from_str(r#"{"ref": "abc"}"#).unwrap();
        assert_eq!(query.photo_ref, "abc");
        assert_eq!(query.maxwidth, 800);
    }
}
