//! Core data models for vibematch profiles and match candidates

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use sqlx::FromRow;

/// A stored user profile, as read back from the database.
///
/// The embedding column is intentionally absent here: it is large, callers
/// never render it, and the matching paths load it separately.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub photo_url: Option<String>,
    pub vibe_bio: Option<String>,
    pub enriched_profile: Option<String>,
    /// Raw onboarding answers keyed by question id
    pub answers: serde_json::Value,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Fetch a single string answer by question id.
    ///
    /// Empty and whitespace-only answers count as unanswered, matching how
    /// the rest of the matching pipeline treats blank attributes.
    #[must_use]
    pub fn answer(&self, key: &str) -> Option<&str> {
        answer_str(&self.answers, key)
    }
}

/// Full profile document for writes. Upserts replace every column, so all
/// fields travel together even when unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertProfile {
    pub id: String,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub photo_url: Option<String>,
    pub vibe_bio: Option<String>,
    pub enriched_profile: Option<String>,
    pub answers: serde_json::Value,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Already-normalized vibe embedding, if one was computed
    pub embedding: Option<Vec<f32>>,
}

/// Filterable attributes carried by each match candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateMeta {
    /// What the candidate is looking for, from their onboarding answers
    pub connection_intent: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// Display fields for rendering a candidate as a match card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateDisplay {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub photo_url: Option<String>,
    pub vibe_bio: Option<String>,
}

/// One nearest-neighbour result from the vector store, before ranking
/// filters are applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub profile_id: String,
    /// Cosine similarity in [0, 1], higher is closer
    pub similarity: f64,
    pub meta: CandidateMeta,
    pub display: CandidateDisplay,
}

/// Fetch a non-empty string answer out of a raw answers document.
#[must_use]
pub fn answer_str<'a>(answers: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    let text = answers.get(key)?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_answer_str_reads_plain_strings() {
        let answers = json!({"connection": "deep friendship", "city": "Chicago"});
        assert_eq!(answer_str(&answers, "connection"), Some("deep friendship"));
        assert_eq!(answer_str(&answers, "city"), Some("Chicago"));
    }

    #[test]
    fn test_answer_str_treats_blank_as_missing() {
        let answers = json!({"connection": "", "recharge": "   ", "age": 27});
        assert_eq!(answer_str(&answers, "connection"), None);
        assert_eq!(answer_str(&answers, "recharge"), None);
        // Non-string values are not coerced
        assert_eq!(answer_str(&answers, "age"), None);
        assert_eq!(answer_str(&answers, "missing"), None);
    }

    #[test]
    fn test_profile_answer_helper() {
        let profile = Profile {
            id: "u_test0001".to_string(),
            name: Some("Ada".to_string()),
            age: Some(29),
            photo_url: None,
            vibe_bio: None,
            enriched_profile: None,
            answers: json!({"thriveWhen": "doing an activity together"}),
            city: Some("Chicago".to_string()),
            state: None,
            country: None,
            lat: None,
            lon: None,
            updated_at: Utc::now(),
        };
        assert_eq!(profile.answer("thriveWhen"), Some("doing an activity together"));
        assert_eq!(profile.answer("planningStyle"), None);
    }
}
