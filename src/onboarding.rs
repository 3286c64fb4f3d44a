//! Onboarding: answer validation, vibe reflection copy, and profile storage.
//!
//! Completing onboarding is the only way a profile comes into existence.
//! The answers are stored verbatim as an open mapping, the enriched text is
//! assembled deterministically from them, and the embedding plus the full
//! document land in one upsert.

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::errors::VibeMatchError;
use crate::llm;
use crate::llm::LlmService;
use crate::models::answer_str;
use crate::models::UpsertProfile;

/// Inbound onboarding payload.
///
/// `answers` is an open mapping; the question set changes release over
/// release and nothing here assumes a fixed record.
#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingRequest {
    pub answers: serde_json::Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default, rename = "photoDataUrl")]
    pub photo_data_url: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// What the client gets back immediately after onboarding
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingOutcome {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub reflection: String,
}

/// Onboarding flow over the profile store, embedder, and LLM
pub struct OnboardingService {
    db: Arc<Database>,
    embeddings: Arc<EmbeddingService>,
    llm: Arc<LlmService>,
}

impl OnboardingService {
    pub fn new(db: Arc<Database>, embeddings: Arc<EmbeddingService>, llm: Arc<LlmService>) -> Self {
        Self {
            db,
            embeddings,
            llm,
        }
    }

    /// Run the whole flow: validate, assemble, embed, upsert, reflect.
    ///
    /// The vibe bio is best-effort; an LLM failure leaves it absent and the
    /// onboarding still succeeds.
    pub async fn complete(&self, request: OnboardingRequest) -> Result<OnboardingOutcome> {
        validate_answers(&request.answers)?;

        let user_id = new_user_id();
        let enriched = enriched_profile_text(&request.answers);
        let reflection = reflection_copy(&request.answers);

        let embedding = self.embeddings.generate(&enriched).await?;

        let vibe_bio = match self
            .llm
            .generate_text(&llm::vibe_bio_prompt(&enriched))
            .await
        {
            Ok(bio) if !bio.is_empty() => Some(bio),
            Ok(_) => None,
            Err(e) => {
                warn!("Vibe bio generation failed for {user_id}: {e}");
                None
            }
        };

        let profile = UpsertProfile {
            id: user_id.clone(),
            name: request.name,
            age: request.age,
            photo_url: request.photo_data_url,
            vibe_bio,
            enriched_profile: Some(enriched),
            answers: request.answers,
            city: request.city,
            state: request.state,
            country: request.country,
            lat: request.lat,
            lon: request.lon,
            embedding: Some(embedding),
        };
        self.db.upsert_profile(&profile).await?;

        info!("Onboarding complete for {user_id}");
        Ok(OnboardingOutcome {
            user_id,
            reflection,
        })
    }
}

fn new_user_id() -> String {
    // Short opaque id, stable once assigned
    let uuid = Uuid::new_v4().simple().to_string();
    format!("u_{}", &uuid[..8])
}

/// Answers must be a JSON object with at least one non-blank response.
fn validate_answers(answers: &serde_json::Value) -> Result<()> {
    let Some(map) = answers.as_object() else {
        return Err(VibeMatchError::InvalidRequest(
            "answers must be an object".to_string(),
        ));
    };

    let has_content = map.values().any(|v| match v {
        serde_json::Value::String(s) => !s.trim().is_empty(),
        serde_json::Value::Array(items) => items
            .iter()
            .any(|i| i.as_str().is_some_and(|s| !s.trim().is_empty())),
        _ => false,
    });

    if has_content {
        Ok(())
    } else {
        Err(VibeMatchError::InvalidRequest(
            "answers must contain at least one response".to_string(),
        ))
    }
}

/// The deterministic reflection line shown right after onboarding.
///
/// Mood comes from when the user feels most alive, tone from what they are
/// looking for. Copy matches the shipped product.
#[must_use]
pub fn reflection_copy(answers: &serde_json::Value) -> String {
    let alive = answer_str(answers, "alive")
        .map(str::to_lowercase)
        .unwrap_or_default();
    let intent = answer_str(answers, "intent")
        .or_else(|| answer_str(answers, "connection"))
        .map(str::to_lowercase)
        .unwrap_or_default();

    let mood = if alive.contains("night") || alive.contains("late") {
        "late-night energy"
    } else if alive.contains("sunrise") || alive.contains("morning") {
        "morning light"
    } else {
        "golden-hour glow"
    };

    let tone = if intent.contains("real") {
        "grounded and open"
    } else if intent.contains("friend") {
        "warm and curious"
    } else {
        "playful and present"
    };

    format!("You carry {mood} \u{2014} {tone}. We love that.")
}

/// Assemble the personality text that gets embedded and fed to prompts.
///
/// One "key: value" line per answered question, in the document's own key
/// order; array answers join with commas.
#[must_use]
pub fn enriched_profile_text(answers: &serde_json::Value) -> String {
    let Some(map) = answers.as_object() else {
        return String::new();
    };

    let mut lines = Vec::new();
    for (key, value) in map {
        let rendered = match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            serde_json::Value::Array(items) => {
                let joined: Vec<&str> = items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                if joined.is_empty() {
                    continue;
                }
                joined.join(", ")
            }
            _ => continue,
        };
        lines.push(format!("{key}: {rendered}"));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_rejects_non_objects() {
        assert!(validate_answers(&json!("just a string")).is_err());
        assert!(validate_answers(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_validate_rejects_all_blank() {
        assert!(validate_answers(&json!({})).is_err());
        assert!(validate_answers(&json!({"alive": "", "hangout": []})).is_err());
    }

    #[test]
    fn test_validate_accepts_one_answer() {
        assert!(validate_answers(&json!({"alive": "late nights"})).is_ok());
        assert!(validate_answers(&json!({"hangout": ["cafe"]})).is_ok());
    }

    #[test]
    fn test_reflection_late_night_real() {
        let answers = json!({"alive": "Late nights", "intent": "something real"});
        assert_eq!(
            reflection_copy(&answers),
            "You carry late-night energy \u{2014} grounded and open. We love that."
        );
    }

    #[test]
    fn test_reflection_morning_friend() {
        let answers = json!({"alive": "sunrise walks", "intent": "new friends"});
        assert_eq!(
            reflection_copy(&answers),
            "You carry morning light \u{2014} warm and curious. We love that."
        );
    }

    #[test]
    fn test_reflection_defaults() {
        let answers = json!({"alive": "afternoons", "intent": "whatever happens"});
        assert_eq!(
            reflection_copy(&answers),
            "You carry golden-hour glow \u{2014} playful and present. We love that."
        );
    }

    #[test]
    fn test_reflection_reads_connection_when_intent_missing() {
        let answers = json!({"connection": "real friendship"});
        assert!(reflection_copy(&answers).contains("grounded and open"));
    }

    #[test]
    fn test_enriched_text_joins_arrays_and_skips_blanks() {
        let answers = json!({
            "alive": "late nights",
            "hangout": ["cafe", "bookstore"],
            "peace": "",
            "age": 29,
        });
        let text = enriched_profile_text(&answers);
        assert!(text.contains("alive: late nights"));
        assert!(text.contains("hangout: cafe, bookstore"));
        assert!(!text.contains("peace"));
        assert!(!text.contains("age"));
    }

    #[test]
    fn test_user_ids_are_short_and_prefixed() {
        let id = new_user_id();
        assert!(id.starts_with("u_"));
        assert_eq!(id.len(), 10);
        assert_ne!(id, new_user_id());
    }
}
