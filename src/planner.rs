//! Hangout planning: LLM idea generation, place mapping, and composition.
//!
//! This is where the narrative services meet the map. Every step degrades
//! gracefully: a failed photo lookup leaves an idea without photos, a failed
//! polish returns the raw ideas, and only a missing profile or a dead LLM
//! fails the whole request.

use std::sync::Arc;

use futures::stream::StreamExt;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::database::Database;
use crate::errors::Result;
use crate::errors::VibeMatchError;
use crate::insights::build_why_matched;
use crate::llm;
use crate::llm::LlmService;
use crate::models::Profile;
use crate::places;
use crate::places::PlacesService;

/// Fallback image when a place has no photos
const FALLBACK_PHOTO: &str =
    "https://images.unsplash.com/photo-1500534314209-a25ddb2bd429?q=80&w=1600&auto=format&fit=crop";

/// How many ideas the planner asks for and the reveal flow returns
const IDEA_COUNT: usize = 3;

/// One LLM-suggested hangout idea, before place mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HangoutIdea {
    pub title: String,
    pub description: String,
    #[serde(
        default,
        rename = "placeName",
        alias = "place name",
        skip_serializing_if = "Option::is_none"
    )]
    pub place_name: Option<String>,
}

/// Why two people vibe, per the reasoning model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReasoning {
    #[serde(rename = "whyTheyVibe")]
    pub why_they_vibe: String,
    #[serde(rename = "sharedVibeTags", default)]
    pub shared_vibe_tags: Vec<String>,
}

/// Rule-based and LLM compatibility lines for the match-details view
#[derive(Debug, Clone, Serialize)]
pub struct MatchDetails {
    #[serde(rename = "whyMatched")]
    pub why_matched: String,
    #[serde(rename = "complementaryStrength")]
    pub complementary_strength: String,
}

/// An idea resolved against a real place
#[derive(Debug, Clone, Serialize)]
pub struct MappedIdea {
    pub title: String,
    pub description: String,
    #[serde(rename = "placeName", skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(rename = "mapsUrl", skip_serializing_if = "Option::is_none")]
    pub maps_url: Option<String>,
}

/// An idea enriched with a maps link and photo set, for the location mapper
#[derive(Debug, Clone, Serialize)]
pub struct LocatedIdea {
    pub title: String,
    pub description: String,
    pub place: PlaceInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceInfo {
    pub name: String,
    pub url: String,
    pub photos: Vec<String>,
}

/// Reasoning plus mapped ideas, the full plan response
#[derive(Debug, Clone, Serialize)]
pub struct FullMatchPlan {
    #[serde(rename = "whyTheyVibe")]
    pub why_they_vibe: String,
    #[serde(rename = "sharedVibeTags")]
    pub shared_vibe_tags: Vec<String>,
    #[serde(rename = "hangoutIdeas")]
    pub hangout_ideas: Vec<MappedIdea>,
}

/// A reveal-flow date idea with schedule and optional polish
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateIdea {
    pub title: String,
    pub desc: String,
    pub time: String,
    pub photo: String,
    #[serde(rename = "mapUrl")]
    pub map_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itinerary: Option<Vec<ItineraryStep>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub activity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Composes the LLM, Places, and profile store into plan responses
pub struct Planner {
    db: Arc<Database>,
    llm: Arc<LlmService>,
    places: Arc<PlacesService>,
    default_city: String,
    default_bias: Option<(f64, f64)>,
}

impl Planner {
    pub fn new(
        db: Arc<Database>,
        llm: Arc<LlmService>,
        places: Arc<PlacesService>,
        config: &crate::config::AppConfig,
    ) -> Self {
        Self {
            db,
            llm,
            places,
            default_city: config.default_city().to_string(),
            default_bias: config.default_location_bias(),
        }
    }

    async fn profile_pair(&self, user_id: &str, match_id: &str) -> Result<(Profile, Profile)> {
        self.db.get_profile_pair(user_id, match_id).await
    }

    fn enriched_text(profile: &Profile) -> Result<&str> {
        profile
            .enriched_profile
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| VibeMatchError::ProfileNotFound(profile.id.clone()))
    }

    /// Why two matched profiles vibe, with shared tags.
    ///
    /// When the model ignores the JSON instruction the raw text becomes the
    /// `whyTheyVibe` line and the tags stay empty, mirroring the product's
    /// tolerance for free-form model output.
    pub async fn reasoning(&self, user_id: &str, match_id: &str) -> Result<MatchReasoning> {
        let (user, matched) = self.profile_pair(user_id, match_id).await?;
        let prompt = llm::reasoning_prompt(
            Self::enriched_text(&user)?,
            Self::enriched_text(&matched)?,
        );

        match self.llm.generate_json::<MatchReasoning>(&prompt).await? {
            Ok(parsed) => Ok(parsed),
            Err(raw) => Ok(MatchReasoning {
                why_they_vibe: raw,
                shared_vibe_tags: Vec::new(),
            }),
        }
    }

    /// Rule-based why-matched plus the LLM complementary-strength line.
    ///
    /// The LLM half is best-effort: a failure degrades to the stock line
    /// while the deterministic half always succeeds.
    pub async fn match_details(&self, user_id: &str, match_id: &str) -> Result<MatchDetails> {
        let (user, matched) = self.profile_pair(user_id, match_id).await?;

        let why_matched = build_why_matched(&user.answers, &matched.answers);

        let prompt = llm::complementary_strength_prompt(&user.answers, &matched.answers);
        let complementary_strength = match self.llm.generate_text(&prompt).await {
            Ok(text) if !text.is_empty() && text.len() <= 120 => text,
            Ok(_) => "You complement each other naturally with an easy, balanced dynamic."
                .to_string(),
            Err(e) => {
                warn!("Complementary strength generation failed: {e}");
                "Your energies complement each other naturally.".to_string()
            }
        };

        Ok(MatchDetails {
            why_matched,
            complementary_strength,
        })
    }

    /// Three hangout ideas for a matched pair, adapted to a city.
    pub async fn hangout_ideas(
        &self,
        user_id: &str,
        match_id: &str,
        city: Option<&str>,
    ) -> Result<Vec<HangoutIdea>> {
        #[derive(Deserialize)]
        struct IdeasResponse {
            #[serde(rename = "hangoutIdeas", default)]
            hangout_ideas: Vec<HangoutIdea>,
        }

        let (user, matched) = self.profile_pair(user_id, match_id).await?;
        let city = city.unwrap_or("their city");
        let prompt = llm::hangout_ideas_prompt(
            Self::enriched_text(&user)?,
            Self::enriched_text(&matched)?,
            city,
        );

        match self.llm.generate_json::<IdeasResponse>(&prompt).await? {
            Ok(parsed) => Ok(parsed.hangout_ideas),
            Err(raw) => Ok(vec![HangoutIdea {
                title: "Free-form suggestion".to_string(),
                description: raw,
                place_name: None,
            }]),
        }
    }

    /// Enrich caller-supplied ideas with a maps link and up to three photos.
    ///
    /// Photo lookups run concurrently, one in flight per idea, and the input
    /// order is preserved.
    pub async fn locate_ideas(
        &self,
        city: &str,
        ideas: Vec<HangoutIdea>,
    ) -> Result<Vec<LocatedIdea>> {
        let located = futures::stream::iter(ideas.into_iter().map(|idea| {
            let places = Arc::clone(&self.places);
            let city = city.to_string();
            async move {
                let place_name = idea.place_name.clone().unwrap_or_else(|| idea.title.clone());
                let url = places::maps_search_url(&place_name, &city);
                let photos = places.photo_urls_for_place(&place_name, &city, 3).await;
                LocatedIdea {
                    title: idea.title,
                    description: idea.description,
                    place: PlaceInfo {
                        name: place_name,
                        url,
                        photos,
                    },
                }
            }
        }))
        .buffered(IDEA_COUNT.max(1))
        .collect::<Vec<_>>()
        .await;

        Ok(located)
    }

    /// Resolve LLM ideas against real places: best text-search hit, its
    /// photo, and a pinned maps link. Unresolvable ideas pass through bare.
    async fn map_ideas(&self, ideas: Vec<HangoutIdea>, city: &str) -> Vec<MappedIdea> {
        futures::stream::iter(ideas.into_iter().map(|idea| {
            let places = Arc::clone(&self.places);
            let city = city.to_string();
            async move {
                let query = format!(
                    "{} {city}",
                    idea.place_name.as_deref().unwrap_or(&idea.title)
                );

                let best = match places.text_search(query.trim(), None).await {
                    Ok(results) => results.into_iter().next(),
                    Err(e) => {
                        warn!("Place mapping for '{}' failed: {e}", idea.title);
                        None
                    }
                };

                let Some(best) = best else {
                    return MappedIdea {
                        title: idea.title,
                        description: idea.description,
                        place_name: idea.place_name,
                        address: None,
                        photo: None,
                        maps_url: None,
                    };
                };

                let photo = best
                    .photos
                    .first()
                    .map(|p| places.photo_url(&p.photo_reference, 800));
                let maps_url = places::maps_result_url(&best.name, &best.place_id);

                MappedIdea {
                    title: idea.title,
                    description: idea.description,
                    place_name: Some(best.name),
                    address: best.formatted_address,
                    photo,
                    maps_url: Some(maps_url),
                }
            }
        }))
        .buffered(IDEA_COUNT.max(1))
        .collect()
        .await
    }

    /// Reasoning and mapped hangout ideas composed into one plan.
    pub async fn full_match_plan(
        &self,
        user_id: &str,
        match_id: &str,
        city: Option<&str>,
    ) -> Result<FullMatchPlan> {
        let reasoning = self.reasoning(user_id, match_id).await?;
        let ideas = self.hangout_ideas(user_id, match_id, city).await?;

        let city = match city {
            Some(c) => c.to_string(),
            // Fall back to the subject's own city before the global default
            None => self
                .db
                .get_profile(user_id)
                .await?
                .and_then(|p| p.city)
                .unwrap_or_else(|| self.default_city.clone()),
        };

        let mapped = self.map_ideas(ideas, &city).await;

        Ok(FullMatchPlan {
            why_they_vibe: reasoning.why_they_vibe,
            shared_vibe_tags: reasoning.shared_vibe_tags,
            hangout_ideas: mapped,
        })
    }

    /// The express-interest flow: plan ideas for the pair, then enrich them
    /// with maps links and photos. Composed in-process.
    pub async fn express_interest(
        &self,
        user_id: &str,
        match_id: &str,
        city: &str,
    ) -> Result<Vec<LocatedIdea>> {
        let ideas = self.hangout_ideas(user_id, match_id, Some(city)).await?;
        // The mapper keys off the suggested place, falling back to the title
        let seeds = ideas
            .into_iter()
            .map(|i| HangoutIdea {
                title: i.place_name.unwrap_or(i.title),
                description: i.description,
                place_name: None,
            })
            .collect();
        self.locate_ideas(city, seeds).await
    }

    /// Preference-driven reveal ideas: search queries from the hangout
    /// preferences, best-rated places win, then a best-effort LLM polish.
    pub async fn reveal_ideas(
        &self,
        city: Option<&str>,
        hangouts: &[String],
        peace: &str,
        bias: Option<(f64, f64)>,
    ) -> Result<Vec<DateIdea>> {
        let city = city.unwrap_or(&self.default_city);
        let bias = bias.or(self.default_bias);
        let queries = reveal_queries(city, hangouts, peace);

        debug!("Reveal: {} place queries for {city}", queries.len());

        let buffer = queries.len().max(1);
        let searches = futures::stream::iter(queries.into_iter().map(|q| {
            let places = Arc::clone(&self.places);
            async move { places.text_search(&q, bias).await }
        }))
        .buffered(buffer)
        .collect::<Vec<_>>()
        .await;

        let mut seen = std::collections::HashSet::new();
        let mut unique: Vec<places::PlaceResult> = Vec::new();
        for result in searches {
            match result {
                Ok(found) => {
                    for place in found {
                        if seen.insert(place.place_id.clone()) {
                            unique.push(place);
                        }
                    }
                }
                Err(e) => warn!("Reveal place search failed: {e}"),
            }
        }
        if unique.is_empty() {
            return Err(VibeMatchError::Places(
                "no places found for reveal ideas".to_string(),
            ));
        }

        unique.sort_by(|a, b| {
            b.rating
                .unwrap_or(0.0)
                .partial_cmp(&a.rating.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let stops = ["First stop", "Second stop", "Third stop"];
        let times = ["5:00 PM", "6:30 PM", "8:00 PM"];
        let ideas: Vec<DateIdea> = unique
            .iter()
            .take(IDEA_COUNT)
            .enumerate()
            .map(|(i, place)| {
                let photo = place.photos.first().map_or_else(
                    || FALLBACK_PHOTO.to_string(),
                    |p| places::photo_proxy_url(&p.photo_reference, 800),
                );
                DateIdea {
                    title: format!("{}: {}", stops[i], place.name),
                    desc: place
                        .formatted_address
                        .clone()
                        .unwrap_or_else(|| "Perfect for easy conversation.".to_string()),
                    time: times[i].to_string(),
                    photo,
                    map_url: places::maps_place_link(&place.place_id),
                    summary: None,
                    itinerary: None,
                }
            })
            .collect();

        Ok(self.polish_ideas(ideas, city, hangouts, peace).await)
    }

    /// Ask the LLM to add a summary and mini itinerary per idea. Any failure
    /// returns the raw ideas untouched.
    async fn polish_ideas(
        &self,
        ideas: Vec<DateIdea>,
        city: &str,
        hangouts: &[String],
        peace: &str,
    ) -> Vec<DateIdea> {
        #[derive(Deserialize)]
        struct PolishResponse {
            #[serde(default)]
            ideas: Vec<PolishedIdea>,
        }

        #[derive(Deserialize)]
        struct PolishedIdea {
            title: String,
            summary: Option<String>,
            #[serde(default)]
            itinerary: Vec<ItineraryStep>,
        }

        let payload = match serde_json::to_string(&ideas) {
            Ok(json) => json,
            Err(_) => return ideas,
        };
        let prompt = llm::polish_ideas_prompt(city, hangouts, peace, &payload);

        let parsed = match self.llm.generate_json::<PolishResponse>(&prompt).await {
            Ok(Ok(parsed)) => parsed,
            Ok(Err(_)) => return ideas,
            Err(e) => {
                warn!("Idea polish failed, using raw ideas: {e}");
                return ideas;
            }
        };

        let mut by_title: std::collections::HashMap<String, PolishedIdea> = parsed
            .ideas
            .into_iter()
            .map(|i| (i.title.clone(), i))
            .collect();

        ideas
            .into_iter()
            .map(|mut idea| {
                if let Some(polished) = by_title.remove(&idea.title) {
                    idea.summary = polished.summary;
                    if !polished.itinerary.is_empty() {
                        idea.itinerary =
                            Some(polished.itinerary.into_iter().take(3).collect());
                    }
                }
                idea
            })
            .collect()
    }
}

/// Build the reveal search queries from hangout preferences and the
/// peaceful-place answer, padded with a generic query when thin.
fn reveal_queries(city: &str, hangouts: &[String], peace: &str) -> Vec<String> {
    let prefer: std::collections::HashSet<String> =
        hangouts.iter().map(|s| s.to_lowercase()).collect();
    let mut queries = Vec::new();

    if prefer.contains("café") || prefer.contains("cafe") {
        queries.push(format!("cozy cafe in {city}"));
    }
    if prefer.contains("bar") {
        queries.push(format!("rooftop bar in {city}"));
    }
    if prefer.contains("park") {
        queries.push(format!("lakefront park in {city}"));
    }
    if prefer.contains("art gallery") {
        queries.push(format!("art gallery in {city}"));
    }
    if prefer.contains("bookstore") {
        queries.push(format!("indie bookstore in {city}"));
    }
    if prefer.contains("board-game bar") || prefer.contains("board game bar") {
        queries.push(format!("board game bar in {city}"));
    }
    if prefer.contains("thrift market") {
        queries.push(format!("vintage market in {city}"));
    }
    if prefer.contains("nature trail") {
        queries.push(format!("scenic overlook in {city}"));
    }

    let peace = peace.trim();
    if !peace.is_empty() {
        queries.push(format!("{peace} in {city}"));
    }
    if queries.len() < IDEA_COUNT {
        queries.push(format!("romantic spot in {city}"));
    }

    queries.truncate(6);
    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_queries_map_preferences() {
        let hangouts = vec!["Cafe".to_string(), "Bookstore".to_string()];
        let queries = reveal_queries("Chicago", &hangouts, "quiet rooftop");
        assert_eq!(
            queries,
            vec![
                "cozy cafe in Chicago",
                "indie bookstore in Chicago",
                "quiet rooftop in Chicago",
            ]
        );
    }

    #[test]
    fn test_reveal_queries_pad_when_thin() {
        let queries = reveal_queries("Denver", &[], "");
        assert_eq!(queries, vec!["romantic spot in Denver"]);
    }

    #[test]
    fn test_reveal_queries_capped_at_six() {
        let hangouts: Vec<String> = [
            "cafe",
            "bar",
            "park",
            "art gallery",
            "bookstore",
            "thrift market",
            "nature trail",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        let queries = reveal_queries("Austin", &hangouts, "garden");
        assert_eq!(queries.len(), 6);
    }

    #[test]
    fn test_hangout_idea_accepts_place_name_variants() {
        let spaced: HangoutIdea =
            serde_json::from_str(r#"{"title":"t","description":"d","place name":"Blue Bottle"}"#)
                .unwrap();
        assert_eq!(spaced.place_name.as_deref(), Some("Blue Bottle"));

        let camel: HangoutIdea =
            serde_json::from_str(r#"{"title":"t","description":"d","placeName":"Blue Bottle"}"#)
                .unwrap();
        assert_eq!(camel.place_name.as_deref(), Some("Blue Bottle"));

        let missing: HangoutIdea =
            serde_json::from_str(r#"{"title":"t","description":"d"}"#).unwrap();
        assert!(missing.place_name.is_none());
    }

    #[test]
    fn test_reasoning_serde_uses_camel_case() {
        let reasoning: MatchReasoning = serde_json::from_str(
            r#"{"whyTheyVibe": "calm energy", "sharedVibeTags": ["cozy", "curious"]}"#,
        )
        .unwrap();
        assert_eq!(reasoning.why_they_vibe, "calm energy");
        assert_eq!(reasoning.shared_vibe_tags.len(), 2);
    }
}
