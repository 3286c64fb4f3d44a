//! Prompt builders for match narrative content.
//!
//! Prompts interpolate the stored enriched-profile text or raw answers;
//! nothing else about a user reaches the model.

/// One-sentence explanation of why two profiles would connect, plus shared
/// vibe tags. Asks for strict JSON.
#[must_use]
pub fn reasoning_prompt(user_profile: &str, match_profile: &str) -> String {
    format!(
        r#"Two people have matched based on their profiles in a vibe-based matching app.
Compare the following two people based on their vibe, personality, and energy as described.
Write a short, warm explanation of *why* they might connect well, and 3 short descriptive "vibe tags"
stating what similarities they could vibe on.
Return the response strictly as JSON.

{{
  "whyTheyVibe": "One sentence describing their shared connection vibe",
  "sharedVibeTags": ["tag1", "tag2", "tag3"]
}}

User A:
{user_profile}

User B:
{match_profile}
"#
    )
}

/// Three real-world hangout ideas suited to both personalities, in a city.
#[must_use]
pub fn hangout_ideas_prompt(user_profile: &str, match_profile: &str, city: &str) -> String {
    format!(
        r#"You are a creative planner for a vibe-based matching app.
Given the personalities below, suggest 3 short, real-world hangout ideas that fit both of their shared energy and mood.
Each idea must include:
- a descriptive title
- a 1-2 sentence description
- a specific place name or combination that exists in {city}.

Return JSON only:
{{
  "hangoutIdeas": [
    {{"title": "...", "description": "...", "placeName": "..."}},
    {{"title": "...", "description": "...", "placeName": "..."}},
    {{"title": "...", "description": "...", "placeName": "..."}}
  ]
}}

User A:
{user_profile}

User B:
{match_profile}
"#
    )
}

/// One short sentence on how two answer sets complement each other.
#[must_use]
pub fn complementary_strength_prompt(
    answers_a: &serde_json::Value,
    answers_b: &serde_json::Value,
) -> String {
    format!(
        r#"Given these two people's answers, write ONE short sentence (max 15 words)
describing how their personalities complement each other or work well together.

Examples:
- "Your listening + their storytelling = natural flow"
- "You bring calm energy, they bring creative spark - balanced dynamic"
- "Both thoughtful souls who'd rather go deep than stay surface"

Rules:
- Be warm and human
- Be specific
- If they are very similar, say they have very similar vibes
- No emojis
- No quotes
- Just the sentence

User A:
{answers_a}

User B:
{answers_b}
"#
    )
}

/// A two-line vibe bio written from a freshly assembled profile text.
#[must_use]
pub fn vibe_bio_prompt(enriched_profile: &str) -> String {
    format!(
        r#"Write a short, warm two-line bio (max 30 words) for a vibe-based matching app,
in second person, based on this personality description. No emojis, no quotes.

{enriched_profile}
"#
    )
}

/// Polish place-based date ideas with a summary and a tiny itinerary.
#[must_use]
pub fn polish_ideas_prompt(city: &str, hangouts: &[String], peace: &str, ideas_json: &str) -> String {
    format!(
        r#"You are helping a vibe-based matching app. Given a city, preferred hangout types, and three place-based date ideas, polish each idea with a 1-2 sentence warm summary and a tiny 3-step itinerary. Keep it light, inclusive, and practical. Return strict JSON with fields: ideas: [{{title, summary, itinerary:[{{time, activity, notes}}]}}]. Avoid flowery language and keep under 60 words per idea.

City: {city}
Hangouts: {hangouts:?}
Peace: {peace}
Ideas: {ideas_json}
"#
    )
}
