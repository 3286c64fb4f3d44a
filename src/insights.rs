//! Rule-based "why you matched" text.
//!
//! Deterministic, no LLM involved: only overlapping multiple-choice answers
//! contribute, and the output stays at one or two lines.

use crate::models::answer_str;

type Phrase = fn(&str) -> &'static str;

/// The answer keys that can contribute an overlap phrase, in priority order.
const RULES: [(&str, Phrase); 5] = [
    ("thriveWhen", thrive_phrase),
    ("conversationStyle", conversation_phrase),
    ("recharge", recharge_phrase),
    ("planningStyle", planning_phrase),
    ("mostYourself", most_yourself_phrase),
];

fn thrive_phrase(v: &str) -> &'static str {
    if v.contains("activity") {
        "love doing activities together"
    } else if v.contains("conversation") {
        "prefer real conversation over small talk"
    } else if v.contains("food") {
        "enjoy relaxed food-and-drinks hangouts"
    } else if v.contains("creative") {
        "connect through creative or cultural experiences"
    } else if v.contains("nature") {
        "feel best outdoors and in nature"
    } else if v.contains("spontaneous") {
        "like spontaneous, unstructured plans"
    } else {
        "share a similar hangout style"
    }
}

fn conversation_phrase(v: &str) -> &'static str {
    if v.contains("stories") {
        "open up through storytelling"
    } else if v.contains("questions") {
        "connect through curiosity and listening"
    } else if v.contains("both") {
        "have a natural back-and-forth flow"
    } else if v.contains("warm") {
        "like letting connection build gradually"
    } else if v.contains("energy") {
        "bring playful, high-energy conversation"
    } else {
        "share a similar communication style"
    }
}

fn recharge_phrase(v: &str) -> &'static str {
    if v.contains("alone") {
        "value solo recharge time"
    } else if v.contains("active") {
        "reset through movement and activity"
    } else if v.contains("people") {
        "feel energized around people"
    } else if v.contains("creative") {
        "recharge through creativity"
    } else if v.contains("mood") {
        "go with the flow depending on the week"
    } else {
        "recharge in similar ways"
    }
}

fn planning_phrase(v: &str) -> &'static str {
    if v.contains("scheduled") {
        "prefer planning ahead"
    } else if v.contains("spontaneous") {
        "prefer spontaneous plans"
    } else if v.contains("flexible") {
        "like keeping plans flexible"
    } else if v.contains("stress") {
        "prefer low-pressure planning"
    } else {
        "have compatible planning styles"
    }
}

fn most_yourself_phrase(v: &str) -> &'static str {
    if v.contains("deep") {
        "value depth and meaningful connection"
    } else if v.contains("laugh") {
        "love playful, light energy"
    } else if v.contains("new") {
        "feel alive trying new experiences"
    } else if v.contains("silence") {
        "feel comfortable in easy silence"
    } else if v.contains("art") {
        "connect through art, music, and culture"
    } else if v.contains("chill") {
        "love calm, low-key vibes"
    } else {
        "feel most themselves in similar moments"
    }
}

/// Build the "why you matched" line from two answer documents.
///
/// Only answers that are identical on both sides (case-insensitively)
/// produce a phrase; duplicate phrases collapse and at most three survive.
#[must_use]
pub fn build_why_matched(a: &serde_json::Value, b: &serde_json::Value) -> String {
    let mut phrases: Vec<&'static str> = Vec::new();

    for (key, phrase) in RULES {
        let Some(av) = answer_str(a, key).map(str::to_lowercase) else {
            continue;
        };
        let Some(bv) = answer_str(b, key).map(str::to_lowercase) else {
            continue;
        };
        if av == bv {
            let p = phrase(&av);
            if !phrases.contains(&p) {
                phrases.push(p);
            }
        }
    }

    phrases.truncate(3);

    match phrases.as_slice() {
        [] => "You share an easy, natural compatibility that feels effortless.".to_string(),
        [one] => format!("You both {one}."),
        [one, two] => format!("You both {one} and {two}."),
        [one, two, three] => format!("You both {one}, {two}, and {three}."),
        _ => unreachable!("phrases truncated to 3"),
    }
}
