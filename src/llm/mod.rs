//! LLM content generation: Gemini client plus the narrative prompts.

mod prompts;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

pub use prompts::complementary_strength_prompt;
pub use prompts::hangout_ideas_prompt;
pub use prompts::polish_ideas_prompt;
pub use prompts::reasoning_prompt;
pub use prompts::vibe_bio_prompt;

use crate::errors::Result;
use crate::errors::VibeMatchError;

/// Client for the Gemini `generateContent` endpoint
pub struct LlmService {
    model: String,
    endpoint: String,
    api_key: String,
    client: Client,
}

impl LlmService {
    /// Create a new LLM service from configuration
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| VibeMatchError::Http(e.to_string()))?;

        Ok(Self {
            model: config.llm_model().to_string(),
            endpoint: config.llm_endpoint().to_string(),
            api_key: config.llm_api_key().to_string(),
            client,
        })
    }

    /// Generate free-form text from a prompt
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication)
    /// - Invalid API responses (malformed JSON, no candidates)
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Part<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct Content<'a> {
            parts: Vec<Part<'a>>,
        }

        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            contents: Vec<Content<'a>>,
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            candidates: Vec<Candidate>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: CandidateContent,
        }

        #[derive(Deserialize)]
        struct CandidateContent {
            parts: Vec<CandidatePart>,
        }

        #[derive(Deserialize)]
        struct CandidatePart {
            text: String,
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );
        debug!("Calling Gemini generateContent API: model={}", self.model);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| VibeMatchError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(VibeMatchError::Llm(format!(
                "Gemini API error ({status}): {error_text}"
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| VibeMatchError::Llm(format!("Failed to parse response: {e}")))?;

        let text = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| VibeMatchError::Llm("No candidates in response".to_string()))?;

        Ok(text.trim().to_string())
    }

    /// Generate a response the prompt asked to be strict JSON, and parse it.
    ///
    /// The model likes to wrap JSON in markdown fences; those are stripped
    /// before parsing. Returns the cleaned raw text alongside the parse
    /// error so callers can fall back to free-form output.
    pub async fn generate_json<T: serde::de::DeserializeOwned>(
        &self,
        prompt: &str,
    ) -> Result<std::result::Result<T, String>> {
        let text = self.generate_text(prompt).await?;
        let cleaned = strip_markdown_fences(&text);

        match serde_json::from_str::<T>(cleaned) {
            Ok(parsed) => Ok(Ok(parsed)),
            Err(e) => {
                warn!("LLM returned unparseable JSON ({e}); falling back to raw text");
                Ok(Err(cleaned.to_string()))
            }
        }
    }
}

/// Strip a leading ```json / ``` fence and a trailing ``` fence.
fn strip_markdown_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_plain_text_untouched() {
        assert_eq!(strip_markdown_fences(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_strip_fences_json_block() {
        let fenced = "```json\n{\"whyTheyVibe\": \"calm\"}\n```";
        assert_eq!(strip_markdown_fences(fenced), "{\"whyTheyVibe\": \"calm\"}");
    }

    #[test]
    fn test_strip_fences_bare_block() {
        let fenced = "```\n[1, 2]\n```";
        assert_eq!(strip_markdown_fences(fenced), "[1, 2]");
    }

    #[test]
    fn test_strip_fences_unterminated_block() {
        let fenced = "```json\n{\"tags\": []}";
        assert_eq!(strip_markdown_fences(fenced), "{\"tags\": []}");
    }
}
