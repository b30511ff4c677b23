use reqwest::Client;
use serde::Deserialize;

use crate::{
    feed::EpisodeRecord,
    llm::generator::{parse_newsletter, Newsletter, NewsletterGenerator},
    stt::TranscriptSegment,
};

/// Newsletter generation backed by the Gemini `generateContent` API,
/// constrained to JSON output through a response schema so the reply can
/// be validated like any other backend's.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Empty generation response")]
    EmptyResponse,
    #[error("Invalid newsletter: {0}")]
    InvalidNewsletter(#[from] crate::error::Error),
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: Self::GENERATOR_MODEL.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn system_instruction(episode: &EpisodeRecord) -> String {
        format!(
            "You are creating a newsletter for a podcast titled '{}'.\n\
             Description: {}\n\
             The transcript is divided into timed segments. For each segment:\n\
             1. Create a section with a descriptive header.\n\
             2. Write 1-2 detailed paragraphs explaining the content.\n\
             3. Use the provided timestamp.\n\
             4. Maintain a professional tone without advertisements.\n\
             Include an overall title and summary for the newsletter.\n\
             Do not include any sponsorships or advertisements.",
            episode.title, episode.description
        )
    }

    /// The fixed output schema: `title`, `summary` and `sections` of
    /// `{timestamp, header, content}` are all required.
    fn response_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "OBJECT",
            "required": ["title", "summary", "sections"],
            "properties": {
                "title": { "type": "STRING" },
                "summary": { "type": "STRING" },
                "sections": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "required": ["timestamp", "header", "content"],
                        "properties": {
                            "timestamp": { "type": "NUMBER" },
                            "header": { "type": "STRING" },
                            "content": { "type": "STRING" }
                        }
                    }
                }
            }
        })
    }

    async fn send_generate_request(
        &self,
        system_instruction: String,
        user_content: String,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let body = serde_json::json!({
            "systemInstruction": {
                "parts": [{ "text": system_instruction }]
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": user_content }]
            }],
            "generationConfig": {
                "temperature": 1.0,
                "topP": 0.95,
                "topK": 40,
                "maxOutputTokens": 8192,
                "responseMimeType": "application/json",
                "responseSchema": Self::response_schema()
            }
        });

        let resp = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, message });
        }

        Ok(resp.json::<GenerateContentResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn first_candidate_text(resp: GenerateContentResponse) -> Option<String> {
    resp.candidates
        .into_iter()
        .next()?
        .content
        .parts
        .into_iter()
        .next()?
        .text
}

impl NewsletterGenerator for GeminiClient {
    const GENERATOR_MODEL: &'static str = "gemini-2.0-flash-lite";

    type Error = GeminiError;

    async fn generate(
        &self,
        episode: &EpisodeRecord,
        segments: &[TranscriptSegment],
    ) -> Result<Newsletter, Self::Error> {
        let payload = serde_json::to_string(segments)
            .map_err(crate::error::Error::from)?;
        let user_content = format!("Transcript segments: {payload}");

        let response = self
            .send_generate_request(Self::system_instruction(episode), user_content)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to generate newsletter"))?;

        let text = first_candidate_text(response).ok_or(GeminiError::EmptyResponse)?;

        Ok(parse_newsletter(&text)?)
    }
}
