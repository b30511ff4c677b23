use reqwest::Client;
use serde::Deserialize;

use crate::stt::{AudioSource, Transcriber, TranscriptSegment};

/// Remote transcription backend. The enclosure URL is submitted directly
/// to Deepgram's prerecorded endpoint with punctuation, diarization and
/// paragraph segmentation enabled; each returned paragraph becomes one
/// transcript segment.
pub struct DeepgramClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DeepgramError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Unexpected transcription response structure: {0}")]
    ResponseShape(&'static str),
    #[error("Unsupported input: Deepgram transcriber only supports URL input")]
    UnsupportedInput,
}

impl DeepgramClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.deepgram.com".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn send_prerecorded_request(
        &self,
        audio_url: &str,
    ) -> Result<ListenResponse, DeepgramError> {
        let resp = self
            .client
            .post(format!("{}/v1/listen", self.base_url))
            .query(&[
                ("punctuate", "true"),
                ("diarize", "true"),
                ("paragraphs", "true"),
            ])
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&serde_json::json!({ "url": audio_url }))
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(DeepgramError::Api { status, message });
        }

        Ok(resp.json::<ListenResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    #[serde(default)]
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    paragraphs: Option<ParagraphsWrapper>,
}

#[derive(Debug, Deserialize)]
struct ParagraphsWrapper {
    #[serde(default)]
    paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Deserialize)]
struct Paragraph {
    start: f64,
    #[serde(default)]
    sentences: Vec<Sentence>,
}

#[derive(Debug, Deserialize)]
struct Sentence {
    text: String,
}

/// Flattens the nested paragraph/sentence structure into ordered segments.
/// A paragraph's text is its sentences space-joined in original order; its
/// offset is the paragraph start time.
fn paragraphs_to_segments(resp: ListenResponse) -> Result<Vec<TranscriptSegment>, DeepgramError> {
    let paragraphs = resp
        .results
        .ok_or(DeepgramError::ResponseShape("missing 'results'"))?
        .channels
        .into_iter()
        .next()
        .ok_or(DeepgramError::ResponseShape("missing 'channels[0]'"))?
        .alternatives
        .into_iter()
        .next()
        .ok_or(DeepgramError::ResponseShape("missing 'alternatives[0]'"))?
        .paragraphs
        .ok_or(DeepgramError::ResponseShape("missing 'paragraphs'"))?
        .paragraphs;

    Ok(paragraphs
        .into_iter()
        .map(|p| TranscriptSegment {
            timestamp: p.start,
            content: p
                .sentences
                .into_iter()
                .map(|s| s.text)
                .collect::<Vec<_>>()
                .join(" "),
        })
        .collect())
}

impl Transcriber for DeepgramClient {
    const TRANSCRIBER_MODEL: &'static str = "general";

    type Error = DeepgramError;

    async fn transcribe(
        &self,
        source: AudioSource,
    ) -> Result<Vec<TranscriptSegment>, Self::Error> {
        let audio_url = match source {
            AudioSource::Url(url) => url,
            AudioSource::File(path) => {
                tracing::error!(path = ?path, "Unsupported audio source");
                return Err(DeepgramError::UnsupportedInput);
            }
        };

        let response = self
            .send_prerecorded_request(&audio_url)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to transcribe audio"))?;

        paragraphs_to_segments(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listen_response(json: &str) -> ListenResponse {
        serde_json::from_str(json).expect("fixture should deserialize")
    }

    #[test]
    fn test_paragraphs_become_segments_with_joined_sentences() {
        let resp = listen_response(
            r#"{
                "results": {
                    "channels": [{
                        "alternatives": [{
                            "paragraphs": {
                                "paragraphs": [
                                    {
                                        "start": 0.5,
                                        "sentences": [
                                            {"text": "Hello there."},
                                            {"text": "Welcome back."}
                                        ]
                                    },
                                    {
                                        "start": 12.25,
                                        "sentences": [{"text": "Second paragraph."}]
                                    }
                                ]
                            }
                        }]
                    }]
                }
            }"#,
        );

        let segments = paragraphs_to_segments(resp).unwrap();
        assert_eq!(
            segments,
            vec![
                TranscriptSegment {
                    timestamp: 0.5,
                    content: "Hello there. Welcome back.".into()
                },
                TranscriptSegment {
                    timestamp: 12.25,
                    content: "Second paragraph.".into()
                },
            ]
        );
    }

    #[test]
    fn test_missing_paragraphs_is_a_shape_error() {
        let resp = listen_response(
            r#"{"results": {"channels": [{"alternatives": [{}]}]}}"#,
        );
        assert!(matches!(
            paragraphs_to_segments(resp),
            Err(DeepgramError::ResponseShape("missing 'paragraphs'"))
        ));
    }

    #[test]
    fn test_missing_results_is_a_shape_error() {
        let resp = listen_response("{}");
        assert!(matches!(
            paragraphs_to_segments(resp),
            Err(DeepgramError::ResponseShape("missing 'results'"))
        ));
    }

    #[test]
    fn test_empty_channels_is_a_shape_error() {
        let resp = listen_response(r#"{"results": {"channels": []}}"#);
        assert!(matches!(
            paragraphs_to_segments(resp),
            Err(DeepgramError::ResponseShape(_))
        ));
    }
}
