use std::sync::{Arc, Mutex};

use pod_digest::{
    feed::EpisodeRecord, Newsletter, NewsletterGenerator, NewsletterSection, TranscriptSegment,
};

#[derive(Clone)]
pub struct MockGenerator {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
    pub fail_on_title: Option<String>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            fail_on_title: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new()
        }
    }

    /// Fails only for the episode with the given title.
    pub fn failing_on_title(title: &str) -> Self {
        Self {
            fail_on_title: Some(title.to_string()),
            ..Self::new()
        }
    }
}

impl NewsletterGenerator for MockGenerator {
    const GENERATOR_MODEL: &'static str = "mock-llm";

    type Error = anyhow::Error;

    async fn generate(
        &self,
        episode: &EpisodeRecord,
        segments: &[TranscriptSegment],
    ) -> anyhow::Result<Newsletter> {
        self.calls.lock().unwrap().push(episode.title.clone());

        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        if self.fail_on_title.as_deref() == Some(episode.title.as_str()) {
            return Err(anyhow::anyhow!("Generation failed for '{}'", episode.title));
        }

        Ok(Newsletter {
            title: format!("{} Digest", episode.title),
            summary: "What was discussed.".into(),
            sections: segments
                .iter()
                .map(|s| NewsletterSection {
                    timestamp: s.timestamp,
                    header: format!("Topic at {}", s.timestamp),
                    content: s.content.clone(),
                })
                .collect(),
        })
    }
}
