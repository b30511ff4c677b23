use std::sync::{Arc, Mutex};

use pod_digest::{AudioSource, Transcriber, TranscriptSegment};

#[derive(Clone)]
pub struct MockTranscriber {
    pub segments: Vec<TranscriptSegment>,
    pub calls: Arc<Mutex<Vec<AudioSource>>>,
    pub fail_with: Option<String>,
}

impl MockTranscriber {
    pub fn new() -> Self {
        Self {
            segments: vec![
                TranscriptSegment {
                    timestamp: 65.0,
                    content: "First topic of the episode.".into(),
                },
                TranscriptSegment {
                    timestamp: 130.0,
                    content: "Second topic of the episode.".into(),
                },
            ],
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            segments: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl Transcriber for MockTranscriber {
    const TRANSCRIBER_MODEL: &'static str = "mock-stt";

    type Error = anyhow::Error;

    async fn transcribe(&self, source: AudioSource) -> anyhow::Result<Vec<TranscriptSegment>> {
        self.calls.lock().unwrap().push(source);
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.segments.clone())
    }
}
