pub mod deepgram;
pub mod whisper;

use std::{fmt::Debug, future::Future, path::PathBuf};

use serde::{Deserialize, Serialize};

/// A contiguous span of transcribed speech with its global start offset.
///
/// Serialized as `{timestamp, content}`, which is exactly the shape the
/// newsletter generator receives as its machine-readable payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Offset from the start of the audio, in seconds
    pub timestamp: f64,
    pub content: String,
}

#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Enclosure URL straight out of the feed entry
    Url(String),
    /// Audio already present on local disk
    File(PathBuf),
}

pub trait Transcriber {
    const TRANSCRIBER_MODEL: &'static str;

    type Error: Debug;

    fn transcribe(
        &self,
        source: AudioSource,
    ) -> impl Future<Output = Result<Vec<TranscriptSegment>, Self::Error>> + Send;
}
