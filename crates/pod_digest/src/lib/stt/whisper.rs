use std::{
    path::{Path, PathBuf},
    process::Command,
};

use reqwest::Client;
use serde::Deserialize;

use crate::stt::{AudioSource, Transcriber, TranscriptSegment};

/// Chunked transcription backend. The enclosure is downloaded to the
/// workdir, split into fixed-duration chunks with an external ffmpeg
/// executable to bound per-call latency, and each chunk is transcribed
/// through a whisper `/audio/transcriptions` endpoint. The base URL can
/// point at a locally hosted whisper server.
pub struct WhisperChunkedClient {
    client: Client,
    api_key: String,
    ffmpeg_path: PathBuf,
    workdir: PathBuf,
    chunk_duration_seconds: u16,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WhisperError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Download failed: {status} for {url}")]
    Download { status: u16, url: String },
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
}

#[derive(Debug, Deserialize)]
struct ChunkTranscription {
    duration: f64,
    text: String,
    segments: Option<Vec<ChunkSegment>>,
}

#[derive(Debug, Deserialize)]
struct ChunkSegment {
    start: f64,
    end: f64,
    text: String,
}

impl WhisperChunkedClient {
    const DOWNLOAD_USER_AGENT: &'static str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

    pub fn new(
        api_key: impl Into<String>,
        ffmpeg_path: impl Into<PathBuf>,
        workdir: impl Into<PathBuf>,
        chunk_duration_seconds: u16,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            ffmpeg_path: ffmpeg_path.into(),
            workdir: workdir.into(),
            chunk_duration_seconds,
            base_url: "https://api.openai.com/v1".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Downloads the enclosure into `workdir/audio/{stem}.mp3`.
    #[tracing::instrument(skip(self))]
    async fn download_audio(&self, url: &str) -> Result<PathBuf, WhisperError> {
        let audio_dir = self.workdir.join("audio");
        tokio::fs::create_dir_all(&audio_dir).await?;

        let audio_path = audio_dir.join(format!("{}.mp3", file_stem_from_url(url)));
        if audio_path.exists() {
            tracing::debug!("Audio already exists at {}", audio_path.display());
            return Ok(audio_path);
        }

        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, Self::DOWNLOAD_USER_AGENT)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to download audio"))?;

        if !resp.status().is_success() {
            return Err(WhisperError::Download {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = resp.bytes().await?;
        tokio::fs::write(&audio_path, &bytes).await?;

        tracing::info!(path = %audio_path.display(), bytes = bytes.len(), "Audio downloaded");
        Ok(audio_path)
    }

    /// Splits the audio file into fixed-duration chunks under
    /// `workdir/chunks/{stem}/` and returns them sorted by name.
    #[tracing::instrument(skip(self))]
    fn split_audio(&self, audio_path: &Path) -> Result<Vec<PathBuf>, WhisperError> {
        let base_name = audio_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| WhisperError::Ffmpeg("Invalid audio file path".into()))?;
        let chunks_dir = self.workdir.join("chunks").join(base_name);

        let chunks_exist = std::fs::read_dir(&chunks_dir)
            .map(|mut entries| entries.any(|e| e.is_ok()))
            .unwrap_or(false);

        if !chunks_exist {
            std::fs::create_dir_all(&chunks_dir)?;
            let output_pattern = chunks_dir.join(format!("{base_name}_%03d.mp3"));

            tracing::info!("Splitting audio to chunks");
            let output = Command::new(&self.ffmpeg_path)
                .arg("-i")
                .arg(audio_path)
                .args(["-f", "segment", "-segment_time"])
                .arg(self.chunk_duration_seconds.to_string())
                .args(["-c", "copy"])
                .arg(&output_pattern)
                .output()
                .inspect_err(|e| tracing::error!(error = %e, "Failed to run ffmpeg"))?;

            if !output.status.success() {
                return Err(WhisperError::Ffmpeg(
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                ));
            }
        }

        let mut chunks: Vec<PathBuf> = std::fs::read_dir(&chunks_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        chunks.sort();

        Ok(chunks)
    }

    async fn transcribe_chunk(
        &self,
        chunk: &Path,
        prompt: Option<String>,
    ) -> Result<ChunkTranscription, WhisperError> {
        let bytes = tokio::fs::read(chunk).await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("chunk.mp3")
            .mime_str("audio/mpeg")?;

        let mut form = reqwest::multipart::Form::new()
            .text("model", Self::TRANSCRIBER_MODEL)
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .part("file", part);

        if let Some(prompt) = prompt {
            form = form.text("prompt", prompt);
        }

        let resp = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(WhisperError::Api { status, message });
        }

        Ok(resp.json::<ChunkTranscription>().await?)
    }
}

/// Merges per-chunk transcriptions into one segment sequence with global
/// offsets. The running offset advances by each chunk's last segment end
/// (falling back to the chunk's reported duration when it produced no
/// segments), so a segment starting at local `5.0` in the second chunk
/// lands at `first_chunk_end + 5.0` globally.
fn merge_chunk_segments(chunks: &[ChunkTranscription]) -> Vec<TranscriptSegment> {
    let mut merged = Vec::new();
    let mut offset = 0.0_f64;

    for chunk in chunks {
        let mut last_end = 0.0_f64;
        if let Some(segments) = &chunk.segments {
            for seg in segments {
                merged.push(TranscriptSegment {
                    timestamp: seg.start + offset,
                    content: seg.text.trim().to_string(),
                });
                last_end = last_end.max(seg.end);
            }
        }
        offset += if last_end > 0.0 {
            last_end
        } else {
            chunk.duration
        };
    }

    merged
}

/// Derives a safe file stem from the enclosure URL's last path segment.
fn file_stem_from_url(url: &str) -> String {
    let stem = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .trim_end_matches(".mp3")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect::<String>();

    if stem.is_empty() {
        "episode".to_string()
    } else {
        stem
    }
}

impl Transcriber for WhisperChunkedClient {
    const TRANSCRIBER_MODEL: &'static str = "whisper-1";

    type Error = WhisperError;

    async fn transcribe(
        &self,
        source: AudioSource,
    ) -> Result<Vec<TranscriptSegment>, Self::Error> {
        let audio_path = match source {
            AudioSource::Url(url) => self.download_audio(&url).await?,
            AudioSource::File(path) => path,
        };

        let chunks = self.split_audio(&audio_path)?;
        tracing::info!(count = chunks.len(), "Transcribing audio chunks");

        let mut transcriptions = Vec::with_capacity(chunks.len());
        let mut previous_text = None;

        for (idx, chunk) in chunks.iter().enumerate() {
            let transcription = self
                .transcribe_chunk(chunk, previous_text.take())
                .await
                .inspect_err(|e| {
                    tracing::error!(error = %e, chunk = idx, "Failed to transcribe chunk")
                })?;

            previous_text = Some(transcription.text.clone());
            transcriptions.push(transcription);
        }

        Ok(merge_chunk_segments(&transcriptions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(segments: &[(f64, f64, &str)], duration: f64) -> ChunkTranscription {
        ChunkTranscription {
            duration,
            text: segments.iter().map(|(_, _, t)| *t).collect::<Vec<_>>().join(" "),
            segments: Some(
                segments
                    .iter()
                    .map(|(start, end, text)| ChunkSegment {
                        start: *start,
                        end: *end,
                        text: (*text).to_string(),
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn test_offsets_accumulate_across_chunks() {
        let chunks = vec![
            chunk(&[(0.0, 590.0, "a"), (590.0, 595.0, "b"), (595.0, 600.0, "c")], 600.0),
            chunk(&[(5.0, 590.0, "d"), (590.0, 595.0, "e"), (595.0, 600.0, "f")], 600.0),
            chunk(&[(0.0, 590.0, "g"), (590.0, 595.0, "h"), (595.0, 600.0, "i")], 600.0),
        ];

        let merged = merge_chunk_segments(&chunks);
        assert_eq!(merged.len(), 9);

        // second chunk's first segment: local start 5 becomes global 605
        assert_eq!(merged[3].timestamp, 605.0);
        assert_eq!(merged[3].content, "d");
        // third chunk starts after two full chunks
        assert_eq!(merged[6].timestamp, 1200.0);
    }

    #[test]
    fn test_chunk_order_is_preserved() {
        let chunks = vec![
            chunk(&[(0.0, 10.0, "first")], 10.0),
            chunk(&[(0.0, 10.0, "second")], 10.0),
        ];

        let merged = merge_chunk_segments(&chunks);
        assert_eq!(merged[0].content, "first");
        assert_eq!(merged[1].content, "second");
        assert_eq!(merged[1].timestamp, 10.0);
    }

    #[test]
    fn test_segmentless_chunk_advances_by_reported_duration() {
        let chunks = vec![
            ChunkTranscription {
                duration: 600.0,
                text: "silence".into(),
                segments: None,
            },
            chunk(&[(2.0, 8.0, "speech")], 10.0),
        ];

        let merged = merge_chunk_segments(&chunks);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].timestamp, 602.0);
    }

    #[test]
    fn test_file_stem_from_url() {
        assert_eq!(
            file_stem_from_url("https://cdn.example.com/shows/ep-42.mp3?auth=abc"),
            "ep-42"
        );
        assert_eq!(file_stem_from_url("https://cdn.example.com/"), "episode");
    }
}
