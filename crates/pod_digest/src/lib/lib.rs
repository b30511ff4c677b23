mod error;
mod llm;
mod pipeline;
pub mod feed;
pub mod render;
pub mod stt;
pub mod timestamp;
pub mod tracing;

pub use error::Error;
pub use llm::gemini;
pub use llm::generator::{Newsletter, NewsletterGenerator, NewsletterSection};
pub use pipeline::{
    builder::NewsletterPipelineBuilder, EpisodeFailure, FeedFailure, NewsletterPipeline,
    RunReport, Stage,
};
pub use render::MarkdownRenderer;
pub use stt::{AudioSource, Transcriber, TranscriptSegment};
