use std::{fmt::Debug, future::Future};

use serde::Deserialize;

use crate::{error::Error, feed::EpisodeRecord, stt::TranscriptSegment};

/// A structured newsletter as returned by a generation backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Newsletter {
    pub title: String,
    pub summary: String,
    pub sections: Vec<NewsletterSection>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsletterSection {
    /// Starting offset of the section within the audio, in seconds
    pub timestamp: f64,
    pub header: String,
    pub content: String,
}

pub trait NewsletterGenerator {
    const GENERATOR_MODEL: &'static str;

    type Error: Debug;

    fn generate(
        &self,
        episode: &EpisodeRecord,
        segments: &[TranscriptSegment],
    ) -> impl Future<Output = Result<Newsletter, Self::Error>> + Send;
}

/// Parses a backend response against the fixed newsletter schema:
/// required string `title` and `summary`, and a `sections` array of
/// `{timestamp: number, header: string, content: string}` objects.
///
/// This is the adapter boundary: the check is identical no matter which
/// generative backend produced the text. An empty `sections` array is
/// valid; a missing one is not.
pub fn parse_newsletter(text: &str) -> Result<Newsletter, Error> {
    Ok(serde_json::from_str(text)?)
}
