/// A fully rendered newsletter, ready for delivery.
///
/// This is the only entity that outlives a single episode's processing;
/// everything upstream (feed entries, transcripts, generated sections) is
/// transient within the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNewsletter {
    /// Title of the source episode, used for filenames and mail subjects
    pub episode_title: String,
    /// The rendered Markdown document
    pub markdown: String,
}

impl RenderedNewsletter {
    pub fn new(episode_title: impl Into<String>, markdown: impl Into<String>) -> Self {
        RenderedNewsletter {
            episode_title: episode_title.into(),
            markdown: markdown.into(),
        }
    }
}
