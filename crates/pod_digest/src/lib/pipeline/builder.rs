use std::path::PathBuf;

use digest_sink::DeliverySink;

use crate::{
    feed::FeedFetcher, render::MarkdownRenderer, NewsletterGenerator, NewsletterPipeline,
    Transcriber,
};

pub struct NewsletterPipelineBuilder<F = (), T = (), G = (), S = ()> {
    workdir: PathBuf,
    fetcher: F,
    transcriber: T,
    generator: G,
    sink: S,
    recency_window_hours: Option<i64>,
    max_episodes: usize,
}

impl NewsletterPipelineBuilder {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            fetcher: (),
            transcriber: (),
            generator: (),
            sink: (),
            recency_window_hours: None,
            max_episodes: 10,
        }
    }
}

impl<F, T, G, S> NewsletterPipelineBuilder<F, T, G, S> {
    pub fn fetcher<F2: FeedFetcher + Send + Sync + 'static>(
        self,
        fetcher: F2,
    ) -> NewsletterPipelineBuilder<F2, T, G, S> {
        NewsletterPipelineBuilder {
            workdir: self.workdir,
            fetcher,
            transcriber: self.transcriber,
            generator: self.generator,
            sink: self.sink,
            recency_window_hours: self.recency_window_hours,
            max_episodes: self.max_episodes,
        }
    }

    pub fn transcriber<T2: Transcriber + Send + Sync + 'static>(
        self,
        transcriber: T2,
    ) -> NewsletterPipelineBuilder<F, T2, G, S> {
        NewsletterPipelineBuilder {
            workdir: self.workdir,
            fetcher: self.fetcher,
            transcriber,
            generator: self.generator,
            sink: self.sink,
            recency_window_hours: self.recency_window_hours,
            max_episodes: self.max_episodes,
        }
    }

    pub fn generator<G2: NewsletterGenerator + Send + Sync + 'static>(
        self,
        generator: G2,
    ) -> NewsletterPipelineBuilder<F, T, G2, S> {
        NewsletterPipelineBuilder {
            workdir: self.workdir,
            fetcher: self.fetcher,
            transcriber: self.transcriber,
            generator,
            sink: self.sink,
            recency_window_hours: self.recency_window_hours,
            max_episodes: self.max_episodes,
        }
    }

    pub fn sink<S2: DeliverySink + Send + Sync + 'static>(
        self,
        sink: S2,
    ) -> NewsletterPipelineBuilder<F, T, G, S2> {
        NewsletterPipelineBuilder {
            workdir: self.workdir,
            fetcher: self.fetcher,
            transcriber: self.transcriber,
            generator: self.generator,
            sink,
            recency_window_hours: self.recency_window_hours,
            max_episodes: self.max_episodes,
        }
    }

    pub fn max_episodes(mut self, max_episodes: usize) -> Self {
        self.max_episodes = max_episodes;
        self
    }

    pub fn recency_window_hours(mut self, hours: i64) -> Self {
        self.recency_window_hours = Some(hours);
        self
    }
}

impl<F, T, G, S> NewsletterPipelineBuilder<F, T, G, S>
where
    F: FeedFetcher + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    G: NewsletterGenerator + Send + Sync + 'static,
    S: DeliverySink + Send + Sync + 'static,
{
    pub fn build(self) -> NewsletterPipeline<F, T, G, S> {
        NewsletterPipeline {
            workdir: self.workdir,
            fetcher: self.fetcher,
            transcriber: self.transcriber,
            generator: self.generator,
            sink: self.sink,
            renderer: MarkdownRenderer::new(),
            recency_window_hours: self.recency_window_hours,
            max_episodes: self.max_episodes,
        }
    }
}
