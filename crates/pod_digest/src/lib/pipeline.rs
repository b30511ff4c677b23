pub mod builder;

use std::{fs::remove_dir_all, path::PathBuf};

use anyhow::Context;
use chrono::Utc;
use digest_sink::{DeliverySink, RenderedNewsletter};

use crate::{
    feed::{parse_episodes, within_recency, EpisodeRecord, FeedFetcher, FeedSubscription},
    render::MarkdownRenderer,
    stt::AudioSource,
    NewsletterGenerator, Transcriber,
};

/// The core episode-to-newsletter pipeline: feed entries in, delivered
/// newsletters out. Feeds are processed strictly in configuration order
/// and episodes strictly in feed order; a failed episode is recorded and
/// skipped without touching its siblings.
pub struct NewsletterPipeline<F, T, G, S>
where
    F: FeedFetcher + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    G: NewsletterGenerator + Send + Sync + 'static,
    S: DeliverySink + Send + Sync + 'static,
{
    workdir: PathBuf,
    fetcher: F,
    transcriber: T,
    generator: G,
    sink: S,
    renderer: MarkdownRenderer,
    recency_window_hours: Option<i64>,
    max_episodes: usize,
}

/// Pipeline stage at which an episode was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MissingEnclosure,
    Transcription,
    Generation,
    Render,
    Delivery,
}

#[derive(Debug)]
pub struct EpisodeFailure {
    pub feed_url: String,
    pub episode_title: String,
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug)]
pub struct FeedFailure {
    pub feed_url: String,
    pub message: String,
}

/// Per-run report aggregated by the caller. Episode and feed errors never
/// abort the run; they land here.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Titles of episodes whose newsletter was delivered, in processing order
    pub delivered: Vec<String>,
    pub failures: Vec<EpisodeFailure>,
    pub feed_failures: Vec<FeedFailure>,
    /// Feeds that yielded zero qualifying episodes (not an error)
    pub feeds_with_no_new_content: usize,
}

impl<F, T, G, S> NewsletterPipeline<F, T, G, S>
where
    F: FeedFetcher + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    G: NewsletterGenerator + Send + Sync + 'static,
    S: DeliverySink + Send + Sync + 'static,
{
    #[tracing::instrument(skip_all)]
    pub async fn run(self, subscriptions: &[FeedSubscription]) -> RunReport {
        let mut report = RunReport::default();

        for subscription in subscriptions {
            if let Err(e) = self.process_feed(subscription, &mut report).await {
                tracing::error!(feed = %subscription.url, error = ?e, "Feed failed");
                report.feed_failures.push(FeedFailure {
                    feed_url: subscription.url.clone(),
                    message: format!("{e:?}"),
                });
            }
        }

        report
    }

    #[tracing::instrument(skip(self, report), fields(feed = %subscription.url))]
    async fn process_feed(
        &self,
        subscription: &FeedSubscription,
        report: &mut RunReport,
    ) -> anyhow::Result<()> {
        let xml = self
            .fetcher
            .fetch(&subscription.url)
            .await
            .context("Failed to fetch feed")?;

        let episodes = parse_episodes(&xml).context("Failed to parse feed")?;

        let now = Utc::now();
        let episodes = episodes
            .into_iter()
            .filter(|e| match self.recency_window_hours {
                Some(hours) => within_recency(e, now, hours),
                None => true,
            })
            .take(self.max_episodes)
            .collect::<Vec<_>>();

        if episodes.is_empty() {
            tracing::info!("No new episodes to process at this time");
            report.feeds_with_no_new_content += 1;
            return Ok(());
        }

        tracing::info!(count = episodes.len(), "Processing episodes");

        for episode in &episodes {
            match self
                .process_episode(episode, subscription.recipient.as_deref())
                .await
            {
                Ok(()) => report.delivered.push(episode.title.clone()),
                Err((stage, message)) => {
                    tracing::error!(
                        episode = %episode.title,
                        stage = ?stage,
                        %message,
                        "Episode failed; skipping"
                    );
                    report.failures.push(EpisodeFailure {
                        feed_url: subscription.url.clone(),
                        episode_title: episode.title.clone(),
                        stage,
                        message,
                    });
                }
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, episode), fields(episode = %episode.title))]
    async fn process_episode(
        &self,
        episode: &EpisodeRecord,
        recipient: Option<&str>,
    ) -> Result<(), (Stage, String)> {
        let Some(audio_url) = episode.audio_url.as_deref() else {
            return Err((
                Stage::MissingEnclosure,
                "Episode has no audio enclosure".into(),
            ));
        };

        tracing::info!("Transcribing episode");
        let segments = self
            .transcriber
            .transcribe(AudioSource::Url(audio_url.to_string()))
            .await
            .map_err(|e| (Stage::Transcription, format!("{e:?}")))?;

        tracing::info!(segments = segments.len(), "Generating newsletter");
        let newsletter = self
            .generator
            .generate(episode, &segments)
            .await
            .map_err(|e| (Stage::Generation, format!("{e:?}")))?;

        let markdown = self
            .renderer
            .render(&newsletter, audio_url)
            .map_err(|e| (Stage::Render, e.to_string()))?;

        let rendered = RenderedNewsletter::new(&episode.title, markdown);
        self.sink
            .deliver(&rendered, recipient)
            .await
            .map_err(|e| (Stage::Delivery, format!("{e:?}")))?;

        Ok(())
    }
}

impl<F, T, G, S> Drop for NewsletterPipeline<F, T, G, S>
where
    F: FeedFetcher + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    G: NewsletterGenerator + Send + Sync + 'static,
    S: DeliverySink + Send + Sync + 'static,
{
    fn drop(&mut self) {
        for dir in ["audio", "chunks"] {
            let path = self.workdir.join(dir);
            if path.exists() {
                if let Err(e) = remove_dir_all(&path) {
                    tracing::warn!(error = ?e, path = ?path, "Failed to clean up workdir");
                } else {
                    tracing::info!(path = ?path, "Cleaned up workdir");
                }
            }
        }
    }
}
