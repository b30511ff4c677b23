//! # Feed Reader
//!
//! Fetches an RSS/Atom document and turns its entries into episode
//! records, in the order the feed supplies them (most-recent-first for
//! every podcast host we care about). Enclosure resolution and the
//! recency window both live here.

use std::{future::Future, ops::Deref, path::Path};

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::Error;

/// One feed to process, with an optional per-subscription recipient for
/// mail delivery. Loadable from a `feeds.json` array of
/// `{"url": ..., "email": ...}` objects.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSubscription {
    pub url: String,
    #[serde(default, alias = "email")]
    pub recipient: Option<String>,
}

/// An episode as read from the feed. Read-only downstream and discarded
/// once its newsletter has been delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub audio_url: Option<String>,
}

pub trait FeedFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Reqwest-backed fetcher. Sends a browser user agent; several podcast
/// CDNs reject requests with a default library agent.
#[derive(Default)]
pub struct HttpFeedFetcher(pub reqwest::Client);

impl Deref for HttpFeedFetcher {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl HttpFeedFetcher {
    const USER_AGENT: &'static str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";
}

impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let body = self
            .get(url)
            .header(reqwest::header::USER_AGENT, Self::USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(body)
    }
}

/// Parses a feed document into episode records, preserving feed order.
#[tracing::instrument(skip(xml))]
pub fn parse_episodes(xml: &str) -> Result<Vec<EpisodeRecord>, Error> {
    let feed = feed_rs::parser::parse(xml.as_bytes()).map_err(|e| Error::FeedParse(e.to_string()))?;

    Ok(feed.entries.into_iter().map(entry_to_episode).collect())
}

fn entry_to_episode(entry: feed_rs::model::Entry) -> EpisodeRecord {
    let audio_url = enclosure_url(&entry);

    EpisodeRecord {
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        description: entry.summary.map(|t| t.content).unwrap_or_default(),
        published_at: entry.published,
        audio_url,
    }
}

/// Resolves an entry's audio enclosure: an explicit enclosure link first,
/// then a media object with an `audio/*` type, then any media URL at all.
fn enclosure_url(entry: &feed_rs::model::Entry) -> Option<String> {
    let media_contents = || entry.media.iter().flat_map(|m| m.content.iter());

    entry
        .links
        .iter()
        .find(|l| l.rel.as_deref() == Some("enclosure"))
        .map(|l| l.href.clone())
        .or_else(|| {
            media_contents()
                .find(|c| {
                    c.content_type
                        .as_ref()
                        .map(|ct| ct.to_string().starts_with("audio"))
                        .unwrap_or(false)
                })
                .and_then(|c| c.url.as_ref().map(|u| u.to_string()))
        })
        .or_else(|| media_contents().find_map(|c| c.url.as_ref().map(|u| u.to_string())))
}

/// Recency window check, boundary-inclusive: an episode published exactly
/// `window_hours` before `now` is kept. Episodes without a publish time
/// are excluded when a window is in force.
pub fn within_recency(episode: &EpisodeRecord, now: DateTime<Utc>, window_hours: i64) -> bool {
    match episode.published_at {
        Some(published) => now.signed_duration_since(published) <= Duration::hours(window_hours),
        None => false,
    }
}

/// Loads feed subscriptions from a `feeds.json` file.
pub fn load_subscriptions(path: impl AsRef<Path>) -> anyhow::Result<Vec<FeedSubscription>> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let subscriptions: Vec<FeedSubscription> = serde_json::from_str(&raw)?;
    Ok(subscriptions)
}
