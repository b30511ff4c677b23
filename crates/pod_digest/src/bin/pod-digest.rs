use std::{path::PathBuf, time::Instant};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use digest_sink::{DeliverySink, FileSink, GmailSession, GmailSink};
use pod_digest::{
    feed::{load_subscriptions, FeedSubscription, HttpFeedFetcher},
    gemini::GeminiClient,
    stt::{
        deepgram::DeepgramClient,
        whisper::WhisperChunkedClient,
    },
    tracing::init_tracing_subscriber,
    AudioSource, NewsletterPipelineBuilder, RunReport, Transcriber, TranscriptSegment,
};

#[derive(Parser)]
#[command(name = "pod-digest", about = "Podcast episode to newsletter pipeline")]
struct Cli {
    /// Gemini API key for newsletter generation
    #[arg(long, env = "GEMINI_API_KEY")]
    gemini_key: String,

    /// Deepgram API key (remote transcription backend)
    #[arg(long, env = "DEEPGRAM_API_KEY")]
    deepgram_key: Option<String>,

    /// API key for the whisper endpoint (chunked transcription backend)
    #[arg(long, env = "OPENAI_API_KEY")]
    openai_key: Option<String>,

    /// Transcription backend to use
    #[arg(long, value_enum, default_value = "deepgram")]
    transcriber: TranscriberKind,

    /// Base URL of the whisper transcription endpoint; point this at a
    /// local whisper server to transcribe without a hosted service
    #[arg(long, default_value = "https://api.openai.com/v1")]
    whisper_base_url: String,

    /// Path to the ffmpeg executable used for audio chunking
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    ffmpeg_path: PathBuf,

    /// Single feed URL to process
    #[arg(long, env = "PODCAST_URL")]
    feed_url: Option<String>,

    /// Recipient for the single feed (mail delivery)
    #[arg(long)]
    recipient: Option<String>,

    /// Path to a feeds.json file with [{url, email}] subscriptions;
    /// takes precedence over --feed-url
    #[arg(long, env = "FEEDS_CONFIG")]
    feeds: Option<PathBuf>,

    /// Working directory for downloaded audio and chunks
    #[arg(long, default_value = "/var/tmp/pod-digest")]
    workdir: PathBuf,

    /// Audio chunk duration in seconds (chunked backend)
    #[arg(long, default_value = "600")]
    chunk_duration: u16,

    /// Maximum episodes to process per feed
    #[arg(long, env = "MAX_EPISODES_TO_PROCESS", default_value = "10")]
    max_episodes: usize,

    /// Only process episodes published within this many hours
    #[arg(long)]
    recency_hours: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum TranscriberKind {
    /// Submit the enclosure URL to Deepgram
    Deepgram,
    /// Download, chunk with ffmpeg and transcribe through whisper
    Whisper,
}

#[derive(Subcommand)]
enum Command {
    /// Write newsletters to disk as Markdown files
    Write {
        /// Directory for the newsletter files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Merge all newsletter files into one combined document
        #[arg(long)]
        merge: bool,

        /// Filename of the merged document, relative to the output dir
        #[arg(long, default_value = "merged_newsletter.md")]
        merged_file: PathBuf,
    },
    /// Email each newsletter through the Gmail API
    Send {
        /// Pre-provisioned Gmail access token
        #[arg(long, env = "GMAIL_TOKEN")]
        gmail_token: String,

        /// Sender address for outgoing mail
        #[arg(long, env = "SENDER_EMAIL")]
        sender: String,
    },
}

enum AnyTranscriber {
    Deepgram(DeepgramClient),
    Whisper(WhisperChunkedClient),
}

impl Transcriber for AnyTranscriber {
    const TRANSCRIBER_MODEL: &'static str = "configured";

    type Error = anyhow::Error;

    async fn transcribe(&self, source: AudioSource) -> anyhow::Result<Vec<TranscriptSegment>> {
        match self {
            AnyTranscriber::Deepgram(client) => Ok(client.transcribe(source).await?),
            AnyTranscriber::Whisper(client) => Ok(client.transcribe(source).await?),
        }
    }
}

fn build_transcriber(cli: &Cli) -> anyhow::Result<AnyTranscriber> {
    match cli.transcriber {
        TranscriberKind::Deepgram => {
            let key = cli
                .deepgram_key
                .as_deref()
                .context("DEEPGRAM_API_KEY not set")?;
            Ok(AnyTranscriber::Deepgram(DeepgramClient::new(key)))
        }
        TranscriberKind::Whisper => {
            let key = cli
                .openai_key
                .as_deref()
                .context("OPENAI_API_KEY not set")?;
            Ok(AnyTranscriber::Whisper(
                WhisperChunkedClient::new(
                    key,
                    &cli.ffmpeg_path,
                    &cli.workdir,
                    cli.chunk_duration,
                )
                .with_base_url(&cli.whisper_base_url),
            ))
        }
    }
}

fn build_subscriptions(cli: &Cli) -> anyhow::Result<Vec<FeedSubscription>> {
    match (&cli.feeds, &cli.feed_url) {
        (Some(path), _) => {
            load_subscriptions(path).with_context(|| format!("Failed to load {path:?}"))
        }
        (None, Some(url)) => Ok(vec![FeedSubscription {
            url: url.clone(),
            recipient: cli.recipient.clone(),
        }]),
        (None, None) => anyhow::bail!("Provide --feeds or --feed-url (PODCAST_URL)"),
    }
}

async fn run_pipeline<S>(
    cli: &Cli,
    sink: S,
    subscriptions: &[FeedSubscription],
) -> anyhow::Result<RunReport>
where
    S: DeliverySink + Send + Sync + 'static,
{
    let transcriber = build_transcriber(cli)?;
    let generator = GeminiClient::new(&cli.gemini_key);

    let builder = NewsletterPipelineBuilder::new(&cli.workdir)
        .fetcher(HttpFeedFetcher::default())
        .transcriber(transcriber)
        .generator(generator)
        .sink(sink)
        .max_episodes(cli.max_episodes);

    let builder = match cli.recency_hours {
        Some(hours) => builder.recency_window_hours(hours),
        None => builder,
    };

    Ok(builder.build().run(subscriptions).await)
}

fn log_report(report: &RunReport) {
    tracing::info!(
        delivered = report.delivered.len(),
        failed = report.failures.len(),
        failed_feeds = report.feed_failures.len(),
        quiet_feeds = report.feeds_with_no_new_content,
        "Run complete"
    );

    for failure in &report.failures {
        tracing::warn!(
            feed = %failure.feed_url,
            episode = %failure.episode_title,
            stage = ?failure.stage,
            message = %failure.message,
            "Episode was skipped"
        );
    }
}

// Cosmetic wall-clock ticker; no effect on the pipeline.
fn spawn_elapsed_ticker() {
    let started = Instant::now();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        interval.tick().await;
        loop {
            interval.tick().await;
            tracing::info!(elapsed_secs = started.elapsed().as_secs(), "Still running");
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing_subscriber()?;
    spawn_elapsed_ticker();

    let subscriptions = build_subscriptions(&cli)?;

    let report = match &cli.command {
        Command::Write {
            output_dir,
            merge,
            merged_file,
        } => {
            let sink = FileSink::new(output_dir);
            let report = run_pipeline(&cli, sink.clone(), &subscriptions).await?;

            if *merge {
                sink.merge(output_dir.join(merged_file))?;
            }
            report
        }
        Command::Send {
            gmail_token,
            sender,
        } => {
            let session = GmailSession::from_token(gmail_token)?;
            let sink = GmailSink::new(session, sender);
            run_pipeline(&cli, sink, &subscriptions).await?
        }
    };

    log_report(&report);
    Ok(())
}
