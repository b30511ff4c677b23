//! # Delivery Sinks
//!
//! This crate holds the durable-output side of the newsletter pipeline: a
//! rendered newsletter either lands on disk as a Markdown file or goes out
//! as a multipart email through the Gmail REST API.
//!
//! The pipeline crate is generic over [`DeliverySink`], so tests can swap in
//! an in-memory sink and the binary can pick a sink per subcommand.

mod domain;
mod sink;

pub use domain::RenderedNewsletter;
pub use sink::file::{safe_filename, FileSink};
pub use sink::gmail::{GmailSession, GmailSink};
pub use sink::DeliverySink;
