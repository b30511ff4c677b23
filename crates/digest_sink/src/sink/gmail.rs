use anyhow::Context;
use base64::Engine;
use lettre::message::{Message, MultiPart};
use pulldown_cmark::{html, Parser};
use reqwest::Client;

use crate::{sink::DeliverySink, RenderedNewsletter};

/// A send-capable Gmail session.
///
/// Token provisioning (refresh flows, interactive consent) is managed
/// outside this crate; all we require here is a non-empty access token.
/// Acquiring the session fails loudly so a misconfigured unattended run
/// aborts before any send is attempted.
#[derive(Debug, Clone)]
pub struct GmailSession {
    access_token: String,
}

impl GmailSession {
    pub fn from_token(token: impl Into<String>) -> anyhow::Result<Self> {
        let access_token = token.into();
        if access_token.trim().is_empty() {
            anyhow::bail!("Gmail access token is empty; cannot acquire a send-capable session");
        }
        Ok(GmailSession { access_token })
    }
}

/// Sends each rendered newsletter as a multipart email (plaintext Markdown
/// plus an HTML rendering) through the Gmail REST API.
pub struct GmailSink {
    client: Client,
    session: GmailSession,
    sender: String,
    base_url: String,
}

impl GmailSink {
    const SENDER_NAME: &'static str = "Podcast2Newsletter";

    pub fn new(session: GmailSession, sender_email: impl Into<String>) -> Self {
        GmailSink {
            client: Client::new(),
            session,
            sender: sender_email.into(),
            base_url: "https://gmail.googleapis.com/gmail/v1".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_message(
        &self,
        newsletter: &RenderedNewsletter,
        recipient: &str,
    ) -> anyhow::Result<Message> {
        let html_body = markdown_to_html(&newsletter.markdown);

        let message = Message::builder()
            .from(
                format!("{} <{}>", Self::SENDER_NAME, self.sender)
                    .parse()
                    .with_context(|| format!("Invalid sender address: {}", self.sender))?,
            )
            .to(recipient
                .parse()
                .with_context(|| format!("Invalid recipient address: {recipient}"))?)
            .subject(format!("Newsletter for {}", newsletter.episode_title))
            .multipart(MultiPart::alternative_plain_html(
                newsletter.markdown.clone(),
                html_body,
            ))
            .context("Failed to build multipart message")?;

        Ok(message)
    }
}

impl DeliverySink for GmailSink {
    async fn deliver(
        &self,
        newsletter: &RenderedNewsletter,
        recipient: Option<&str>,
    ) -> anyhow::Result<()> {
        let recipient = recipient
            .ok_or_else(|| anyhow::anyhow!("No recipient configured for mail delivery"))?;

        let message = self.build_message(newsletter, recipient)?;
        let raw = base64::engine::general_purpose::URL_SAFE.encode(message.formatted());

        let resp = self
            .client
            .post(format!("{}/users/me/messages/send", self.base_url))
            .bearer_auth(&self.session.access_token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, recipient, "Failed to reach Gmail API"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(
                "Gmail send failed for '{}' to {recipient}: {status} - {body}",
                newsletter.episode_title
            );
        }

        let sent = resp.json::<serde_json::Value>().await.unwrap_or_default();
        tracing::info!(
            recipient,
            message_id = sent["id"].as_str().unwrap_or_default(),
            episode = %newsletter.episode_title,
            "Newsletter emailed"
        );
        Ok(())
    }
}

/// Standard Markdown to HTML rendering for the mail body.
fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}
