//! # Markdown Renderer
//!
//! Renders a generated newsletter through a fixed Handlebars template.
//! Substitution is exact-text (HTML escaping disabled) and section order
//! is preserved. Each section's display timestamp is recomputed here from
//! its numeric offset, never trusted from upstream; the deep-link anchor
//! carries the raw numeric offset so audio players can seek to it.

use handlebars::Handlebars;
use serde_json::json;

use crate::{llm::generator::Newsletter, timestamp::format_timestamp};

const NEWSLETTER_TEMPLATE: &str = "# {{title}}\n\n{{summary}}\n\n{{#each sections}}## {{header}}\n\n{{content}}\n\n[Listen at {{formatted_timestamp}}]({{../base_url}}#t={{timestamp}})\n\n{{/each}}";

pub struct MarkdownRenderer {
    registry: Handlebars<'static>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string("newsletter", NEWSLETTER_TEMPLATE)
            .expect("static newsletter template must compile");

        MarkdownRenderer { registry }
    }

    /// Renders the newsletter to Markdown, deep-linking each section into
    /// `source_audio_url` via a `#t=` fragment.
    pub fn render(
        &self,
        newsletter: &Newsletter,
        source_audio_url: &str,
    ) -> Result<String, handlebars::RenderError> {
        let sections = newsletter
            .sections
            .iter()
            .map(|s| {
                json!({
                    "header": s.header,
                    "content": s.content,
                    "timestamp": raw_offset(s.timestamp),
                    "formatted_timestamp": format_timestamp(s.timestamp),
                })
            })
            .collect::<Vec<_>>();

        let data = json!({
            "title": newsletter.title,
            "summary": newsletter.summary,
            "sections": sections,
            "base_url": source_audio_url,
        });

        self.registry.render("newsletter", &data)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw numeric offset for the anchor fragment: whole-second offsets
/// render without a fractional part (`65`, not `65.0`).
fn raw_offset(seconds: f64) -> String {
    format!("{seconds}")
}
