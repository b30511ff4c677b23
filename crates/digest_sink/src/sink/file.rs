use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::Context;
use itertools::Itertools;
use regex::Regex;

use crate::{sink::DeliverySink, RenderedNewsletter};

static UNSAFE_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 _-]").unwrap());

/// Derives a filesystem-safe name from an episode title by stripping every
/// character that is not alphanumeric, space, hyphen or underscore.
pub fn safe_filename(title: &str) -> String {
    UNSAFE_FILENAME_RE
        .replace_all(title, "")
        .trim_end()
        .to_string()
}

/// Writes each rendered newsletter to `newsletter_{title}.md` under the
/// output directory. A batch can afterwards be merged into one combined
/// document via [`FileSink::merge`].
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        FileSink {
            output_dir: output_dir.into(),
        }
    }

    fn newsletter_path(&self, episode_title: &str) -> PathBuf {
        self.output_dir
            .join(format!("newsletter_{}.md", safe_filename(episode_title)))
    }

    /// Concatenates all `newsletter_*.md` files in the output directory,
    /// sorted by filename, into a single document at `merged_path`,
    /// separated by blank lines.
    pub fn merge(&self, merged_path: impl AsRef<Path>) -> anyhow::Result<usize> {
        let entries = fs::read_dir(&self.output_dir)
            .with_context(|| format!("Failed to read output dir {:?}", self.output_dir))?;

        let newsletter_files = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("newsletter_") && n.ends_with(".md"))
                    .unwrap_or(false)
            })
            .sorted()
            .collect::<Vec<_>>();

        let mut merged = String::new();
        for file in &newsletter_files {
            let content = fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            merged.push_str(&content);
            merged.push_str("\n\n");
        }

        if newsletter_files.is_empty() {
            tracing::info!("No newsletter files found to merge");
            return Ok(0);
        }

        fs::write(merged_path.as_ref(), merged.trim())
            .with_context(|| format!("Failed to write {}", merged_path.as_ref().display()))?;

        tracing::info!(
            count = newsletter_files.len(),
            path = %merged_path.as_ref().display(),
            "Merged newsletters"
        );
        Ok(newsletter_files.len())
    }
}

impl DeliverySink for FileSink {
    async fn deliver(
        &self,
        newsletter: &RenderedNewsletter,
        _recipient: Option<&str>,
    ) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create output dir {:?}", self.output_dir))?;

        let path = self.newsletter_path(&newsletter.episode_title);
        fs::write(&path, &newsletter.markdown)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(path = %path.display(), "Newsletter written");
        Ok(())
    }
}
