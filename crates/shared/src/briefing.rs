use crate::feeds::Article;
use crate::search::SearchNewsItem;
use crate::text::{clean, truncate_chars};

pub const REGULAR_SECTION_LABEL: &str = "REGULAR STABLECOIN NEWS (RSS):";
pub const LAUNCH_SECTION_LABEL: &str = "NEW STABLECOIN LAUNCHES / ANNOUNCEMENTS (Google News RSS):";

/// Extracted body text quoted per regular article.
pub const KEY_TEXT_MAX_CHARS: usize = 600;
/// Launch snippets are kept shorter than article summaries.
pub const SNIPPET_MAX_CHARS: usize = 280;

pub struct BriefBuilder;

impl BriefBuilder {
    /// Numbered listing of regular articles, with extracted key text where available.
    pub fn regular_news(articles: &[Article]) -> String {
        let mut entries = Vec::new();

        for article in articles {
            let title = clean(&article.title);
            let url = clean(&article.url);
            if title.is_empty() && url.is_empty() {
                continue;
            }

            let mut lines = vec![format!("{}) {}", entries.len() + 1, title)];
            if !article.published.is_empty() {
                lines.push(format!("Published: {}", clean(&article.published)));
            }
            lines.push(format!("URL: {}", url));
            let summary = clean(&article.summary);
            if !summary.is_empty() {
                lines.push(format!("Summary: {}", summary));
            }
            if let Some(content) = article.content.as_deref().map(clean) {
                if !content.is_empty() {
                    lines.push(format!(
                        "Key text: {}",
                        truncate_chars(&content, KEY_TEXT_MAX_CHARS)
                    ));
                }
            }

            entries.push(lines.join("\n"));
        }

        entries.join("\n\n")
    }

    /// Numbered listing of launch/announcement hits. Items without a title or link are skipped.
    pub fn launch_news(items: &[SearchNewsItem]) -> String {
        let mut entries = Vec::new();

        for item in items {
            let title = clean(&item.title);
            let link = clean(&item.link);
            if title.is_empty() || link.is_empty() {
                continue;
            }

            let mut lines = vec![format!("{}) {}", entries.len() + 1, title)];
            let published = clean(&item.published);
            if !published.is_empty() {
                lines.push(format!("Published: {}", published));
            }
            lines.push(format!("URL: {}", link));
            let summary = clean(&item.summary);
            if !summary.is_empty() {
                lines.push(format!(
                    "Snippet: {}",
                    truncate_chars(&summary, SNIPPET_MAX_CHARS)
                ));
            }

            entries.push(lines.join("\n"));
        }

        entries.join("\n\n")
    }

    /// Labeled sections (regular first), prefixed with the slot's topic hint. Empty sections
    /// are left out.
    pub fn combine(topic_hint: &str, regular: &str, launches: &str) -> String {
        let mut sections = Vec::new();
        if !regular.is_empty() {
            sections.push(format!("{}\n{}", REGULAR_SECTION_LABEL, regular));
        }
        if !launches.is_empty() {
            sections.push(format!("{}\n{}", LAUNCH_SECTION_LABEL, launches));
        }

        let combined = sections.join("\n\n");
        format!("{}\n\n{}", topic_hint, combined).trim().to_string()
    }
}
