use anyhow::{Context, Result};
use feed_rs::model::Entry;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use crate::keywords;
use crate::sources::FeedSource;
use crate::text::{clean, truncate_chars};

/// Stablecoin news feeds polled for regular news.
pub const DEFAULT_RSS_FEEDS: &[&str] = &[
    "https://www.coindesk.com/arc/outboundfeeds/rss/",
    "https://cointelegraph.com/rss",
    "https://www.theblock.co/rss.xml",
    "https://decrypt.co/feed",
];

/// Article summaries are cut to this many characters.
pub const SUMMARY_MAX_CHARS: usize = 400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub url: String,
    /// Free-form date string, may be empty.
    pub published: String,
    pub summary: String,
    /// Extracted body text, filled in after fetching.
    pub content: Option<String>,
}

/// Fields common to RSS and Atom entries, already whitespace-normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: String,
    pub summary: String,
}

impl FeedEntry {
    /// Prefers `published` over `updated` and `summary` over the description/content body.
    pub fn from_entry(entry: &Entry) -> Self {
        let title = entry
            .title
            .as_ref()
            .map(|t| clean(&t.content))
            .unwrap_or_default();

        // Atom entries may list replies/self links ahead of the article itself
        let link = entry
            .links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| entry.links.first())
            .map(|l| clean(&l.href))
            .unwrap_or_default();

        let published = match entry.published.or(entry.updated) {
            Some(date) => date.to_rfc2822(),
            None => {
                tracing::debug!(title = %title, "entry has no parseable date");
                String::new()
            }
        };

        let summary = entry
            .summary
            .as_ref()
            .map(|s| clean(&s.content))
            .filter(|s| !s.is_empty())
            .or_else(|| {
                entry
                    .content
                    .as_ref()
                    .and_then(|c| c.body.as_deref())
                    .map(clean)
            })
            .unwrap_or_default();

        Self {
            title,
            link,
            published,
            summary,
        }
    }
}

/// Parse a feed document and map up to `limit` entries in document order.
pub fn parse_entries(bytes: &[u8], limit: usize) -> Result<Vec<FeedEntry>> {
    let feed = feed_rs::parser::parse(bytes).context("Failed to parse feed")?;

    Ok(feed
        .entries
        .iter()
        .take(limit)
        .map(FeedEntry::from_entry)
        .collect())
}

/// Run `op` for every input in order and keep only the successes.
///
/// Failures are logged at debug level and otherwise dropped, so one bad input never aborts
/// the caller.
pub async fn collect_successes<I, T, F, Fut>(inputs: I, mut op: F) -> Vec<T>
where
    I: IntoIterator,
    I::Item: std::fmt::Display,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut collected = Vec::new();
    for input in inputs {
        let label = input.to_string();
        match op(input).await {
            Ok(items) => collected.extend(items),
            Err(e) => tracing::debug!(source = %label, error = %e, "skipping source"),
        }
    }
    collected
}

/// Keep the first item for each key, preserving encounter order. Items with an empty key are
/// dropped.
pub fn dedupe_by<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let k = key(item);
            !k.is_empty() && seen.insert(k.to_string())
        })
        .collect()
}

pub struct FeedFetcher {
    source: Arc<dyn FeedSource>,
    feeds: Vec<String>,
}

impl FeedFetcher {
    pub fn new(source: Arc<dyn FeedSource>, feeds: Vec<String>) -> Self {
        Self { source, feeds }
    }

    /// Relevant articles across all feeds, deduplicated by URL.
    pub async fn fetch(&self, limit_per_feed: usize) -> Vec<Article> {
        let found = collect_successes(self.feeds.iter(), |feed_url| async move {
            let bytes = self.source.fetch_feed(feed_url).await?;
            let entries = parse_entries(&bytes, limit_per_feed)?;
            Ok::<_, anyhow::Error>(entries.into_iter().filter_map(Self::to_article).collect())
        })
        .await;

        dedupe_by(found, |a: &Article| a.url.as_str())
    }

    fn to_article(entry: FeedEntry) -> Option<Article> {
        if entry.title.is_empty() || entry.link.is_empty() {
            return None;
        }
        if !keywords::is_relevant(&entry.title, &entry.summary) {
            return None;
        }

        Some(Article {
            summary: truncate_chars(&entry.summary, SUMMARY_MAX_CHARS).to_string(),
            title: entry.title,
            url: entry.link,
            published: entry.published,
            content: None,
        })
    }
}
