use anyhow::Result;
use std::sync::Arc;

use crate::feeds::{dedupe_by, parse_entries};
use crate::sources::FeedSource;

/// Launch and announcement searches, narrow enough that no keyword filter is applied.
pub const LAUNCH_QUERIES: &[&str] = &[
    // new launch detection
    "stablecoin launch when:1d",
    "new stablecoin announced when:1d",
    "stablecoin issuer launches when:1d",
    "intitle:stablecoin launches when:7d",
    "intitle:stablecoin \"announces\" when:7d",
    // specific classes / buzzwords
    "\"yield-bearing stablecoin\" when:7d",
    "\"synthetic dollar\" stablecoin when:7d",
    "\"overcollateralized stablecoin\" when:7d",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchNewsItem {
    pub title: String,
    pub link: String,
    pub published: String,
    pub summary: String,
}

/// Locale parameters for the news search endpoint.
#[derive(Debug, Clone)]
pub struct SearchLocale {
    pub hl: String,
    pub gl: String,
    pub ceid: String,
}

impl Default for SearchLocale {
    fn default() -> Self {
        Self {
            hl: "en-US".to_string(),
            gl: "US".to_string(),
            ceid: "US:en".to_string(),
        }
    }
}

pub fn news_search_url(query: &str, locale: &SearchLocale) -> String {
    format!(
        "https://news.google.com/rss/search?q={}&hl={}&gl={}&ceid={}",
        urlencoding::encode(query),
        locale.hl,
        locale.gl,
        locale.ceid
    )
}

pub struct SearchNewsFetcher {
    source: Arc<dyn FeedSource>,
    locale: SearchLocale,
}

impl SearchNewsFetcher {
    pub fn new(source: Arc<dyn FeedSource>) -> Self {
        Self {
            source,
            locale: SearchLocale::default(),
        }
    }

    /// Up to `max_items` results for `query`, in feed order, without dedup.
    pub async fn fetch(&self, query: &str, max_items: usize) -> Result<Vec<SearchNewsItem>> {
        let url = news_search_url(query, &self.locale);
        let bytes = self.source.fetch_feed(&url).await?;

        Ok(parse_entries(&bytes, max_items)?
            .into_iter()
            .map(|e| SearchNewsItem {
                title: e.title,
                link: e.link,
                published: e.published,
                summary: e.summary,
            })
            .collect())
    }
}

/// Drop repeated links across queries, keeping the first hit.
pub fn dedupe_by_link(items: Vec<SearchNewsItem>) -> Vec<SearchNewsItem> {
    dedupe_by(items, |item: &SearchNewsItem| item.link.as_str())
}
