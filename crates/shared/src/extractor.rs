use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;

use crate::sources::PageSource;
use crate::text::{clean, truncate_chars};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);
pub const DEFAULT_MAX_CHARS: usize = 3000;

/// Containers searched, in order, for the article body.
const CONTENT_ROOTS: &[&str] = &["article", "main", "[role=main]", "body"];
const TEXT_BLOCKS: &str = "p, h1, h2, h3, h4, li, blockquote, pre";
const BOILERPLATE_TAGS: &[&str] = &[
    "nav", "header", "footer", "aside", "form", "table", "script", "style", "noscript",
];

pub struct ArticleExtractor {
    pages: Arc<dyn PageSource>,
}

impl ArticleExtractor {
    pub fn new(pages: Arc<dyn PageSource>) -> Self {
        Self { pages }
    }

    /// Readable body text for `url`, or `None` on any network, status or parse failure.
    pub async fn extract(&self, url: &str, timeout: Duration, max_chars: usize) -> Option<String> {
        let page = match self.pages.fetch_page(url, timeout).await {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!(url, error = %e, "article fetch failed");
                return None;
            }
        };

        if page.status >= 400 {
            tracing::debug!(url, status = page.status, "article fetch returned error status");
            return None;
        }

        let text = extract_readable_text(&page.body)?;
        Some(truncate_chars(&text, max_chars).to_string())
    }
}

/// Body text with navigation, comments, tables and other page chrome removed.
pub fn extract_readable_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let blocks = Selector::parse(TEXT_BLOCKS).ok()?;

    for root_selector in CONTENT_ROOTS {
        let Ok(selector) = Selector::parse(root_selector) else {
            continue;
        };
        let Some(root) = document.select(&selector).find(|el| !is_boilerplate(el)) else {
            continue;
        };

        let paragraphs: Vec<String> = root
            .select(&blocks)
            .filter(|el| !is_boilerplate(el))
            // Skip blocks nested in another block so list items inside a blockquote are not repeated
            .filter(|el| !has_block_ancestor(el, &root))
            .map(|el| clean(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect();

        if !paragraphs.is_empty() {
            return Some(paragraphs.join(" "));
        }

        // Bare text outside block elements, e.g. stories laid out in plain divs
        let rendered = if *root_selector == "body" {
            pruned_text(&root)
        } else {
            clean(&html2text::from_read(root.html().as_bytes(), 120))
        };
        if !rendered.is_empty() {
            return Some(rendered);
        }
    }

    None
}

fn is_boilerplate(el: &ElementRef) -> bool {
    let node = **el;
    std::iter::once(node)
        .chain(node.ancestors())
        .filter_map(|node| node.value().as_element())
        .any(|e| {
            BOILERPLATE_TAGS.contains(&e.name())
                || e.id().map(looks_like_comments).unwrap_or(false)
                || e.classes().any(looks_like_comments)
        })
}

/// Every text node under `root` that does not sit inside page chrome.
fn pruned_text(root: &ElementRef) -> String {
    let node = **root;
    let pieces: Vec<&str> = node
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = ElementRef::wrap(node.parent()?)?;
            (!is_boilerplate(&parent)).then_some(&**text)
        })
        .collect();

    clean(&pieces.join(" "))
}

fn has_block_ancestor(el: &ElementRef, root: &ElementRef) -> bool {
    let root_id = (**root).id();
    let node = **el;
    for node in node.ancestors() {
        if node.id() == root_id {
            return false;
        }
        if let Some(e) = node.value().as_element() {
            if matches!(e.name(), "p" | "li" | "blockquote" | "pre") {
                return true;
            }
        }
    }
    false
}

fn looks_like_comments(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("comment") || name.contains("disqus")
}
