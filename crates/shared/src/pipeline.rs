use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::briefing::BriefBuilder;
use crate::config::{Config, LanguageMode, Limits, NewsMode, RunSlot};
use crate::extractor::{self, ArticleExtractor};
use crate::feeds::FeedFetcher;
use crate::generator::DraftGenerator;
use crate::notifier::Notifier;
use crate::prompts;
use crate::search::{self, SearchNewsFetcher};

/// Read-only parameters of one batch run.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub run_slot: RunSlot,
    pub news_mode: NewsMode,
    pub language_mode: LanguageMode,
    pub limits: Limits,
    pub launch_queries: Vec<String>,
}

impl RunParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            run_slot: config.run_slot,
            news_mode: config.news_mode,
            language_mode: config.language_mode,
            limits: config.limits.clone(),
            launch_queries: search::LAUNCH_QUERIES.iter().map(|q| q.to_string()).collect(),
        }
    }
}

/// A consulted source listed at the bottom of the draft email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
}

/// One category's rendered brief and the sources behind it.
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub brief: String,
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NoItems { subject: String },
    Drafted { subject: String, draft: String },
}

pub struct Pipeline {
    pub feeds: FeedFetcher,
    pub extractor: ArticleExtractor,
    pub search: SearchNewsFetcher,
    pub generator: DraftGenerator,
    pub notifier: Notifier,
}

impl Pipeline {
    pub async fn run(&self, params: &RunParams) -> Result<RunOutcome> {
        self.run_at(params, Utc::now()).await
    }

    pub async fn run_at(&self, params: &RunParams, now: DateTime<Utc>) -> Result<RunOutcome> {
        print_header(params, now);

        let regular = if params.news_mode.includes_regular() {
            self.gather_regular(&params.limits).await
        } else {
            Section::default()
        };

        let launches = if params.news_mode.includes_launches() {
            self.gather_launches(params).await
        } else {
            Section::default()
        };

        let slot = params.run_slot;
        let mode = params.news_mode;

        // Both operands must hold; a category excluded by the mode never satisfies its side
        if (mode.includes_regular() && regular.brief.is_empty())
            && (mode.includes_launches() && launches.brief.is_empty())
        {
            let subject = no_items_subject(slot);
            let body = format!(
                "[{}] No stablecoin-related items found for mode={}.",
                slot, mode
            );
            println!("{}", body);
            self.notifier
                .notify(&subject, &body)
                .await
                .context("Failed to send no-items notice")?;
            return Ok(RunOutcome::NoItems { subject });
        }

        let brief = BriefBuilder::combine(
            prompts::slot_topic_hint(slot),
            &regular.brief,
            &launches.brief,
        );
        tracing::debug!(chars = brief.chars().count(), "brief composed");

        let draft = self
            .generator
            .generate(
                &brief,
                params.language_mode,
                slot,
                prompts::slot_style(slot),
            )
            .await
            .context("Failed to generate draft")?;

        println!("\n--- X DRAFT ---\n");
        println!("{}", draft);
        println!("\n--- END ---\n");

        let subject = draft_subject(slot, mode);
        let body = draft_email_body(slot, mode, now, &draft, &regular.sources, &launches.sources);
        self.notifier
            .notify(&subject, &body)
            .await
            .context("Failed to send draft email")?;

        Ok(RunOutcome::Drafted { subject, draft })
    }

    async fn gather_regular(&self, limits: &Limits) -> Section {
        let mut articles = self.feeds.fetch(limits.limit_per_feed).await;
        articles.truncate(limits.max_articles);
        tracing::info!(count = articles.len(), "regular articles selected");

        for article in &mut articles {
            article.content = self
                .extractor
                .extract(
                    &article.url,
                    extractor::DEFAULT_TIMEOUT,
                    extractor::DEFAULT_MAX_CHARS,
                )
                .await;
        }

        Section {
            brief: BriefBuilder::regular_news(&articles),
            sources: articles
                .iter()
                .map(|a| SourceRef {
                    title: a.title.clone(),
                    url: a.url.clone(),
                })
                .collect(),
        }
    }

    async fn gather_launches(&self, params: &RunParams) -> Section {
        let mut hits = Vec::new();
        for query in &params.launch_queries {
            match self
                .search
                .fetch(query, params.limits.per_query_items)
                .await
            {
                Ok(items) => hits.extend(items),
                Err(e) => tracing::debug!(query = %query, error = %e, "search query failed"),
            }
        }

        let mut hits = search::dedupe_by_link(hits);
        hits.truncate(params.limits.max_launch_items);
        tracing::info!(count = hits.len(), "launch items selected");

        Section {
            brief: BriefBuilder::launch_news(&hits),
            sources: hits
                .iter()
                .map(|h| SourceRef {
                    title: h.title.clone(),
                    url: h.link.clone(),
                })
                .collect(),
        }
    }
}

fn print_header(params: &RunParams, now: DateTime<Utc>) {
    println!("=== Stablecoin Daily Draft Runner ===");
    println!("Time (UTC): {}", now.to_rfc3339());
    println!("RUN_SLOT: {}", params.run_slot);
    println!("NEWS_MODE: {}", params.news_mode);
    println!("LANGUAGE_MODE: {}", params.language_mode);
    println!(
        "MAX_ARTICLES: {} MAX_LAUNCH_ITEMS: {}",
        params.limits.max_articles, params.limits.max_launch_items
    );
}

pub fn no_items_subject(slot: RunSlot) -> String {
    format!("Stablecoin Agent - {}: no items", slot)
}

pub fn draft_subject(slot: RunSlot, mode: NewsMode) -> String {
    format!("Stablecoin Agent - {} X draft ({})", slot, mode)
}

/// Copy/paste friendly body: run info, the draft, then the sources grouped by category.
pub fn draft_email_body(
    slot: RunSlot,
    mode: NewsMode,
    now: DateTime<Utc>,
    draft: &str,
    regular: &[SourceRef],
    launches: &[SourceRef],
) -> String {
    let mut source_lines = Vec::new();
    for (heading, sources) in [
        ("Regular sources:", regular),
        ("Launch/announcement sources:", launches),
    ] {
        if sources.is_empty() {
            continue;
        }
        source_lines.push(heading.to_string());
        source_lines.extend(
            sources
                .iter()
                .filter(|s| !s.url.is_empty())
                .map(|s| format!("- {} - {}", s.title, s.url)),
        );
    }

    let sources = if source_lines.is_empty() {
        "No sources listed.".to_string()
    } else {
        source_lines.join("\n")
    };

    format!(
        "RUN_SLOT: {}\nNEWS_MODE: {}\nTIME (UTC): {}\n\nX DRAFT (copy/paste):\n\n{}\n\n----\n{}\n",
        slot,
        mode,
        now.to_rfc3339(),
        draft,
        sources
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailSettings;
    use crate::feeds::tests::{rss, StaticFeeds};
    use crate::generator::tests::{gemini_reply, FlakyClient};
    use crate::generator::RetryPolicy;
    use crate::notifier::tests::{enabled_settings, RecordingMailer};
    use crate::search::{news_search_url, SearchLocale};
    use crate::sources::{Page, PageSource};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Arc;
    use std::time::Duration;

    struct NoPages;

    #[async_trait]
    impl PageSource for NoPages {
        async fn fetch_page(&self, url: &str, _timeout: Duration) -> Result<Page> {
            anyhow::bail!("offline: {}", url)
        }
    }

    /// Serves the same article page for every URL.
    struct ArticlePages(&'static str);

    #[async_trait]
    impl PageSource for ArticlePages {
        async fn fetch_page(&self, _url: &str, _timeout: Duration) -> Result<Page> {
            Ok(Page {
                status: 200,
                body: self.0.to_string(),
            })
        }
    }

    struct Harness {
        pipeline: Pipeline,
        client: Arc<FlakyClient>,
        mailer: Arc<RecordingMailer>,
    }

    fn harness(source: StaticFeeds, feeds: &[&str], email: EmailSettings) -> Harness {
        let source = Arc::new(source);
        let client = Arc::new(FlakyClient::new(0, gemini_reply("USDC supply grows https://a.example/1")));
        let mailer = Arc::new(RecordingMailer::default());

        let pipeline = Pipeline {
            feeds: FeedFetcher::new(source.clone(), feeds.iter().map(|s| s.to_string()).collect()),
            extractor: ArticleExtractor::new(Arc::new(NoPages)),
            search: SearchNewsFetcher::new(source),
            generator: DraftGenerator::new(client.clone(), "gemini-test".to_string()).with_retry(
                RetryPolicy {
                    max_attempts: 3,
                    initial_delay: Duration::from_millis(1),
                    max_delay: Duration::from_millis(1),
                },
            ),
            notifier: Notifier::new(email, mailer.clone()),
        };

        Harness {
            pipeline,
            client,
            mailer,
        }
    }

    fn params(mode: NewsMode) -> RunParams {
        RunParams {
            run_slot: RunSlot::Morning,
            news_mode: mode,
            language_mode: LanguageMode::Auto,
            limits: Limits::default(),
            launch_queries: vec!["stablecoin launch when:1d".to_string()],
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    fn launch_doc_url() -> String {
        news_search_url("stablecoin launch when:1d", &SearchLocale::default())
    }

    fn query_url(query: &str) -> String {
        news_search_url(query, &SearchLocale::default())
    }

    #[tokio::test]
    async fn test_regular_articles_are_capped() {
        let source = StaticFeeds::default().with(
            "https://feed.example/a",
            rss(&[
                ("USDC one", "https://a.example/1", ""),
                ("USDC two", "https://a.example/2", ""),
                ("USDC three", "https://a.example/3", ""),
            ]),
        );
        let h = harness(source, &["https://feed.example/a"], enabled_settings());
        let mut run = params(NewsMode::Regular);
        run.limits.max_articles = 2;

        h.pipeline.run_at(&run, now()).await.unwrap();

        let prompt = h.client.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("URL: https://a.example/2"));
        assert!(!prompt.contains("https://a.example/3"));
        assert!(!h.mailer.sent()[0].body.contains("https://a.example/3"));
    }

    #[tokio::test]
    async fn test_launch_hits_are_deduped_before_the_cap() {
        let source = StaticFeeds::default()
            .with(
                &query_url("q one"),
                rss(&[("Acme token", "https://n.example/1", "")]),
            )
            .with(
                &query_url("q two"),
                rss(&[
                    ("Acme token", "https://n.example/1", ""),
                    ("Bank token", "https://n.example/2", ""),
                    ("Fund token", "https://n.example/3", ""),
                ]),
            );
        let h = harness(source, &[], enabled_settings());
        let mut run = params(NewsMode::Launches);
        run.launch_queries = vec!["q one".to_string(), "q two".to_string()];
        run.limits.max_launch_items = 2;

        h.pipeline.run_at(&run, now()).await.unwrap();

        let prompt = h.client.prompts.lock().unwrap()[0].clone();
        assert_eq!(prompt.matches("URL: https://n.example/1").count(), 1);
        assert!(prompt.contains("2) Bank token"));
        assert!(prompt.contains("URL: https://n.example/2"));
        assert!(!prompt.contains("https://n.example/3"));
    }

    #[tokio::test]
    async fn test_extracted_text_reaches_the_brief() {
        let source = StaticFeeds::default().with(
            "https://feed.example/a",
            rss(&[("USDC reserves", "https://a.example/1", "")]),
        );
        let mut h = harness(source, &["https://feed.example/a"], enabled_settings());
        h.pipeline.extractor = ArticleExtractor::new(Arc::new(ArticlePages(
            "<html><body><nav><p>Menu</p></nav><article><p>Reserves are held in   Treasuries.</p></article></body></html>",
        )));

        h.pipeline.run_at(&params(NewsMode::Regular), now()).await.unwrap();

        let prompt = h.client.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("URL: https://a.example/1\nKey text: Reserves are held in Treasuries."));
        assert!(!prompt.contains("Menu"));
    }

    #[tokio::test]
    async fn test_two_feeds_regular_mode_end_to_end() {
        let source = StaticFeeds::default()
            .with(
                "https://feed.example/a",
                rss(&[("USDC supply grows", "https://a.example/1", "Circle update")]),
            )
            .with(
                "https://feed.example/b",
                rss(&[("Tether publishes attestation", "https://b.example/2", "")]),
            );
        let h = harness(
            source,
            &["https://feed.example/a", "https://feed.example/b"],
            enabled_settings(),
        );

        let outcome = h.pipeline.run_at(&params(NewsMode::Regular), now()).await.unwrap();

        assert!(matches!(outcome, RunOutcome::Drafted { .. }));
        assert_eq!(h.client.calls(), 1);
        let prompt = h.client.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("1) USDC supply grows"));
        assert!(prompt.contains("2) Tether publishes attestation"));
        assert!(!prompt.contains("3) "));

        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("regular"));
        assert!(sent[0].body.contains("https://a.example/1"));
        assert!(sent[0].body.contains("https://b.example/2"));
        assert!(sent[0].body.contains("Regular sources:"));
        assert!(!sent[0].body.contains("Launch/announcement sources:"));
    }

    #[tokio::test]
    async fn test_both_modes_empty_sends_no_items_notice() {
        let source = StaticFeeds::default().with(
            "https://feed.example/a",
            rss(&[("Bitcoin rallies", "https://a.example/btc", "")]),
        );
        let h = harness(source, &["https://feed.example/a"], enabled_settings());

        let outcome = h.pipeline.run_at(&params(NewsMode::Both), now()).await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::NoItems {
                subject: "Stablecoin Agent - morning: no items".to_string()
            }
        );
        assert_eq!(h.client.calls(), 0);
        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].body,
            "[morning] No stablecoin-related items found for mode=both."
        );
    }

    #[tokio::test]
    async fn test_regular_mode_drafts_without_launch_brief() {
        let source = StaticFeeds::default().with(
            "https://feed.example/a",
            rss(&[("PYUSD expands", "https://a.example/pyusd", "")]),
        );
        let h = harness(source, &["https://feed.example/a"], enabled_settings());

        let outcome = h.pipeline.run_at(&params(NewsMode::Regular), now()).await.unwrap();

        assert!(matches!(outcome, RunOutcome::Drafted { .. }));
        assert_eq!(h.client.calls(), 1);
        let prompt = h.client.prompts.lock().unwrap()[0].clone();
        assert!(!prompt.contains("NEW STABLECOIN LAUNCHES"));
    }

    #[tokio::test]
    async fn test_single_mode_with_empty_brief_still_drafts() {
        // The excluded launch category never satisfies its half of the no-items check
        let h = harness(StaticFeeds::default(), &["https://feed.example/down"], enabled_settings());

        let outcome = h.pipeline.run_at(&params(NewsMode::Regular), now()).await.unwrap();

        assert!(matches!(outcome, RunOutcome::Drafted { .. }));
        assert_eq!(h.client.calls(), 1);
        assert!(h.mailer.sent()[0].body.contains("No sources listed."));
    }

    #[tokio::test]
    async fn test_launches_only_uses_search_results() {
        let source = StaticFeeds::default().with(
            &launch_doc_url(),
            rss(&[
                ("Bank launches euro token", "https://n.example/1", "Snippet text"),
                ("Bank launches euro token", "https://n.example/1", ""),
            ]),
        );
        let h = harness(source, &["https://feed.example/unused"], enabled_settings());

        let outcome = h.pipeline.run_at(&params(NewsMode::Launches), now()).await.unwrap();

        let RunOutcome::Drafted { subject, .. } = outcome else {
            panic!("expected a draft");
        };
        assert_eq!(subject, "Stablecoin Agent - morning X draft (launches)");
        let prompt = h.client.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("NEW STABLECOIN LAUNCHES / ANNOUNCEMENTS (Google News RSS):"));
        assert_eq!(prompt.matches("URL: https://n.example/1").count(), 1);
        let body = &h.mailer.sent()[0].body;
        assert!(body.contains("Launch/announcement sources:\n- Bank launches euro token - https://n.example/1"));
    }

    #[tokio::test]
    async fn test_generation_failure_sends_nothing() {
        let source = StaticFeeds::default().with(
            "https://feed.example/a",
            rss(&[("USDC news", "https://a.example/1", "")]),
        );
        let mut h = harness(source, &["https://feed.example/a"], enabled_settings());
        let client = Arc::new(FlakyClient::new(5, gemini_reply("never")));
        h.pipeline.generator = DraftGenerator::new(client.clone(), "gemini-test".to_string())
            .with_retry(RetryPolicy {
                max_attempts: 3,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
            });

        let result = h.pipeline.run_at(&params(NewsMode::Regular), now()).await;

        assert!(result.is_err());
        assert_eq!(client.calls(), 3);
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_email_disabled_still_drafts() {
        let source = StaticFeeds::default().with(
            "https://feed.example/a",
            rss(&[("USDC news", "https://a.example/1", "")]),
        );
        let h = harness(source, &["https://feed.example/a"], EmailSettings::disabled());

        let outcome = h.pipeline.run_at(&params(NewsMode::Both), now()).await.unwrap();

        assert!(matches!(outcome, RunOutcome::Drafted { .. }));
        assert!(h.mailer.sent().is_empty());
    }

    #[test]
    fn test_draft_email_body_layout() {
        let body = draft_email_body(
            RunSlot::Evening,
            NewsMode::Both,
            now(),
            "Draft text",
            &[SourceRef {
                title: "A".to_string(),
                url: "https://a.example".to_string(),
            }],
            &[SourceRef {
                title: "No url".to_string(),
                url: String::new(),
            }],
        );

        assert_eq!(
            body,
            "RUN_SLOT: evening\nNEWS_MODE: both\nTIME (UTC): 2026-02-01T12:00:00+00:00\n\nX DRAFT (copy/paste):\n\nDraft text\n\n----\nRegular sources:\n- A - https://a.example\nLaunch/announcement sources:\n"
        );
    }

    #[test]
    fn test_draft_email_body_without_sources() {
        let body = draft_email_body(RunSlot::Morning, NewsMode::Regular, now(), "d", &[], &[]);
        assert!(body.ends_with("----\nNo sources listed.\n"));
    }
}
