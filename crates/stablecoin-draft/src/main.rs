use anyhow::{Context, Result};
use clap::Parser;
use shared::{
    ArticleExtractor, Config, DraftGenerator, FeedFetcher, GeminiClient, HttpClient, LanguageMode,
    NewsMode, Notifier, Pipeline, RunOutcome, RunParams, RunSlot, SearchNewsFetcher, SmtpMailer,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stablecoin-draft")]
#[command(about = "Gather stablecoin news and email a generated X post draft")]
struct Args {
    /// Run slot (morning, evening); overrides RUN_SLOT
    #[arg(long)]
    slot: Option<String>,

    /// News mode (regular, launches, both); overrides NEWS_MODE
    #[arg(long)]
    mode: Option<String>,

    /// Output language (auto, en, es); overrides LANGUAGE_MODE
    #[arg(long)]
    language: Option<String>,

    /// Print the draft without sending email
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;

    if let Some(slot) = args.slot.as_deref() {
        config.run_slot = RunSlot::parse(slot);
    }
    if let Some(mode) = args.mode.as_deref() {
        config.news_mode = NewsMode::parse(mode);
    }
    if let Some(language) = args.language.as_deref() {
        config.language_mode = LanguageMode::parse(language);
    }
    if args.dry_run {
        config.email.enabled = false;
    }
    tracing::debug!(?config, "configuration resolved");

    let http = Arc::new(HttpClient::new()?);
    let gemini = Arc::new(GeminiClient::new(config.gemini_api_key.clone())?);

    let pipeline = Pipeline {
        feeds: FeedFetcher::new(http.clone(), config.rss_feeds.clone()),
        extractor: ArticleExtractor::new(http.clone()),
        search: SearchNewsFetcher::new(http),
        generator: DraftGenerator::new(gemini, config.gemini_model.clone()),
        notifier: Notifier::new(
            config.email.clone(),
            Arc::new(SmtpMailer::from_settings(&config.email)),
        ),
    };

    let params = RunParams::from_config(&config);
    let outcome = pipeline.run(&params).await.context("Run failed")?;

    match outcome {
        RunOutcome::NoItems { subject } => tracing::info!(%subject, "no items found"),
        RunOutcome::Drafted { subject, .. } => tracing::info!(%subject, "draft complete"),
    }

    Ok(())
}
