// Public modules
pub mod briefing;
pub mod config;
pub mod error;
pub mod extractor;
pub mod feeds;
pub mod generator;
pub mod keywords;
pub mod notifier;
pub mod pipeline;
pub mod prompts;
pub mod search;
pub mod sources;
pub mod text;

// Re-export commonly used types
pub use briefing::BriefBuilder;
pub use config::{Config, EmailSettings, LanguageMode, Limits, NewsMode, RunSlot};
pub use error::ConfigError;
pub use extractor::ArticleExtractor;
pub use feeds::{Article, FeedFetcher};
pub use generator::{CompletionClient, DraftGenerator, GeminiClient, RetryPolicy};
pub use notifier::{MailTransport, Notifier, SmtpMailer};
pub use pipeline::{Pipeline, RunOutcome, RunParams};
pub use search::{SearchNewsFetcher, SearchNewsItem};
pub use sources::{FeedSource, HttpClient, PageSource};
