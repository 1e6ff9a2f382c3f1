use std::env;
use std::fmt;

use crate::error::ConfigError;
use crate::feeds::DEFAULT_RSS_FEEDS;

/// Named run instance; controls tone and topical emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSlot {
    Morning,
    Evening,
}

impl RunSlot {
    /// Anything other than `evening` is a morning run.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "evening" => RunSlot::Evening,
            _ => RunSlot::Morning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunSlot::Morning => "morning",
            RunSlot::Evening => "evening",
        }
    }
}

impl fmt::Display for RunSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which categories of sources a run consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsMode {
    Regular,
    Launches,
    Both,
}

impl NewsMode {
    /// Unknown values fall back to `both`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "regular" => NewsMode::Regular,
            "launches" => NewsMode::Launches,
            _ => NewsMode::Both,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsMode::Regular => "regular",
            NewsMode::Launches => "launches",
            NewsMode::Both => "both",
        }
    }

    pub fn includes_regular(&self) -> bool {
        matches!(self, NewsMode::Regular | NewsMode::Both)
    }

    pub fn includes_launches(&self) -> bool {
        matches!(self, NewsMode::Launches | NewsMode::Both)
    }
}

impl fmt::Display for NewsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageMode {
    Auto,
    En,
    Es,
}

impl LanguageMode {
    /// Unknown values fall back to `auto`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "en" => LanguageMode::En,
            "es" => LanguageMode::Es,
            _ => LanguageMode::Auto,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageMode::Auto => "auto",
            LanguageMode::En => "en",
            LanguageMode::Es => "es",
        }
    }
}

impl fmt::Display for LanguageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fetch depth and item caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Regular RSS articles kept for the brief.
    pub max_articles: usize,
    /// Launch items kept after cross-query dedup.
    pub max_launch_items: usize,
    /// Entries pulled from each RSS feed.
    pub limit_per_feed: usize,
    /// Entries pulled from each search query.
    pub per_query_items: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_articles: 5,
            max_launch_items: 6,
            limit_per_feed: 15,
            per_query_items: 6,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub enabled: bool,
    pub to: Option<String>,
    pub user: Option<String>,
    pub app_password: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl EmailSettings {
    pub const DEFAULT_SMTP_HOST: &'static str = "smtp.gmail.com";
    pub const DEFAULT_SMTP_PORT: u16 = 465;

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            to: None,
            user: None,
            app_password: None,
            smtp_host: Self::DEFAULT_SMTP_HOST.to_string(),
            smtp_port: Self::DEFAULT_SMTP_PORT,
        }
    }

    /// Recipient, sender and credential, or the first one that is missing.
    pub fn credentials(&self) -> Result<(&str, &str, &str), ConfigError> {
        let to = self.to.as_deref().ok_or(ConfigError::Missing("EMAIL_TO"))?;
        let user = self.user.as_deref().ok_or(ConfigError::Missing("GMAIL_USER"))?;
        let password = self
            .app_password
            .as_deref()
            .ok_or(ConfigError::Missing("GMAIL_APP_PASSWORD"))?;
        Ok((to, user, password))
    }
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("enabled", &self.enabled)
            .field("to", &self.to)
            .field("user", &self.user)
            .field("app_password", &self.app_password.as_ref().map(|_| "<redacted>"))
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub language_mode: LanguageMode,
    pub run_slot: RunSlot,
    pub news_mode: NewsMode,
    pub limits: Limits,
    pub rss_feeds: Vec<String>,
    pub email: EmailSettings,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("language_mode", &self.language_mode)
            .field("run_slot", &self.run_slot)
            .field("news_mode", &self.news_mode)
            .field("limits", &self.limits)
            .field("rss_feeds", &self.rss_feeds)
            .field("email", &self.email)
            .finish()
    }
}

impl Config {
    pub const DEFAULT_MODEL: &'static str = "gemini-1.5-flash";

    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key/value source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let gemini_api_key = get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        let gemini_model = get("GEMINI_MODEL").unwrap_or_else(|| Self::DEFAULT_MODEL.to_string());

        let language_mode = LanguageMode::parse(&get("LANGUAGE_MODE").unwrap_or_default());
        let run_slot = RunSlot::parse(&get("RUN_SLOT").unwrap_or_default());
        let news_mode = NewsMode::parse(&get("NEWS_MODE").unwrap_or_default());

        let defaults = Limits::default();
        let number = |key: &'static str, default: usize| -> Result<usize, ConfigError> {
            match get(key) {
                None => Ok(default),
                Some(value) => value
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidNumber { key, value }),
            }
        };
        let limits = Limits {
            max_articles: number("MAX_ARTICLES", defaults.max_articles)?,
            max_launch_items: number("MAX_LAUNCH_ITEMS", defaults.max_launch_items)?,
            limit_per_feed: number("LIMIT_PER_FEED", defaults.limit_per_feed)?,
            per_query_items: number("PER_QUERY_ITEMS", defaults.per_query_items)?,
        };

        let rss_feeds = match get("RSS_FEEDS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_RSS_FEEDS.iter().map(|s| s.to_string()).collect(),
        };

        let smtp_port = match get("SMTP_PORT") {
            None => EmailSettings::DEFAULT_SMTP_PORT,
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
                key: "SMTP_PORT",
                value,
            })?,
        };
        let email = EmailSettings {
            enabled: get("EMAIL_ENABLED")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            to: get("EMAIL_TO"),
            user: get("GMAIL_USER"),
            app_password: get("GMAIL_APP_PASSWORD"),
            smtp_host: get("SMTP_HOST").unwrap_or_else(|| EmailSettings::DEFAULT_SMTP_HOST.to_string()),
            smtp_port,
        };

        // Fail before any network activity rather than after the draft is generated
        if email.enabled {
            email.credentials()?;
        }

        Ok(Self {
            gemini_api_key,
            gemini_model,
            language_mode,
            run_slot,
            news_mode,
            limits,
            rss_feeds,
            email,
        })
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/stablecoin-draft/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("stablecoin-draft").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }

        // Nothing found is fine, the scheduler may set variables directly
    }
}
