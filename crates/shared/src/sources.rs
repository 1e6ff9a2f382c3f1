use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Looks enough like a desktop browser that news sites serve the normal page.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Raw feed documents (RSS or Atom) by URL.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>>;
}

/// An HTML page response, whatever its status.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<Page>;
}

pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpClient {
    // No timeout here: a hung feed blocks until the server gives up
    async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch feed {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Feed {} returned HTTP {}", url, status);
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read feed body")?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<Page> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Failed to fetch page {}", url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(Page { status, body })
    }
}
