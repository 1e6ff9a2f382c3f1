use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{LanguageMode, RunSlot};
use crate::prompts::{self, TARGET_POST_CHARS};

/// A generative-text backend: one prompt in, the raw response document out.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<Value>;
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        })
    }
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<Value> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Gemini API error {}: {}", status, error_text);
        }

        response
            .json::<Value>()
            .await
            .context("Failed to parse Gemini API response")
    }
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Wait before attempt `failed + 1`, after `failed` failures (1-based).
    pub fn delay_after(&self, failed: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Text of the first candidate, all parts concatenated.
pub fn response_text(response: &Value) -> Option<String> {
    if let Some(text) = response.get("text").and_then(Value::as_str) {
        return Some(text.to_string());
    }

    let parts = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    Some(text)
}

pub struct DraftGenerator {
    client: Arc<dyn CompletionClient>,
    model: String,
    retry: RetryPolicy,
}

impl DraftGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, model: String) -> Self {
        Self {
            client,
            model,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// One short post draft for `brief`. The length and content rules are instructions to the
    /// model only; the returned text is not validated.
    pub async fn generate(
        &self,
        brief: &str,
        language_mode: LanguageMode,
        run_slot: RunSlot,
        slot_style: &str,
    ) -> Result<String> {
        let prompt = prompts::build_prompt(brief, language_mode, run_slot, slot_style);

        let mut attempt = 1;
        let response = loop {
            match self.client.complete(&self.model, &prompt).await {
                Ok(response) => break response,
                Err(e) if attempt < self.retry.max_attempts => {
                    let backoff = self.retry.delay_after(attempt);
                    tracing::warn!(attempt, error = %e, ?backoff, "generation failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e.context(format!("Generation failed after {} attempts", attempt)))
                }
            }
        };

        let text = match response_text(&response).filter(|t| !t.is_empty()) {
            Some(text) => text,
            None => {
                tracing::warn!("generation response carried no text, using raw response");
                response.to_string()
            }
        };
        let draft = text.trim().to_string();

        let length = draft.chars().count();
        if length > TARGET_POST_CHARS {
            tracing::warn!(length, target = TARGET_POST_CHARS, "draft is longer than the target");
        }

        Ok(draft)
    }
}
