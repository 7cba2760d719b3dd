//! Answerer abstraction: the generative model that turns a prompt into text.
//!
//! Implementations:
//! - **[`GeminiAnswerer`]**: Google Gemini `generateContent` API (default).
//! - **[`OpenAIAnswerer`]**: OpenAI chat completions API.
//! - **[`OllamaAnswerer`]**: a local Ollama instance's `/api/generate`.
//! - **[`DisabledAnswerer`]**: always fails; useful for extraction-only setups.
//!
//! Use [`create_answerer`] to build the one named in the configuration.
//!
//! Calls are single-shot: no retry or backoff. The HTTP client carries the
//! configured timeout, and the engine applies the same bound around every
//! call so a failure always comes back as a structured answer.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AnswererConfig;

pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Placeholder shipped in sample `.env` files; treated as unset.
const PLACEHOLDER_KEY: &str = "your_gemini_api_key_here";

/// A text-generation capability.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-2.5-flash"`).
    fn model_name(&self) -> &str;

    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Instantiate the answerer selected by `config.provider`.
///
/// # Errors
///
/// Fails if the provider is unknown or its API key is missing from the
/// environment.
pub fn create_answerer(config: &AnswererConfig) -> Result<Arc<dyn Answerer>> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiAnswerer::new(config)?)),
        "openai" => Ok(Arc::new(OpenAIAnswerer::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaAnswerer::new(config)?)),
        "disabled" => Ok(Arc::new(DisabledAnswerer)),
        other => bail!("Unknown answerer provider: {}", other),
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to create HTTP client")
}

fn api_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() && key != PLACEHOLDER_KEY => Ok(key),
        _ => bail!("Please set {} in the environment or .env file", var),
    }
}

/// Turn a non-success response into an error carrying status and body.
async fn error_for_status(provider: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body_text = response.text().await.unwrap_or_default();
    bail!("{} API error {}: {}", provider, status, body_text)
}

// ============ Disabled ============

pub struct DisabledAnswerer;

#[async_trait]
impl Answerer for DisabledAnswerer {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("Answerer provider is disabled")
    }
}

// ============ Gemini ============

/// Answerer using the Google Gemini API.
///
/// Calls `POST /v1beta/models/{model}:generateContent`. Requires
/// `GOOGLE_API_KEY`.
pub struct GeminiAnswerer {
    model: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiAnswerer {
    pub fn new(config: &AnswererConfig) -> Result<Self> {
        Ok(Self {
            model: config.model_or_default(),
            base_url: config
                .url
                .clone()
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            api_key: api_key(GOOGLE_API_KEY_ENV)?,
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl Answerer for GeminiAnswerer {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url.trim_end_matches('/'),
                self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?;
        let json: serde_json::Value = error_for_status("Gemini", response).await?.json().await?;
        parse_gemini_response(&json)
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_gemini_response(json: &serde_json::Value) -> Result<String> {
    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let reason = json
                .pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str())
                .unwrap_or("missing candidates");
            anyhow::anyhow!("Invalid Gemini response: {}", reason)
        })?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        bail!("Invalid Gemini response: candidate has no text");
    }
    Ok(text)
}

// ============ OpenAI ============

/// Answerer using the OpenAI chat completions API. Requires `OPENAI_API_KEY`.
pub struct OpenAIAnswerer {
    model: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIAnswerer {
    pub fn new(config: &AnswererConfig) -> Result<Self> {
        Ok(Self {
            model: config.model_or_default(),
            base_url: config
                .url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            api_key: api_key(OPENAI_API_KEY_ENV)?,
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl Answerer for OpenAIAnswerer {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let response = self
            .client
            .post(format!(
                "{}/v1/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("OpenAI request failed")?;
        let json: serde_json::Value = error_for_status("OpenAI", response).await?.json().await?;
        parse_openai_response(&json)
    }
}

fn parse_openai_response(json: &serde_json::Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing message content"))
}

// ============ Ollama ============

/// Answerer using a local Ollama instance (default `http://localhost:11434`).
pub struct OllamaAnswerer {
    model: String,
    url: String,
    client: reqwest::Client,
}

impl OllamaAnswerer {
    pub fn new(config: &AnswererConfig) -> Result<Self> {
        Ok(Self {
            model: config.model_or_default(),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl Answerer for OllamaAnswerer {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });
        let response = self
            .client
            .post(format!("{}/api/generate", self.url.trim_end_matches('/')))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Ollama connection error (is Ollama running at {}?)", self.url))?;
        let json: serde_json::Value = error_for_status("Ollama", response).await?.json().await?;
        json.get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response field"))
    }
}
