//! Completion provider implementations.
//!
//! - **[`GeminiProvider`]** — Google Generative Language `generateContent`;
//!   used for both primary profiles.
//! - **[`OpenAIProvider`]** — OpenAI chat completions; used as the fallback.
//!
//! Use [`build_client`] to assemble a [`CompletionClient`] from configuration
//! and environment.
//!
//! # Error Classification
//!
//! - HTTP 429 → `rate_limited`
//! - any other non-2xx or transport error → classified from its message
//!   (`"quota"` or `"429"` marks it rate limited)

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::completion::CompletionClient;
use crate::config::CompletionConfig;
use crate::error::ProviderError;
use crate::traits::CompletionProvider;

/// Build the shared completion client.
///
/// Requires `GEMINI_API_KEY`. The fallback is configured only when
/// `OPENAI_API_KEY` is set.
pub fn build_client(config: &CompletionConfig) -> Result<CompletionClient> {
    let gemini_key = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => bail!("GEMINI_API_KEY environment variable not set"),
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let file = GeminiProvider::new(http.clone(), config, &config.file_model, &gemini_key);
    let project = GeminiProvider::new(http.clone(), config, &config.project_model, &gemini_key);

    let fallback: Option<Arc<dyn CompletionProvider>> = match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            Some(Arc::new(OpenAIProvider::new(http, config, &key)))
        }
        _ => {
            info!("OPENAI_API_KEY not set; rate-limited calls will not fall back");
            None
        }
    };

    Ok(CompletionClient::new(
        Arc::new(file),
        Arc::new(project),
        fallback,
    ))
}

// ============ Gemini ============

/// Primary provider calling `POST {api}/{model}:generateContent`.
pub struct GeminiProvider {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(http: reqwest::Client, config: &CompletionConfig, model: &str, api_key: &str) -> Self {
        Self {
            http,
            api_url: config.gemini_api_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/{}:generateContent", self.api_url, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("Gemini request failed: {}", e)))?;

        let json = read_json(response, "Gemini").await?;
        parse_gemini_response(&json)
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_gemini_response(json: &serde_json::Value) -> Result<String, ProviderError> {
    let parts = json["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| ProviderError::new("Gemini response has no candidate content"))?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    Ok(text.trim().to_string())
}

// ============ OpenAI ============

/// Fallback provider calling `POST {api}/chat/completions`.
pub struct OpenAIProvider {
    http: reqwest::Client,
    api_url: String,
    model: String,
    temperature: f32,
    api_key: String,
}

impl OpenAIProvider {
    pub fn new(http: reqwest::Client, config: &CompletionConfig, api_key: &str) -> Self {
        Self {
            http,
            api_url: config.fallback_api_url.trim_end_matches('/').to_string(),
            model: config.fallback_model.clone(),
            temperature: config.temperature,
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(format!("OpenAI request failed: {}", e)))?;

        let json = read_json(response, "OpenAI").await?;
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| ProviderError::new("OpenAI response has no message content"))
    }
}

/// Turn a response into JSON, mapping non-2xx statuses to [`ProviderError`].
async fn read_json(response: reqwest::Response, api: &str) -> Result<serde_json::Value, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = format!("{} API error {}: {}", api, status, body.trim());
        return Err(if status.as_u16() == 429 {
            ProviderError::rate_limited(message)
        } else {
            ProviderError::new(message)
        });
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::new(format!("{} response was not JSON: {}", api, e)))
}
