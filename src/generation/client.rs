//! Anthropic messages API client.
//!
//! Reads `ANTHROPIC_API_KEY` (and optionally `ANTHROPIC_BASE_URL`) from the
//! environment, with `.env` values taking precedence.

use super::VisionModel;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Model used when none is given.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";
/// API endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Blocking client for one model.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicClient {
    /// Create a client with explicit credentials.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| Error::Generation(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2000,
            temperature: 0.7,
        })
    }

    /// Create a client from `.env` and the process environment.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv_override();
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| Error::Config("ANTHROPIC_API_KEY is not set".to_string()))?;
        let mut client = Self::new(api_key)?;
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            client.base_url = base_url;
        }
        Ok(client)
    }

    /// Use another model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the response token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn request_body(&self, system: &str, user: &str, image_b64: &str) -> Value {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "system": system,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {"type": "base64", "media_type": "image/png", "data": image_b64}
                    },
                    {"type": "text", "text": user}
                ]
            }]
        })
    }
}

fn response_text(body: &Value) -> Option<String> {
    body.get("content")?
        .as_array()?
        .iter()
        .find(|part| part.get("type").and_then(Value::as_str) == Some("text"))?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

impl VisionModel for AnthropicClient {
    fn complete(&self, system: &str, user: &str, image: &Path) -> Result<String> {
        let image_b64 = BASE64_STANDARD.encode(fs::read(image)?);
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(system, user, &image_b64))
            .send()
            .map_err(|e| Error::Generation(format!("request failed: {}", e)))?;

        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| Error::Generation(format!("unreadable response ({}): {}", status, e)))?;
        if !status.is_success() {
            return Err(Error::Generation(format!("API returned {}: {}", status, body)));
        }
        response_text(&body).ok_or_else(|| Error::Generation("response has no text content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let client = AnthropicClient::new("key").unwrap().with_temperature(0.2);
        let body = client.request_body("sys", "describe", "AAAA");
        assert_eq!(body["system"], "sys");
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["content"][0]["source"]["data"], "AAAA");
        assert_eq!(body["messages"][0]["content"][1]["text"], "describe");
    }

    #[test]
    fn test_response_text() {
        let body = json!({"content": [{"type": "text", "text": "Hello"}]});
        assert_eq!(response_text(&body).as_deref(), Some("Hello"));
        assert_eq!(response_text(&json!({"content": []})), None);
    }
}
