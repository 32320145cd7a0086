//! Gemini `generateContent` client used as the expression-extraction model.
//!
//! The API key travels in the `x-goog-api-key` header and transport errors
//! are reported without their URL, so the key never reaches error text.

use std::time::Duration;

use async_trait::async_trait;
use calc_problem::{ExpressionModel, LlmError};
use reqwest::header::HeaderValue;
use reqwest::{Client, Url};
use serde_json::{json, Value};
use tracing::debug;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error bodies are cut to this many characters before being reported.
const MAX_ERROR_BODY: usize = 320;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    url: Url,
    /// Marked sensitive, so `Debug` prints it redacted.
    api_key: HeaderValue,
    model: String,
}

impl GeminiClient {
    /// Client for `model` at the default endpoint with the default timeout.
    pub fn new(api_key: &str, model: &str) -> Result<Self, LlmError> {
        Self::builder(api_key).model(model).build()
    }

    pub fn builder(api_key: &str) -> GeminiClientBuilder {
        GeminiClientBuilder {
            api_key: api_key.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Clone)]
pub struct GeminiClientBuilder {
    api_key: String,
    model: String,
    endpoint: Option<String>,
    timeout: Duration,
}

impl GeminiClientBuilder {
    pub fn model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Base URL, or a full `...:generateContent` URL.
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<GeminiClient, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::Config("missing API key".into()));
        }
        let mut api_key = HeaderValue::from_str(self.api_key.trim())
            .map_err(|_| LlmError::Config("API key contains invalid characters".into()))?;
        api_key.set_sensitive(true);
        let url = resolve_gemini_endpoint(self.endpoint.as_deref(), &self.model)?;
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("http client: {}", e)))?;
        Ok(GeminiClient {
            http,
            url,
            api_key,
            model: self.model,
        })
    }
}

#[async_trait]
impl ExpressionModel for GeminiClient {
    async fn extract_expression(&self, prompt: &str) -> Result<String, LlmError> {
        let payload = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ]
        });

        debug!(model = %self.model, "sending gemini request");
        let response = self
            .http
            .post(self.url.clone())
            .header(API_KEY_HEADER, self.api_key.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.without_url().to_string()))?;

        let text = candidate_text(&body);
        if text.is_empty() {
            return Err(LlmError::Empty);
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Joined text parts of the first candidate.
fn candidate_text(body: &Value) -> String {
    body["candidates"]
        .as_array()
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate["content"]["parts"].as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn resolve_gemini_endpoint(endpoint: Option<&str>, model: &str) -> Result<Url, LlmError> {
    let endpoint = endpoint.unwrap_or(DEFAULT_GEMINI_ENDPOINT);
    let url = if endpoint.contains(":generateContent") {
        Url::parse(endpoint)
            .map_err(|e| LlmError::Config(format!("invalid gemini endpoint {}: {}", endpoint, e)))?
    } else {
        let base = endpoint.trim_end_matches('/');
        let generated = format!("{}/v1beta/models/{}:generateContent", base, model);
        Url::parse(&generated)
            .map_err(|e| LlmError::Config(format!("invalid gemini endpoint {}: {}", generated, e)))?
    };
    Ok(url)
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_endpoint_from_base() {
        let url = resolve_gemini_endpoint(Some("http://localhost:9000/"), "gemini-pro").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/v1beta/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_resolve_endpoint_keeps_full_url() {
        let full = "http://h/v1/models/m:generateContent?key=given";
        let url = resolve_gemini_endpoint(Some(full), "other").unwrap();
        assert_eq!(url.as_str(), full);
    }

    #[test]
    fn test_resolve_default_endpoint() {
        let url = resolve_gemini_endpoint(None, DEFAULT_GEMINI_MODEL).unwrap();
        assert!(url
            .as_str()
            .starts_with("https://generativelanguage.googleapis.com/v1beta/models/gemini-pro"));
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = resolve_gemini_endpoint(Some("not a url"), "m").unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ñandú", 2), "ña...");
    }

    #[test]
    fn test_candidate_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": " x**2 " }] } }]
        });
        assert_eq!(candidate_text(&body), "x**2");
        assert_eq!(candidate_text(&json!({ "candidates": [] })), "");
    }

    #[test]
    fn test_builder_rejects_blank_key() {
        let err = GeminiClient::builder("  ").build().unwrap_err();
        assert_eq!(err, LlmError::Config("missing API key".into()));
    }

    #[test]
    fn test_debug_output_hides_key() {
        let client = GeminiClient::new("SECRET-KEY-123", DEFAULT_GEMINI_MODEL).unwrap();
        assert!(!format!("{:?}", client).contains("SECRET-KEY-123"));
    }
}
