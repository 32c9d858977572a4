//! Google Gemini oracle
//!
//! Sends the composed repair prompt to the `generateContent` endpoint and
//! returns the first candidate's text with markdown fences removed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{OracleError, Result};
use crate::oracle::RepairOracle;
use crate::prompt::{clean_response, compose_prompt};
use crate::request::RepairRequest;

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Gemini oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// API key; the oracle cannot be built without one
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Sampling temperature; provider default when unset
    pub temperature: Option<f32>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: None,
        }
    }
}

impl OracleConfig {
    /// Read `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_BASE_URL` and
    /// `GEMINI_TIMEOUT_SECS` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        OracleConfig {
            api_key: non_empty("GEMINI_API_KEY"),
            model: non_empty("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: non_empty("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout_secs: non_empty("GEMINI_TIMEOUT_SECS")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(defaults.timeout_secs),
            temperature: defaults.temperature,
        }
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn first_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .as_ref()?
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Gemini-backed [`RepairOracle`]
#[derive(Debug, Clone)]
pub struct GeminiOracle {
    config: OracleConfig,
    client: Client,
}

impl GeminiOracle {
    /// Build a client; fails when no API key is configured.
    pub fn new(config: OracleConfig) -> Result<Self> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(OracleError::NotConfigured(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("csp-repair/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.config.base_url, self.config.model)
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: self
                .config
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        };

        let url = self.endpoint();
        debug!(url = %url, model = %self.config.model, "sending repair prompt");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.as_deref().unwrap_or_default())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "oracle request failed");
            return Err(OracleError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)?;
        if let Some(usage) = &parsed.usage_metadata {
            info!(
                prompt_tokens = ?usage.prompt_token_count,
                response_tokens = ?usage.candidates_token_count,
                "oracle usage"
            );
        }
        if let Some(reason) = parsed.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            debug!(finish_reason = reason, "oracle candidate finished");
        }

        parsed.first_text().ok_or(OracleError::EmptyResponse)
    }

    fn classify(&self, err: reqwest::Error) -> OracleError {
        if err.is_timeout() {
            OracleError::Timeout {
                seconds: self.config.timeout_secs,
            }
        } else {
            OracleError::Http(err)
        }
    }
}

#[async_trait]
impl RepairOracle for GeminiOracle {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn propose(&self, request: &RepairRequest) -> Result<String> {
        let raw = self.generate(compose_prompt(request)).await?;
        let cleaned = clean_response(&raw);
        if cleaned.is_empty() {
            return Err(OracleError::EmptyResponse);
        }
        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = OracleConfig::from_lookup(lookup(&[]));
        assert!(config.api_key.is_none());
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_from_variables() {
        let config = OracleConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("GEMINI_BASE_URL", "http://localhost:9/models/"),
            ("GEMINI_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.base_url, "http://localhost:9/models");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_blank_key_is_unset() {
        let config = OracleConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")]));
        assert!(config.api_key.is_none());
        assert!(matches!(
            GeminiOracle::new(config),
            Err(OracleError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_endpoint_does_not_embed_key() {
        let oracle = GeminiOracle::new(OracleConfig::default().with_api_key("secret")).unwrap();
        let url = oracle.endpoint();
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(!url.contains("secret"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "hi".to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig { temperature: 0.5 }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_first_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"a{} "},{"text":"-> P()"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_text().as_deref(), Some("a{} -> P()"));
    }

    #[test]
    fn test_first_text_empty_candidates() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(response.first_text().is_none());
        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(blocked.first_text().is_none());
    }
}
