use super::{FingerprintOracle, MetadataOracle, OracleError};
use crate::events::MetadataContext;
use async_trait::async_trait;
use std::time::Duration;

/// JSON-over-HTTP client shared by both oracle kinds.
///
/// Request bodies are POSTed as JSON; the answer is `{"score": number}` or
/// `{"error": string}`.
struct JsonEndpoint {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl JsonEndpoint {
    fn new(endpoint: String, api_key: Option<String>, timeout_secs: u64) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }

    async fn post_json(&self, body: serde_json::Value) -> Result<f64, OracleError> {
        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Remote(format!("HTTP {status}")));
        }

        let value: serde_json::Value = response.json().await?;
        parse_score(&value)
    }
}

/// Extracts the score from an oracle response body.
pub fn parse_score(value: &serde_json::Value) -> Result<f64, OracleError> {
    if let Some(error) = value.get("error") {
        if !error.is_null() {
            let message = error
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(OracleError::Remote(message));
        }
    }

    value
        .get("score")
        .and_then(|s| s.as_f64())
        .ok_or_else(|| OracleError::InvalidResponse(format!("missing numeric score in {value}")))
}

pub struct HttpFingerprintOracle {
    inner: JsonEndpoint,
}

impl HttpFingerprintOracle {
    pub fn new(endpoint: String, api_key: Option<String>, timeout_secs: u64) -> Result<Self, OracleError> {
        Ok(Self {
            inner: JsonEndpoint::new(endpoint, api_key, timeout_secs)?,
        })
    }

    /// Endpoint from `AILINT_FINGERPRINT_URL`, key from `AILINT_ORACLE_API_KEY`.
    pub fn from_env(timeout_secs: u64) -> Result<Self, OracleError> {
        let endpoint =
            std::env::var(super::FINGERPRINT_URL_ENV).map_err(|_| OracleError::NotConfigured)?;
        let api_key = std::env::var(super::API_KEY_ENV).ok();
        Self::new(endpoint, api_key, timeout_secs)
    }
}

#[async_trait]
impl FingerprintOracle for HttpFingerprintOracle {
    fn name(&self) -> &str {
        "http-fingerprint"
    }

    async fn score(&self, text: &str, language: &str) -> Result<f64, OracleError> {
        self.inner
            .post_json(serde_json::json!({
                "text": text,
                "language": language,
            }))
            .await
    }
}

pub struct HttpMetadataOracle {
    inner: JsonEndpoint,
}

impl HttpMetadataOracle {
    pub fn new(endpoint: String, api_key: Option<String>, timeout_secs: u64) -> Result<Self, OracleError> {
        Ok(Self {
            inner: JsonEndpoint::new(endpoint, api_key, timeout_secs)?,
        })
    }

    /// Endpoint from `AILINT_METADATA_URL`, key from `AILINT_ORACLE_API_KEY`.
    pub fn from_env(timeout_secs: u64) -> Result<Self, OracleError> {
        let endpoint =
            std::env::var(super::METADATA_URL_ENV).map_err(|_| OracleError::NotConfigured)?;
        let api_key = std::env::var(super::API_KEY_ENV).ok();
        Self::new(endpoint, api_key, timeout_secs)
    }
}

#[async_trait]
impl MetadataOracle for HttpMetadataOracle {
    fn name(&self) -> &str {
        "http-metadata"
    }

    async fn score(&self, context: &MetadataContext) -> Result<f64, OracleError> {
        self.inner
            .post_json(serde_json::json!({
                "document": context.document,
                "workspace_root": context.workspace_root,
            }))
            .await
    }
}
