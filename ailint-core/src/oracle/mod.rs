//! External scoring oracles.
//!
//! Both collaborators answer with a likelihood in [0, 1]. Their failures are
//! never analysis failures: [`resolve_score`] turns any error into a neutral
//! 0 and clamps stray values.

mod http;
mod types;

pub use http::{parse_score, HttpFingerprintOracle, HttpMetadataOracle};
pub use types::OracleError;

use crate::config::OracleConfig;
use crate::events::MetadataContext;
use crate::fusion::clamp_unit;
use async_trait::async_trait;
use std::sync::Arc;

pub const FINGERPRINT_URL_ENV: &str = "AILINT_FINGERPRINT_URL";
pub const METADATA_URL_ENV: &str = "AILINT_METADATA_URL";
pub const API_KEY_ENV: &str = "AILINT_ORACLE_API_KEY";

/// Scores source text for structural resemblance to assistant output.
#[async_trait]
pub trait FingerprintOracle: Send + Sync {
    fn name(&self) -> &str;
    async fn score(&self, text: &str, language: &str) -> Result<f64, OracleError>;
}

/// Scores repository / version-control context.
#[async_trait]
pub trait MetadataOracle: Send + Sync {
    fn name(&self) -> &str;
    async fn score(&self, context: &MetadataContext) -> Result<f64, OracleError>;
}

pub type FingerprintHandle = Arc<dyn FingerprintOracle>;
pub type MetadataHandle = Arc<dyn MetadataOracle>;

/// Applies the unavailable-signal policy to an oracle answer.
pub fn resolve_score(oracle: &str, result: Result<f64, OracleError>) -> f64 {
    match result {
        Ok(score) => clamp_unit(score),
        Err(OracleError::NotConfigured) => {
            log::debug!("Oracle {oracle} not configured, using neutral score");
            0.0
        }
        Err(e) => {
            log::warn!("Oracle {oracle} failed: {e}");
            0.0
        }
    }
}

/// Stand-in for a collaborator that is not wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredOracle;

#[async_trait]
impl FingerprintOracle for UnconfiguredOracle {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn score(&self, _text: &str, _language: &str) -> Result<f64, OracleError> {
        Err(OracleError::NotConfigured)
    }
}

#[async_trait]
impl MetadataOracle for UnconfiguredOracle {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn score(&self, _context: &MetadataContext) -> Result<f64, OracleError> {
        Err(OracleError::NotConfigured)
    }
}

/// Always answers with the same score.
#[derive(Debug, Clone, Copy)]
pub struct FixedOracle(pub f64);

#[async_trait]
impl FingerprintOracle for FixedOracle {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn score(&self, _text: &str, _language: &str) -> Result<f64, OracleError> {
        Ok(self.0)
    }
}

#[async_trait]
impl MetadataOracle for FixedOracle {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn score(&self, _context: &MetadataContext) -> Result<f64, OracleError> {
        Ok(self.0)
    }
}

/// HTTP fingerprint oracle from config, then environment; otherwise unconfigured.
pub fn fingerprint_from_config(config: &OracleConfig) -> FingerprintHandle {
    let built = match config.fingerprint_url.clone() {
        Some(endpoint) => HttpFingerprintOracle::new(
            endpoint,
            std::env::var(API_KEY_ENV).ok(),
            config.timeout_secs,
        ),
        None => HttpFingerprintOracle::from_env(config.timeout_secs),
    };

    match built {
        Ok(oracle) => Arc::new(oracle),
        Err(OracleError::NotConfigured) => Arc::new(UnconfiguredOracle),
        Err(e) => {
            log::warn!("Fingerprint oracle unavailable: {e}");
            Arc::new(UnconfiguredOracle)
        }
    }
}

/// HTTP metadata oracle from config, then environment; otherwise unconfigured.
pub fn metadata_from_config(config: &OracleConfig) -> MetadataHandle {
    let built = match config.metadata_url.clone() {
        Some(endpoint) => HttpMetadataOracle::new(
            endpoint,
            std::env::var(API_KEY_ENV).ok(),
            config.timeout_secs,
        ),
        None => HttpMetadataOracle::from_env(config.timeout_secs),
    };

    match built {
        Ok(oracle) => Arc::new(oracle),
        Err(OracleError::NotConfigured) => Arc::new(UnconfiguredOracle),
        Err(e) => {
            log::warn!("Metadata oracle unavailable: {e}");
            Arc::new(UnconfiguredOracle)
        }
    }
}
