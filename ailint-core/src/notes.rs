//! Version-control note payload.
//!
//! Hooks that annotate commits attach this compact JSON document. Writing it
//! into history is the hook's business.

use crate::fusion::{AnalysisResult, ComponentScores};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisNote {
    #[serde(rename = "version")]
    pub ailint_version: String,
    pub confidence: f64,
    pub components: ComponentScores,
    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

impl From<&AnalysisResult> for AnalysisNote {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            ailint_version: env!("CARGO_PKG_VERSION").to_string(),
            confidence: result.confidence,
            components: result.components,
            timestamp: result.timestamp.timestamp_millis(),
        }
    }
}

impl AnalysisNote {
    /// Single-line JSON encoding.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to encode analysis note")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to decode analysis note")
    }
}
