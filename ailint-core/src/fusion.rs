//! Weighted evidence fusion.
//!
//! Four component scores, each in [0, 1], are combined linearly:
//!
//!   fingerprint  0.40  structural classifier, the most direct signal
//!   paste        0.30  large human-absent insertions
//!   typing       0.20  velocity anomalies, corroborating
//!   metadata     0.10  repository correlation, corroborating
//!
//! The explanation is threshold driven and deterministic: each component above
//! [`REASON_THRESHOLD`] contributes one fixed reason string.

use crate::config::{ConfigError, FusionConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Constants
// =============================================================================

/// Component score above which a reason is named in the explanation.
pub const REASON_THRESHOLD: f64 = 0.6;

/// Confidence below this is a low likelihood.
pub const MEDIUM_LIKELIHOOD_FLOOR: f64 = 0.3;

/// Confidence at or above this is a high likelihood.
pub const HIGH_LIKELIHOOD_FLOOR: f64 = 0.7;

pub const TYPING_REASON: &str = "Unusually high typing velocity detected";
pub const PASTE_REASON: &str = "Large paste events detected";
pub const FINGERPRINT_REASON: &str = "Code structure matches known AI patterns";
pub const METADATA_REASON: &str = "Repository metadata correlates with AI tooling";

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

// =============================================================================
// Types
// =============================================================================

/// Fusion coefficients. Must be non-negative and sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub typing: f64,
    pub paste: f64,
    pub fingerprint: f64,
    pub metadata: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            typing: 0.20,
            paste: 0.30,
            fingerprint: 0.40,
            metadata: 0.10,
        }
    }
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.typing + self.paste + self.fingerprint + self.metadata
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("typing", self.typing),
            ("paste", self.paste),
            ("fingerprint", self.fingerprint),
            ("metadata", self.metadata),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::NegativeWeight { name, value });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(sum));
        }
        Ok(())
    }
}

/// The four weighted sub-signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScores {
    pub typing_anomaly: f64,
    pub paste_pattern: f64,
    pub code_fingerprint: f64,
    pub metadata_correlation: f64,
}

impl ComponentScores {
    pub fn new(typing: f64, paste: f64, fingerprint: f64, metadata: f64) -> Self {
        Self {
            typing_anomaly: typing,
            paste_pattern: paste,
            code_fingerprint: fingerprint,
            metadata_correlation: metadata,
        }
    }

    /// Every score forced into [0, 1]; NaN becomes 0.
    pub fn clamped(&self) -> Self {
        Self {
            typing_anomaly: clamp_unit(self.typing_anomaly),
            paste_pattern: clamp_unit(self.paste_pattern),
            code_fingerprint: clamp_unit(self.code_fingerprint),
            metadata_correlation: clamp_unit(self.metadata_correlation),
        }
    }
}

/// Coarse reading of a confidence value for status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Likelihood {
    #[default]
    Low,
    Medium,
    High,
}

impl Likelihood {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence < MEDIUM_LIKELIHOOD_FLOOR {
            Likelihood::Low
        } else if confidence < HIGH_LIKELIHOOD_FLOOR {
            Likelihood::Medium
        } else {
            Likelihood::High
        }
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Likelihood::Low => write!(f, "low"),
            Likelihood::Medium => write!(f, "medium"),
            Likelihood::High => write!(f, "high"),
        }
    }
}

/// Outcome of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Estimated probability of AI assistance, in [0, 1].
    pub confidence: f64,
    pub components: ComponentScores,
    pub explanation: String,
    pub timestamp: DateTime<Utc>,
    pub likelihood: Likelihood,
}

impl AnalysisResult {
    /// Confidence as a rounded whole percentage.
    pub fn percentage(&self) -> i64 {
        percentage(self.confidence)
    }
}

/// Side information that shapes explanation wording but never the number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvidenceHints {
    /// Suspicious pastes whose comments look assistant-written.
    pub external_tool_pastes: usize,
}

// =============================================================================
// Fuser
// =============================================================================

/// Stateless combiner of component scores.
#[derive(Debug, Clone)]
pub struct EvidenceFuser {
    weights: Weights,
    reason_threshold: f64,
    explain_metadata: bool,
}

impl Default for EvidenceFuser {
    fn default() -> Self {
        Self::new(&FusionConfig::default())
    }
}

impl EvidenceFuser {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            weights: config.weights,
            reason_threshold: config.reason_threshold,
            explain_metadata: config.explain_metadata,
        }
    }

    pub fn fuse(&self, typing: f64, paste: f64, fingerprint: f64, metadata: f64) -> AnalysisResult {
        self.fuse_with_hints(
            ComponentScores::new(typing, paste, fingerprint, metadata),
            &EvidenceHints::default(),
        )
    }

    pub fn fuse_with_hints(&self, scores: ComponentScores, hints: &EvidenceHints) -> AnalysisResult {
        let components = scores.clamped();
        let confidence = self.confidence(&components);

        AnalysisResult {
            confidence,
            components,
            explanation: self.explain(confidence, &components, hints),
            timestamp: Utc::now(),
            likelihood: Likelihood::from_confidence(confidence),
        }
    }

    /// Weighted linear sum, clamped to [0, 1]. No rounding.
    pub fn confidence(&self, scores: &ComponentScores) -> f64 {
        let w = &self.weights;
        clamp_unit(
            scores.typing_anomaly * w.typing
                + scores.paste_pattern * w.paste
                + scores.code_fingerprint * w.fingerprint
                + scores.metadata_correlation * w.metadata,
        )
    }

    pub fn explain(&self, confidence: f64, scores: &ComponentScores, hints: &EvidenceHints) -> String {
        let mut reasons: Vec<String> = Vec::new();

        if scores.typing_anomaly > self.reason_threshold {
            reasons.push(TYPING_REASON.to_string());
        }
        if scores.paste_pattern > self.reason_threshold {
            match hints.external_tool_pastes {
                0 => reasons.push(PASTE_REASON.to_string()),
                1 => reasons.push(format!("{PASTE_REASON} (AI-style comments in 1 paste)")),
                n => reasons.push(format!("{PASTE_REASON} (AI-style comments in {n} pastes)")),
            }
        }
        if scores.code_fingerprint > self.reason_threshold {
            reasons.push(FINGERPRINT_REASON.to_string());
        }
        if self.explain_metadata && scores.metadata_correlation > self.reason_threshold {
            reasons.push(METADATA_REASON.to_string());
        }

        let pct = percentage(confidence);
        if reasons.is_empty() {
            return format!("Low AI likelihood ({pct}%)");
        }
        format!("Potentially AI-influenced ({pct}%): {}", reasons.join(", "))
    }
}

/// Forces a score into [0, 1]; NaN carries no evidence and becomes 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn percentage(confidence: f64) -> i64 {
    (confidence * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuser() -> EvidenceFuser {
        EvidenceFuser::default()
    }

    #[test]
    fn test_all_zero() {
        let result = fuser().fuse(0.0, 0.0, 0.0, 0.0);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.explanation, "Low AI likelihood (0%)");
        assert_eq!(result.likelihood, Likelihood::Low);
    }

    #[test]
    fn test_fingerprint_only() {
        let result = fuser().fuse(0.0, 0.0, 1.0, 0.0);
        assert!((result.confidence - 0.40).abs() < 1e-12);
        assert_eq!(
            result.explanation,
            "Potentially AI-influenced (40%): Code structure matches known AI patterns"
        );
        assert_eq!(result.likelihood, Likelihood::Medium);
    }

    #[test]
    fn test_confidence_is_exact_weighted_sum() {
        let steps = [0.0, 0.1, 0.35, 0.6, 0.61, 0.9, 1.0];
        for &t in &steps {
            for &p in &steps {
                for &f in &steps {
                    for &m in &steps {
                        let result = fuser().fuse(t, p, f, m);
                        let expected = t * 0.2 + p * 0.3 + f * 0.4 + m * 0.1;
                        assert!((0.0..=1.0).contains(&result.confidence));
                        assert!((result.confidence - expected.min(1.0)).abs() < 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_reason_phrases_track_thresholds() {
        let steps = [0.0, 0.6, 0.61, 1.0];
        for &t in &steps {
            for &p in &steps {
                for &f in &steps {
                    let text = fuser().fuse(t, p, f, 1.0).explanation;
                    assert_eq!(text.contains(TYPING_REASON), t > 0.6);
                    assert_eq!(text.contains(PASTE_REASON), p > 0.6);
                    assert_eq!(text.contains(FINGERPRINT_REASON), f > 0.6);
                    assert_eq!(
                        text.starts_with("Low AI likelihood"),
                        t <= 0.6 && p <= 0.6 && f <= 0.6
                    );
                }
            }
        }
    }

    #[test]
    fn test_reasons_are_ordered_and_comma_joined() {
        let result = fuser().fuse(1.0, 1.0, 1.0, 0.0);
        assert_eq!(
            result.explanation,
            "Potentially AI-influenced (90%): Unusually high typing velocity detected, \
             Large paste events detected, Code structure matches known AI patterns"
        );
        assert_eq!(result.likelihood, Likelihood::High);
    }

    #[test]
    fn test_metadata_is_scoring_only_by_default() {
        let result = fuser().fuse(0.0, 0.0, 0.0, 1.0);
        assert!((result.confidence - 0.1).abs() < 1e-12);
        assert_eq!(result.explanation, "Low AI likelihood (10%)");

        let explaining = EvidenceFuser::new(&FusionConfig {
            explain_metadata: true,
            ..FusionConfig::default()
        });
        let result = explaining.fuse(0.0, 0.0, 0.0, 1.0);
        assert_eq!(
            result.explanation,
            "Potentially AI-influenced (10%): Repository metadata correlates with AI tooling"
        );
    }

    #[test]
    fn test_malformed_inputs_are_clamped() {
        let result = fuser().fuse(7.0, -3.0, f64::NAN, 1.5);
        assert_eq!(result.components.typing_anomaly, 1.0);
        assert_eq!(result.components.paste_pattern, 0.0);
        assert_eq!(result.components.code_fingerprint, 0.0);
        assert_eq!(result.components.metadata_correlation, 1.0);
        assert!((result.confidence - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_saturated_inputs_clamp_output() {
        let result = fuser().fuse(1.0, 1.0, 1.0, 1.0);
        assert!(result.confidence <= 1.0);
        assert_eq!(result.percentage(), 100);
    }

    #[test]
    fn test_external_tool_hint_only_changes_wording() {
        let scores = ComponentScores::new(0.0, 1.0, 0.0, 0.0);
        let plain = fuser().fuse_with_hints(scores, &EvidenceHints::default());
        let hinted = fuser().fuse_with_hints(
            scores,
            &EvidenceHints {
                external_tool_pastes: 2,
            },
        );
        assert_eq!(plain.confidence, hinted.confidence);
        assert_eq!(
            hinted.explanation,
            "Potentially AI-influenced (30%): Large paste events detected (AI-style comments in 2 pastes)"
        );

        let below = fuser().fuse_with_hints(
            ComponentScores::new(0.0, 0.5, 0.0, 0.0),
            &EvidenceHints {
                external_tool_pastes: 1,
            },
        );
        assert_eq!(below.explanation, "Low AI likelihood (15%)");
    }

    #[test]
    fn test_weights_validation() {
        assert!(Weights::default().validate().is_ok());
        assert!((Weights::default().sum() - 1.0).abs() < 1e-9);

        let heavy = Weights {
            fingerprint: 0.5,
            ..Weights::default()
        };
        assert!(matches!(heavy.validate(), Err(ConfigError::WeightSum(_))));

        let negative = Weights {
            typing: -0.1,
            paste: 0.6,
            ..Weights::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::NegativeWeight { name: "typing", .. })
        ));
    }

    #[test]
    fn test_likelihood_tiers() {
        assert_eq!(Likelihood::from_confidence(0.0), Likelihood::Low);
        assert_eq!(Likelihood::from_confidence(0.29), Likelihood::Low);
        assert_eq!(Likelihood::from_confidence(0.3), Likelihood::Medium);
        assert_eq!(Likelihood::from_confidence(0.69), Likelihood::Medium);
        assert_eq!(Likelihood::from_confidence(0.7), Likelihood::High);
        assert_eq!(Likelihood::High.to_string(), "high");
    }

    #[test]
    fn test_component_names_serialize_camel_case() {
        let json = serde_json::to_value(ComponentScores::new(0.1, 0.2, 0.3, 0.4)).unwrap();
        assert_eq!(json["typingAnomaly"], 0.1);
        assert_eq!(json["metadataCorrelation"], 0.4);
    }
}
