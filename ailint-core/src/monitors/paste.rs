//! Paste burst tracking.
//!
//! Large contiguous insertions are logged per document and tagged with a
//! best-effort guess at where they came from. The score is the share of the
//! document that arrived through very large pastes.
//!
//! The log is kept for as long as the document is open; it is dropped with
//! the document, never pruned by age, because the ratio is taken against the
//! whole file.

use crate::config::PasteConfig;
use crate::events::DocumentId;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Insertions with more lines than this are logged.
pub const MIN_PASTE_LINES: usize = 10;

/// Logged pastes with more lines than this count toward the score.
pub const SUSPICIOUS_PASTE_LINES: usize = 100;

/// Share of the document arriving by suspicious pastes that saturates the score.
pub const TARGET_PASTE_RATIO: f64 = 0.3;

lazy_static! {
    /// Comment and docstring shapes typical of assistant-generated code.
    static ref AI_STYLE_PATTERNS: Vec<(&'static str, Regex)> = [
        ("helper_comment", r"(//|#)\s*Helper function to"),
        ("this_function_comment", r"(//|#)\s*This function"),
        ("args_returns_docstring", r#"(?s)""".*Args:.*Returns:"#),
    ]
    .into_iter()
    .filter_map(|(name, pat)| Regex::new(pat).ok().map(|re| (name, re)))
    .collect();
}

/// Where a paste most likely came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasteSource {
    Clipboard,
    ExternalTool,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for PasteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasteSource::Clipboard => write!(f, "clipboard"),
            PasteSource::ExternalTool => write!(f, "external-tool"),
            PasteSource::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasteEvent {
    pub timestamp_ms: u64,
    pub line_count: usize,
    pub text: String,
    pub source: PasteSource,
}

/// Number of `\n`-separated segments in an insertion.
pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

/// Names of the assistant-style patterns found in `text`.
pub fn ai_style_matches(text: &str) -> Vec<&'static str> {
    AI_STYLE_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| *name)
        .collect()
}

/// Binary guess: a pattern hit means an external tool, anything else the clipboard.
pub fn classify_source(text: &str) -> PasteSource {
    if AI_STYLE_PATTERNS.iter().any(|(_, re)| re.is_match(text)) {
        PasteSource::ExternalTool
    } else {
        PasteSource::Clipboard
    }
}

#[derive(Debug, Default)]
pub struct PasteBurstTracker {
    config: PasteConfig,
    logs: HashMap<DocumentId, Vec<PasteEvent>>,
}

impl PasteBurstTracker {
    pub fn new(config: PasteConfig) -> Self {
        Self {
            config,
            logs: HashMap::new(),
        }
    }

    /// Logs the insertion if it is large enough to be a paste.
    pub fn record_insertion(
        &mut self,
        document: &DocumentId,
        text: &str,
        now: u64,
    ) -> Option<PasteEvent> {
        let lines = line_count(text);
        if lines <= self.config.min_paste_lines {
            return None;
        }

        let entries = self.logs.entry(document.clone()).or_default();
        let timestamp_ms = entries
            .last()
            .map(|last| last.timestamp_ms.max(now))
            .unwrap_or(now);

        let event = PasteEvent {
            timestamp_ms,
            line_count: lines,
            text: text.to_string(),
            source: classify_source(text),
        };
        debug!(
            "paste: {} captured {} lines ({})",
            document, event.line_count, event.source
        );
        entries.push(event.clone());
        Some(event)
    }

    /// Share of `total_lines` that arrived through suspicious pastes, scaled
    /// so that [`TARGET_PASTE_RATIO`] saturates at 1.0.
    ///
    /// An empty document scores 0.
    pub fn score(&self, document: &DocumentId, total_lines: usize) -> f64 {
        if total_lines == 0 {
            return 0.0;
        }
        let pasted_lines = self.suspicious_lines(document);
        let ratio = pasted_lines as f64 / total_lines as f64;
        (ratio / self.config.target_ratio).clamp(0.0, 1.0)
    }

    pub fn suspicious_lines(&self, document: &DocumentId) -> usize {
        self.suspicious(document).map(|p| p.line_count).sum()
    }

    /// Suspicious-size pastes classified as coming from an external tool.
    pub fn external_tool_count(&self, document: &DocumentId) -> usize {
        self.suspicious(document)
            .filter(|p| p.source == PasteSource::ExternalTool)
            .count()
    }

    pub fn events(&self, document: &DocumentId) -> &[PasteEvent] {
        self.logs.get(document).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn remove(&mut self, document: &DocumentId) -> bool {
        self.logs.remove(document).is_some()
    }

    fn suspicious<'a>(&'a self, document: &DocumentId) -> impl Iterator<Item = &'a PasteEvent> {
        let threshold = self.config.suspicious_paste_lines;
        self.events(document)
            .iter()
            .filter(move |p| p.line_count > threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> DocumentId {
        DocumentId::new("app.py")
    }

    fn block(lines: usize) -> String {
        vec!["x = 1"; lines].join("\n")
    }

    #[test]
    fn test_small_insertions_are_not_logged() {
        let mut t = PasteBurstTracker::new(PasteConfig::default());
        assert!(t.record_insertion(&doc(), &block(10), 0).is_none());
        assert!(t.record_insertion(&doc(), "a", 1).is_none());
        assert!(t.events(&doc()).is_empty());

        let event = t.record_insertion(&doc(), &block(11), 2).unwrap();
        assert_eq!(event.line_count, 11);
        assert_eq!(event.source, PasteSource::Clipboard);
    }

    #[test]
    fn test_out_of_order_paste_is_clamped() {
        let mut t = PasteBurstTracker::new(PasteConfig::default());
        t.record_insertion(&doc(), &block(20), 5_000).unwrap();
        let late = t.record_insertion(&doc(), &block(30), 4_000).unwrap();
        assert_eq!(late.timestamp_ms, 5_000);

        let stamps: Vec<u64> = t.events(&doc()).iter().map(|p| p.timestamp_ms).collect();
        assert_eq!(stamps, vec![5_000, 5_000]);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_medium_pastes_do_not_score() {
        let mut t = PasteBurstTracker::new(PasteConfig::default());
        t.record_insertion(&doc(), &block(50), 0);
        t.record_insertion(&doc(), &block(100), 1);
        assert_eq!(t.events(&doc()).len(), 2);
        assert_eq!(t.score(&doc(), 200), 0.0);
    }

    #[test]
    fn test_large_paste_saturates() {
        let mut t = PasteBurstTracker::new(PasteConfig::default());
        t.record_insertion(&doc(), &block(400), 0);
        assert_eq!(t.score(&doc(), 1000), 1.0);
    }

    #[test]
    fn test_score_scales_with_ratio() {
        let mut t = PasteBurstTracker::new(PasteConfig::default());
        t.record_insertion(&doc(), &block(150), 0);
        // 150 / 1000 / 0.3
        assert!((t.score(&doc(), 1000) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_document_scores_zero() {
        let mut t = PasteBurstTracker::new(PasteConfig::default());
        t.record_insertion(&doc(), &block(400), 0);
        assert_eq!(t.score(&doc(), 0), 0.0);
        assert_eq!(t.score(&DocumentId::new("unseen.py"), 0), 0.0);
    }

    #[test]
    fn test_classify_source() {
        assert_eq!(
            classify_source("// Helper function to parse the header\nfn parse() {}"),
            PasteSource::ExternalTool
        );
        assert_eq!(
            classify_source("# This function returns the total\ndef total(): pass"),
            PasteSource::ExternalTool
        );
        let docstring = "def add(a, b):\n    \"\"\"Add numbers.\n\n    Args:\n        a: first\n\n    Returns:\n        Sum.\n    \"\"\"\n    return a + b";
        assert_eq!(classify_source(docstring), PasteSource::ExternalTool);
        assert_eq!(ai_style_matches(docstring), vec!["args_returns_docstring"]);

        assert_eq!(
            classify_source("fn main() {\n    println!(\"hi\");\n}"),
            PasteSource::Clipboard
        );
    }

    #[test]
    fn test_external_tool_count_only_counts_suspicious() {
        let mut t = PasteBurstTracker::new(PasteConfig::default());
        let styled = format!("// Helper function to do work\n{}", block(150));
        t.record_insertion(&doc(), &styled, 0);
        let small_styled = format!("// Helper function to do work\n{}", block(20));
        t.record_insertion(&doc(), &small_styled, 1);
        t.record_insertion(&doc(), &block(150), 2);

        assert_eq!(t.external_tool_count(&doc()), 1);
    }

    #[test]
    fn test_log_survives_until_removed() {
        let mut t = PasteBurstTracker::new(PasteConfig::default());
        t.record_insertion(&doc(), &block(200), 0);
        t.record_insertion(&doc(), &block(200), 3_600_000);
        assert_eq!(t.events(&doc()).len(), 2);

        assert!(t.remove(&doc()));
        assert!(t.events(&doc()).is_empty());
        assert!(!t.remove(&doc()));
    }

    #[test]
    fn test_source_tag_serde() {
        assert_eq!(
            serde_json::to_string(&PasteSource::ExternalTool).unwrap(),
            "\"external-tool\""
        );
        let tag: PasteSource = serde_json::from_str("\"chatbot\"").unwrap();
        assert_eq!(tag, PasteSource::Unknown);
    }
}
