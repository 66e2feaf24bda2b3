//! Per-document coordinator.
//!
//! The analyzer owns the registry of open documents together with the two
//! behavioral trackers. Change events mutate tracker state synchronously;
//! analysis requests read it without modification and only suspend while the
//! two oracles answer.

use crate::config::AilintConfig;
use crate::events::{ChangeEvent, DocumentId, DocumentSnapshot};
use crate::fusion::{AnalysisResult, ComponentScores, EvidenceFuser, EvidenceHints};
use crate::monitors::{PasteBurstTracker, PasteEvent, TypingCadenceTracker, VelocitySummary};
use crate::oracle::{resolve_score, FingerprintHandle, MetadataHandle};
use log::{debug, info};
use std::collections::HashMap;

// ============================================================================
// Document registry
// ============================================================================

/// Bookkeeping for one open document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedDocument {
    /// Timestamp of the first change event, if any arrived yet.
    pub first_event_ms: Option<u64>,
    pub last_event_ms: Option<u64>,
    pub event_count: u64,
    pub paste_count: usize,
}

impl TrackedDocument {
    fn observe(&mut self, timestamp_ms: u64, captured_paste: bool) {
        self.first_event_ms.get_or_insert(timestamp_ms);
        self.last_event_ms = Some(
            self.last_event_ms
                .map_or(timestamp_ms, |last| last.max(timestamp_ms)),
        );
        self.event_count += 1;
        if captured_paste {
            self.paste_count += 1;
        }
    }
}

// ============================================================================
// Analyzer
// ============================================================================

pub struct Analyzer {
    documents: HashMap<DocumentId, TrackedDocument>,
    typing: TypingCadenceTracker,
    paste: PasteBurstTracker,
    fuser: EvidenceFuser,
    fingerprint: FingerprintHandle,
    metadata: MetadataHandle,
}

impl Analyzer {
    pub fn new(config: &AilintConfig, fingerprint: FingerprintHandle, metadata: MetadataHandle) -> Self {
        debug!(
            "analyzer: fingerprint oracle {}, metadata oracle {}",
            fingerprint.name(),
            metadata.name()
        );
        Self {
            documents: HashMap::new(),
            typing: TypingCadenceTracker::new(config.typing.clone()),
            paste: PasteBurstTracker::new(config.paste.clone()),
            fuser: EvidenceFuser::new(&config.fusion),
            fingerprint,
            metadata,
        }
    }

    /// Applies one change event, creating the document's state on first sight.
    pub fn record(&mut self, event: &ChangeEvent) {
        let document = &event.document;
        if !self.documents.contains_key(document) {
            info!("Tracking document {}", document);
        }

        self.typing.record_insertion(
            document,
            event.characters_added(),
            event.position,
            event.timestamp_ms,
        );
        let captured = self
            .paste
            .record_insertion(document, &event.text, event.timestamp_ms)
            .is_some();

        self.documents
            .entry(document.clone())
            .or_default()
            .observe(event.timestamp_ms, captured);
    }

    /// Starts tracking a document before any change arrives. Idempotent.
    pub fn open_document(&mut self, document: &DocumentId) -> bool {
        if self.documents.contains_key(document) {
            return false;
        }
        info!("Tracking document {}", document);
        self.documents.insert(document.clone(), TrackedDocument::default());
        true
    }

    /// Drops every piece of state held for the document.
    pub fn close_document(&mut self, document: &DocumentId) -> bool {
        let removed = self.documents.remove(document).is_some();
        self.typing.remove(document);
        self.paste.remove(document);
        if removed {
            info!("Stopped tracking document {}", document);
        }
        removed
    }

    pub fn is_tracked(&self, document: &DocumentId) -> bool {
        self.documents.contains_key(document)
    }

    /// Tracked documents in sorted order.
    pub fn tracked_documents(&self) -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> = self.documents.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn document(&self, document: &DocumentId) -> Option<&TrackedDocument> {
        self.documents.get(document)
    }

    pub fn velocity_summary(&self, document: &DocumentId) -> VelocitySummary {
        self.typing.summary(document)
    }

    pub fn paste_events(&self, document: &DocumentId) -> &[PasteEvent] {
        self.paste.events(document)
    }

    /// Behavioral scores only; the oracle components are left at 0.
    pub fn component_scores(&self, snapshot: &DocumentSnapshot) -> ComponentScores {
        ComponentScores::new(
            self.typing.anomaly_score(&snapshot.id),
            self.paste.score(&snapshot.id, snapshot.line_count()),
            0.0,
            0.0,
        )
    }

    /// Full analysis of a document. Oracle failures degrade to a neutral 0.
    pub async fn analyze(&self, snapshot: &DocumentSnapshot) -> AnalysisResult {
        let behavioral = self.component_scores(snapshot);
        let hints = EvidenceHints {
            external_tool_pastes: self.paste.external_tool_count(&snapshot.id),
        };

        let context = snapshot.metadata_context();
        let (fingerprint, metadata) = tokio::join!(
            self.fingerprint.score(&snapshot.text, &snapshot.language),
            self.metadata.score(&context),
        );

        let scores = ComponentScores {
            code_fingerprint: resolve_score(self.fingerprint.name(), fingerprint),
            metadata_correlation: resolve_score(self.metadata.name(), metadata),
            ..behavioral
        };

        let result = self.fuser.fuse_with_hints(scores, &hints);
        debug!(
            "analysis: {} confidence {:.3} ({})",
            snapshot.id, result.confidence, result.likelihood
        );
        result
    }
}
