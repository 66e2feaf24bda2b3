//! Typing cadence tracking.
//!
//! Keeps a short rolling window of insertions per document and stamps each
//! new insertion with the character velocity of the window it landed in.
//! Sustained rates above [`SUSPICIOUS_VELOCITY`] are not plausible for a
//! human typist and count as anomalous bursts.

use crate::config::TypingConfig;
use crate::events::{DocumentId, Position};
use log::debug;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::{HashMap, VecDeque};

// =============================================================================
// Constants
// =============================================================================

/// Live velocity window in milliseconds.
pub const WINDOW_SIZE_MS: u64 = 5000;

/// Characters per second above which an insertion is anomalous.
pub const SUSPICIOUS_VELOCITY: f64 = 500.0;

/// Anomalous insertions needed to saturate the score.
pub const SATURATION_COUNT: usize = 10;

// =============================================================================
// Types
// =============================================================================

/// One recorded insertion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypingEvent {
    pub timestamp_ms: u64,
    pub characters_added: usize,
    pub position: Position,
    /// Characters per second over the window at insertion time.
    pub velocity: f64,
}

/// Velocity statistics over a document's retained history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocitySummary {
    pub event_count: usize,
    pub suspicious_count: usize,
    /// Mean velocity in characters per second.
    pub mean_velocity: f64,
    /// Highest velocity observed in characters per second.
    pub peak_velocity: f64,
}

/// Per-document rolling windows of insertions.
#[derive(Debug, Default)]
pub struct TypingCadenceTracker {
    config: TypingConfig,
    windows: HashMap<DocumentId, VecDeque<TypingEvent>>,
}

impl TypingCadenceTracker {
    pub fn new(config: TypingConfig) -> Self {
        Self {
            config,
            windows: HashMap::new(),
        }
    }

    /// Appends an insertion and prunes events older than twice the window.
    pub fn record_insertion(
        &mut self,
        document: &DocumentId,
        characters_added: usize,
        position: Position,
        now: u64,
    ) -> TypingEvent {
        let window_ms = self.config.window_ms;
        let window = self.windows.entry(document.clone()).or_default();

        let now = match window.back() {
            Some(last) if now < last.timestamp_ms => {
                debug!(
                    "typing: {} timestamp {} precedes {}, clamping",
                    document, now, last.timestamp_ms
                );
                last.timestamp_ms
            }
            _ => now,
        };

        let event = TypingEvent {
            timestamp_ms: now,
            characters_added,
            position,
            velocity: window_velocity(window, characters_added, now, window_ms),
        };
        window.push_back(event);

        let horizon = window_ms.saturating_mul(2);
        let before = window.len();
        while let Some(front) = window.front() {
            if now - front.timestamp_ms < horizon {
                break;
            }
            window.pop_front();
        }
        if window.len() < before {
            debug!("typing: {} pruned {} events", document, before - window.len());
        }

        event
    }

    /// Saturating share of anomalously fast insertions in the retained history.
    ///
    /// Unknown documents score 0.
    pub fn anomaly_score(&self, document: &DocumentId) -> f64 {
        let count = self.suspicious_count(document);
        (count as f64 / self.config.saturation_count.max(1) as f64).min(1.0)
    }

    pub fn suspicious_count(&self, document: &DocumentId) -> usize {
        self.windows
            .get(document)
            .map(|w| {
                w.iter()
                    .filter(|e| e.velocity > self.config.suspicious_velocity)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn summary(&self, document: &DocumentId) -> VelocitySummary {
        let Some(window) = self.windows.get(document) else {
            return VelocitySummary::default();
        };
        if window.is_empty() {
            return VelocitySummary::default();
        }

        let velocities: Vec<f64> = window.iter().map(|e| e.velocity).collect();
        VelocitySummary {
            event_count: velocities.len(),
            suspicious_count: self.suspicious_count(document),
            mean_velocity: velocities.iter().mean(),
            peak_velocity: velocities.iter().cloned().fold(0.0, f64::max),
        }
    }

    /// Retained events for a document, oldest first.
    pub fn events(&self, document: &DocumentId) -> Vec<TypingEvent> {
        self.windows
            .get(document)
            .map(|w| w.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn remove(&mut self, document: &DocumentId) -> bool {
        self.windows.remove(document).is_some()
    }
}

/// Characters per second across the live window, counting the new insertion.
///
/// The first insertion of a burst has nothing to measure against and is 0.
fn window_velocity(
    window: &VecDeque<TypingEvent>,
    characters_added: usize,
    now: u64,
    window_ms: u64,
) -> f64 {
    let mut recent = window
        .iter()
        .filter(|e| now - e.timestamp_ms < window_ms)
        .peekable();

    let Some(oldest) = recent.peek().map(|e| e.timestamp_ms) else {
        return 0.0;
    };

    let total_chars: usize = recent.map(|e| e.characters_added).sum::<usize>() + characters_added;
    // Same-millisecond bursts are as fast as we can measure.
    let elapsed_ms = (now - oldest).max(1);

    total_chars as f64 / elapsed_ms as f64 * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> DocumentId {
        DocumentId::new("src/main.rs")
    }

    fn tracker() -> TypingCadenceTracker {
        TypingCadenceTracker::new(TypingConfig::default())
    }

    #[test]
    fn test_first_insertion_has_zero_velocity() {
        let mut t = tracker();
        let event = t.record_insertion(&doc(), 400, Position::default(), 1_000);
        assert_eq!(event.velocity, 0.0);
        assert_eq!(t.anomaly_score(&doc()), 0.0);
    }

    #[test]
    fn test_velocity_counts_window_and_new_insertion() {
        let mut t = tracker();
        t.record_insertion(&doc(), 1, Position::default(), 0);
        t.record_insertion(&doc(), 1, Position::default(), 500);
        let event = t.record_insertion(&doc(), 2, Position::default(), 1_000);

        // 1 + 1 + 2 chars over 1000ms
        assert!((event.velocity - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_old_events_fall_out_of_velocity_window() {
        let mut t = tracker();
        t.record_insertion(&doc(), 1_000, Position::default(), 0);
        t.record_insertion(&doc(), 5, Position::default(), 6_000);
        let event = t.record_insertion(&doc(), 5, Position::default(), 7_000);

        // Only the 6_000 event is inside the 5s window.
        assert!((event.velocity - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_event_exactly_one_window_old_is_excluded() {
        let mut t = tracker();
        t.record_insertion(&doc(), 1_000, Position::default(), 0);
        let event = t.record_insertion(&doc(), 5, Position::default(), WINDOW_SIZE_MS);
        assert_eq!(event.velocity, 0.0);
    }

    #[test]
    fn test_prunes_beyond_twice_the_window() {
        let mut t = tracker();
        t.record_insertion(&doc(), 1, Position::default(), 0);
        t.record_insertion(&doc(), 1, Position::default(), 4_000);
        t.record_insertion(&doc(), 1, Position::default(), 10_000);

        let kept: Vec<u64> = t.events(&doc()).iter().map(|e| e.timestamp_ms).collect();
        assert_eq!(kept, vec![4_000, 10_000]);
    }

    #[test]
    fn test_score_is_linear_then_saturates() {
        let mut t = tracker();
        t.record_insertion(&doc(), 50, Position::default(), 0);

        let mut previous = 0.0;
        for i in 1..=12u64 {
            let event = t.record_insertion(&doc(), 50, Position::default(), i * 10);
            assert!(event.velocity > SUSPICIOUS_VELOCITY);

            let score = t.anomaly_score(&doc());
            assert!(score >= previous);
            assert!((score - (i as f64 / 10.0).min(1.0)).abs() < 1e-9);
            previous = score;
        }
        assert_eq!(t.anomaly_score(&doc()), 1.0);
    }

    #[test]
    fn test_same_millisecond_burst_is_suspicious() {
        let mut t = tracker();
        t.record_insertion(&doc(), 3, Position::default(), 2_000);
        let event = t.record_insertion(&doc(), 3, Position::default(), 2_000);
        assert!(event.velocity.is_finite());
        assert!(event.velocity > SUSPICIOUS_VELOCITY);
    }

    #[test]
    fn test_out_of_order_timestamp_is_clamped() {
        let mut t = tracker();
        t.record_insertion(&doc(), 1, Position::default(), 5_000);
        let event = t.record_insertion(&doc(), 1, Position::default(), 4_000);
        assert_eq!(event.timestamp_ms, 5_000);

        let stamps: Vec<u64> = t.events(&doc()).iter().map(|e| e.timestamp_ms).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_human_typing_stays_clean() {
        let mut t = tracker();
        // ~6 chars/sec
        for i in 0..200u64 {
            t.record_insertion(&doc(), 1, Position::new(0, i as u32), i * 160);
        }
        assert_eq!(t.anomaly_score(&doc()), 0.0);

        let summary = t.summary(&doc());
        assert_eq!(summary.suspicious_count, 0);
        assert!(summary.peak_velocity < SUSPICIOUS_VELOCITY);
        assert!(summary.mean_velocity > 0.0);
    }

    #[test]
    fn test_documents_are_isolated() {
        let mut t = tracker();
        let other = DocumentId::new("src/lib.rs");
        t.record_insertion(&doc(), 10, Position::default(), 0);
        for i in 1..=5u64 {
            t.record_insertion(&doc(), 100, Position::default(), i);
        }
        assert!(t.anomaly_score(&doc()) > 0.0);
        assert_eq!(t.anomaly_score(&other), 0.0);
        assert_eq!(t.summary(&other), VelocitySummary::default());

        assert!(t.remove(&doc()));
        assert_eq!(t.anomaly_score(&doc()), 0.0);
    }
}
