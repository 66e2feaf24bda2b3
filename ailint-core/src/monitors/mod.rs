//! Behavioral trackers fed by document change events.

pub mod paste;
pub mod typing;

pub use paste::{classify_source, PasteBurstTracker, PasteEvent, PasteSource};
pub use typing::{TypingCadenceTracker, TypingEvent, VelocitySummary};
