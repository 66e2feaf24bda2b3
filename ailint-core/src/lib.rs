pub mod analyzer;
pub mod config;
pub mod events;
pub mod fusion;
pub mod monitors;
pub mod notes;
pub mod oracle;

// Re-export common types
pub use crate::analyzer::{Analyzer, TrackedDocument};
pub use crate::config::{AilintConfig, ConfigError};
pub use crate::events::{ChangeEvent, DocumentId, DocumentSnapshot, MetadataContext, Position};
pub use crate::fusion::{AnalysisResult, ComponentScores, EvidenceFuser, Likelihood, Weights};
pub use crate::monitors::{PasteBurstTracker, PasteSource, TypingCadenceTracker, VelocitySummary};
pub use crate::notes::AnalysisNote;
pub use crate::oracle::{
    FingerprintHandle, FingerprintOracle, FixedOracle, MetadataHandle, MetadataOracle,
    OracleError, UnconfiguredOracle,
};
