//! Host-facing event and snapshot types.
//!
//! A host adapter (editor extension, replay tool) translates its own change
//! notifications into [`ChangeEvent`]s and hands the analyzer a
//! [`DocumentSnapshot`] when it wants a verdict.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identity of an open document (a path or URI, as the host names it).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Zero-based insertion position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// One text insertion as delivered by the host.
///
/// Serialized one object per line when a host logs a session for replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub document: DocumentId,
    /// Monotonic milliseconds.
    pub timestamp_ms: u64,
    #[serde(default)]
    pub position: Position,
    /// Inserted text; empty for a pure deletion.
    #[serde(default)]
    pub text: String,
}

impl ChangeEvent {
    pub fn new(
        document: impl Into<DocumentId>,
        timestamp_ms: u64,
        position: Position,
        text: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            timestamp_ms,
            position,
            text: text.into(),
        }
    }

    /// Number of characters this change adds.
    pub fn characters_added(&self) -> usize {
        self.text.chars().count()
    }
}

/// What an analysis request reads from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub id: DocumentId,
    /// Language tag passed through to the fingerprint oracle.
    pub language: String,
    pub text: String,
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
}

impl DocumentSnapshot {
    pub fn new(id: impl Into<DocumentId>, language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            language: language.into(),
            text: text.into(),
            workspace_root: None,
        }
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Line count as an editor reports it. An empty document has no lines.
    pub fn line_count(&self) -> usize {
        if self.text.is_empty() {
            0
        } else {
            self.text.split('\n').count()
        }
    }

    pub fn metadata_context(&self) -> MetadataContext {
        MetadataContext {
            document: self.id.clone(),
            workspace_root: self.workspace_root.clone(),
        }
    }
}

/// Input of the metadata oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataContext {
    pub document: DocumentId,
    pub workspace_root: Option<PathBuf>,
}
