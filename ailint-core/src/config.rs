use crate::fusion::{Weights, REASON_THRESHOLD};
use crate::monitors::paste::{MIN_PASTE_LINES, SUSPICIOUS_PASTE_LINES, TARGET_PASTE_RATIO};
use crate::monitors::typing::{SATURATION_COUNT, SUSPICIOUS_VELOCITY, WINDOW_SIZE_MS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "ailint.json";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("config: fusion weight {name} is negative ({value})")]
    NegativeWeight { name: &'static str, value: f64 },
    #[error("config: fusion weights sum to {0}, expected 1.0")]
    WeightSum(f64),
    #[error("config: typing window must be positive")]
    EmptyWindow,
    #[error("config: typing saturation count must be positive")]
    ZeroSaturation,
    #[error("config: suspicious paste lines ({suspicious}) below capture threshold ({capture})")]
    PasteThresholds { capture: usize, suspicious: usize },
    #[error("config: {0} is out of range")]
    OutOfRange(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AilintConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub typing: TypingConfig,

    #[serde(default)]
    pub paste: PasteConfig,

    #[serde(default)]
    pub fusion: FusionConfig,

    #[serde(default)]
    pub oracles: OracleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingConfig {
    #[serde(default = "default_window")]
    pub window_ms: u64,
    /// Characters per second above which an insertion counts as anomalous.
    #[serde(default = "default_velocity")]
    pub suspicious_velocity: f64,
    /// Number of anomalous insertions that saturates the score.
    #[serde(default = "default_saturation")]
    pub saturation_count: usize,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window(),
            suspicious_velocity: default_velocity(),
            saturation_count: default_saturation(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasteConfig {
    /// Insertions with more lines than this are logged as pastes.
    #[serde(default = "default_min_paste")]
    pub min_paste_lines: usize,
    /// Pastes with more lines than this count toward the score.
    #[serde(default = "default_suspicious_paste")]
    pub suspicious_paste_lines: usize,
    /// Share of the document that saturates the score.
    #[serde(default = "default_target_ratio")]
    pub target_ratio: f64,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            min_paste_lines: default_min_paste(),
            suspicious_paste_lines: default_suspicious_paste(),
            target_ratio: default_target_ratio(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub weights: Weights,
    #[serde(default = "default_reason_threshold")]
    pub reason_threshold: f64,
    /// Name metadata correlation in explanations. Off: metadata only moves the number.
    #[serde(default)]
    pub explain_metadata: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            reason_threshold: default_reason_threshold(),
            explain_metadata: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub fingerprint_url: Option<String>,
    #[serde(default)]
    pub metadata_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            fingerprint_url: None,
            metadata_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

// Defaults
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".ailint"))
        .unwrap_or_else(|| PathBuf::from(".ailint"))
}
fn default_window() -> u64 {
    WINDOW_SIZE_MS
}
fn default_velocity() -> f64 {
    SUSPICIOUS_VELOCITY
}
fn default_saturation() -> usize {
    SATURATION_COUNT
}
fn default_min_paste() -> usize {
    MIN_PASTE_LINES
}
fn default_suspicious_paste() -> usize {
    SUSPICIOUS_PASTE_LINES
}
fn default_target_ratio() -> f64 {
    TARGET_PASTE_RATIO
}
fn default_reason_threshold() -> f64 {
    REASON_THRESHOLD
}
fn default_timeout() -> u64 {
    10
}

impl Default for AilintConfig {
    fn default() -> Self {
        Self::default_with_dir(&default_data_dir())
    }
}

impl AilintConfig {
    pub fn default_with_dir(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            typing: TypingConfig::default(),
            paste: PasteConfig::default(),
            fusion: FusionConfig::default(),
            oracles: OracleConfig::default(),
        }
    }

    /// Reads `<data_dir>/ailint.json`, writing defaults there if it is missing.
    pub fn load_or_default(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {:?}", config_path))?;
            let mut config: AilintConfig = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse config: {:?}", config_path))?;
            config.data_dir = data_dir.to_path_buf();
            config.validate()?;
            return Ok(config);
        }

        let config = Self::default_with_dir(data_dir);
        config.persist()?;
        Ok(config)
    }

    pub fn persist(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create data dir: {:?}", self.data_dir))?;
        let config_path = self.data_dir.join(CONFIG_FILE_NAME);
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(config_path, raw)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.fusion.weights.validate()?;
        if self.typing.window_ms == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.typing.saturation_count == 0 {
            return Err(ConfigError::ZeroSaturation);
        }
        if !(self.typing.suspicious_velocity.is_finite() && self.typing.suspicious_velocity > 0.0) {
            return Err(ConfigError::OutOfRange("typing.suspicious_velocity"));
        }
        if self.paste.suspicious_paste_lines < self.paste.min_paste_lines {
            return Err(ConfigError::PasteThresholds {
                capture: self.paste.min_paste_lines,
                suspicious: self.paste.suspicious_paste_lines,
            });
        }
        if !(self.paste.target_ratio > 0.0 && self.paste.target_ratio <= 1.0) {
            return Err(ConfigError::OutOfRange("paste.target_ratio"));
        }
        if !(self.fusion.reason_threshold > 0.0 && self.fusion.reason_threshold <= 1.0) {
            return Err(ConfigError::OutOfRange("fusion.reason_threshold"));
        }
        Ok(())
    }
}
