//! # Import Configuration
//!
//! Thresholds and tables that drive the import decision. Every field has a
//! default, so an empty JSON object is a valid configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EpisodicError, Result};
use crate::types::QualityTable;

/// Files smaller than this are suspicious unless their runtime says otherwise.
pub const DEFAULT_MIN_FILE_SIZE_BYTES: u64 = 70 * 1024 * 1024;

/// Runtime below which an undersized file is treated as a sample or placeholder.
pub const DEFAULT_MIN_RUNTIME_SECS: u64 = 180;

/// Container extensions the scanner considers.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "ts", "m2ts", "mpg", "mpeg", "webm",
];

/// Configuration for the import engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Size threshold of the heuristic gate, in bytes.
    pub min_file_size_bytes: u64,
    /// Runtime threshold of the heuristic gate, in seconds.
    pub min_runtime_secs: u64,
    /// Quality levels from lowest to highest.
    pub quality_table: QualityTable,
    /// Lowercase extensions (without the dot) treated as video files.
    pub video_extensions: Vec<String>,
    /// Where superseded files are moved; deleted outright when unset.
    pub recycle_bin: Option<PathBuf>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            min_file_size_bytes: DEFAULT_MIN_FILE_SIZE_BYTES,
            min_runtime_secs: DEFAULT_MIN_RUNTIME_SECS,
            quality_table: QualityTable::default(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect(),
            recycle_bin: None,
        }
    }
}

impl ImportConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `EpisodicError::Io` if the file cannot be read, `Json` if it
    /// is malformed and `InvalidConfig`/`InvalidQualityTable` if a value is
    /// rejected.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| EpisodicError::io(path, e))?;
        Self::from_json_str(&raw)
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.video_extensions.is_empty() {
            return Err(EpisodicError::InvalidConfig(
                "video_extensions must not be empty".into(),
            ));
        }
        if let Some(ext) = self
            .video_extensions
            .iter()
            .find(|ext| ext.starts_with('.') || ext.chars().any(char::is_uppercase))
        {
            return Err(EpisodicError::InvalidConfig(format!(
                "video extension {ext:?} must be lowercase and without a leading dot"
            )));
        }
        Ok(())
    }

    /// Set the size threshold of the heuristic gate.
    pub fn with_min_file_size(mut self, bytes: u64) -> Self {
        self.min_file_size_bytes = bytes;
        self
    }

    /// Set the runtime threshold of the heuristic gate.
    pub fn with_min_runtime(mut self, secs: u64) -> Self {
        self.min_runtime_secs = secs;
        self
    }

    /// Replace the quality table.
    pub fn with_quality_table(mut self, table: QualityTable) -> Self {
        self.quality_table = table;
        self
    }

    /// Move superseded files into `dir` instead of deleting them.
    pub fn with_recycle_bin(mut self, dir: impl Into<PathBuf>) -> Self {
        self.recycle_bin = Some(dir.into());
        self
    }

    /// Returns `true` if `path` carries one of the configured video extensions.
    #[must_use]
    pub fn is_video_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.video_extensions.iter().any(|known| *known == ext)
            })
            .unwrap_or(false)
    }
}
