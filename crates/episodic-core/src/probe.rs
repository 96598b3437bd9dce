//! # Runtime Probing
//!
//! Uses ffprobe (command-line) to read the container duration of a file.
//! Probing spawns a process, so the import engine only calls it for files
//! that are already suspiciously small.

use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::debug;

use crate::error::{EpisodicError, Result};

/// Extracts the playback runtime of a media file.
pub trait RuntimeProber: Send + Sync {
    /// Runtime in whole seconds.
    fn probe_runtime_seconds(&self, path: &Path) -> Result<u64>;
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// [`RuntimeProber`] that shells out to `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: String,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self {
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

impl FfprobeProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a custom ffprobe path
    pub fn with_ffprobe_path(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Check if ffprobe is available
    pub fn is_available(&self) -> bool {
        Command::new(&self.ffprobe_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl RuntimeProber for FfprobeProber {
    fn probe_runtime_seconds(&self, path: &Path) -> Result<u64> {
        debug!(path = %path.display(), "Probing runtime with ffprobe");

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error"])
            .args(["-print_format", "json"])
            .arg("-show_format")
            .arg(path)
            .output()
            .map_err(|e| EpisodicError::Probe {
                path: path.to_path_buf(),
                reason: format!("failed to execute {}: {e}", self.ffprobe_path),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EpisodicError::Probe {
                path: path.to_path_buf(),
                reason: format!("ffprobe exited with {}: {}", output.status, stderr.trim()),
            });
        }

        parse_duration_secs(&output.stdout).ok_or_else(|| EpisodicError::Probe {
            path: path.to_path_buf(),
            reason: "no duration in ffprobe output".into(),
        })
    }
}

/// Reads `format.duration` from ffprobe JSON output, truncated to seconds.
fn parse_duration_secs(stdout: &[u8]) -> Option<u64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout).ok()?;
    let secs: f64 = probe.format?.duration?.trim().parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(secs as u64)
    } else {
        None
    }
}
