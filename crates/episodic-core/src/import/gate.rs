//! Size/runtime plausibility check for candidate files.

use crate::config::ImportConfig;

/// Result of the size/runtime check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    /// Large enough, or long enough despite its size.
    Pass,
    /// Below both thresholds. Still admitted when the file is a special.
    Undersized { size: u64, runtime_secs: u64 },
}

impl GateVerdict {
    /// Whether the file may continue to the import decision.
    #[must_use]
    pub fn admits(self, special: bool) -> bool {
        match self {
            GateVerdict::Pass => true,
            GateVerdict::Undersized { .. } => special,
        }
    }
}

/// Rejects files too small and too short to be real episodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicGate {
    min_size: u64,
    min_runtime_secs: u64,
}

impl HeuristicGate {
    pub fn new(min_size: u64, min_runtime_secs: u64) -> Self {
        Self {
            min_size,
            min_runtime_secs,
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(config.min_file_size_bytes, config.min_runtime_secs)
    }

    /// Checks `size` first and only calls `runtime` when the file is undersized.
    pub fn check(&self, size: u64, runtime: impl FnOnce() -> u64) -> GateVerdict {
        if size >= self.min_size {
            return GateVerdict::Pass;
        }

        let runtime_secs = runtime();
        if runtime_secs >= self.min_runtime_secs {
            GateVerdict::Pass
        } else {
            GateVerdict::Undersized { size, runtime_secs }
        }
    }
}

impl Default for HeuristicGate {
    fn default() -> Self {
        Self::from_config(&ImportConfig::default())
    }
}
