//! Batch configuration.

use serde::{Deserialize, Serialize};

use crate::error::{BatchError, Result};

/// Default minimum number of commands evaluated per parallel chunk.
pub const DEFAULT_MIN_COMMANDS_PER_CHUNK: usize = 256;

/// How protocol misuse is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Recover without a diagnostic.
    Silent,
    /// Log a `tracing` warning, then recover.
    Warn,
    /// Reject the call with [`BatchError::Misuse`] and leave state untouched.
    Fatal,
}

impl Default for Strictness {
    /// `Warn` in debug builds, `Silent` in release builds.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Strictness::Warn
        } else {
            Strictness::Silent
        }
    }
}

/// Raycast batch parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Misuse reporting level.
    pub strictness: Strictness,
    /// Chunk size used by `schedule_default`.
    pub min_commands_per_chunk: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            strictness: Strictness::default(),
            min_commands_per_chunk: DEFAULT_MIN_COMMANDS_PER_CHUNK,
        }
    }
}

impl BatchConfig {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.min_commands_per_chunk == 0 {
            return Err(BatchError::InvalidConfig(
                "min_commands_per_chunk must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Same config with a different strictness.
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }
}
