//! Error types for batch operations.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while driving a raycast batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Command and result buffers have diverged in length.
    #[error("command and result buffers diverged: {commands} commands, {results} results")]
    LengthMismatch {
        /// Number of command slots.
        commands: usize,
        /// Number of result slots.
        results: usize,
    },

    /// The batch buffers were released by `dispose`.
    #[error("batch buffers have been released")]
    Released,

    /// The buffers are lent to an outstanding dispatch.
    #[error("a dispatch is outstanding; complete it before touching the buffers")]
    Busy,

    /// Buffer allocation failed.
    #[error("failed to allocate buffers for {len} rays")]
    Allocation {
        /// Requested number of rays.
        len: usize,
    },

    /// The dispatch ended without handing the buffers back.
    #[error("dispatch failed before returning its buffers")]
    DispatchFailed,

    /// Misuse rejected under `Strictness::Fatal`.
    #[error("misuse: {0}")]
    Misuse(MisuseKind),

    /// Invalid batch configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Protocol misuse the batch can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MisuseKind {
    /// `schedule` called while the previous dispatch is still running.
    ScheduleWhileScheduled,
    /// `copy_results` called while a dispatch is still running.
    CopyWhileScheduled,
}

impl fmt::Display for MisuseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MisuseKind::ScheduleWhileScheduled => f.write_str("scheduling when job is not complete"),
            MisuseKind::CopyWhileScheduled => f.write_str("copying results when job is not complete"),
        }
    }
}

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;
