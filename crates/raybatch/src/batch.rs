//! The raycast batch controller.
//!
//! A [`RaycastBatch`] owns one buffer pair and drives it through
//! `Idle -> Scheduled -> Idle`:
//!
//! 1. write commands with [`RaycastBatch::commands_mut`],
//! 2. submit them with [`RaycastBatch::schedule`] (never blocks),
//! 3. join with [`RaycastBatch::complete`],
//! 4. read with [`RaycastBatch::results`] or [`RaycastBatch::copy_results`].
//!
//! While scheduled, the buffers belong to the engine's [`Dispatch`], so
//! they can be neither read, written nor freed until the dispatch is
//! joined. Resizing and disposal join first.

use std::fmt;
use std::mem;

use tracing::{debug, error, warn};

use crate::buffers::BatchBuffers;
use crate::command::{RaycastCommand, RaycastHit};
use crate::config::{BatchConfig, Strictness};
use crate::dispatch::Dispatch;
use crate::engine::IntersectionEngine;
use crate::error::{BatchError, MisuseKind, Result};
use crate::job::JobHandle;

/// Observable lifecycle state of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No outstanding work; buffers may be read, written or resized.
    Idle,
    /// A dispatch is running.
    Scheduled,
    /// The dispatch has finished but has not been joined yet.
    Completed,
    /// Buffers released by `dispose`.
    Released,
}

enum Slot {
    Idle(BatchBuffers),
    Scheduled(Dispatch),
    Released,
}

/// Index-aligned ray queries evaluated as one asynchronous dispatch.
pub struct RaycastBatch<E: IntersectionEngine> {
    engine: E,
    config: BatchConfig,
    slot: Slot,
    len: usize,
    reallocations: u64,
}

impl<E: IntersectionEngine> RaycastBatch<E> {
    /// Create a batch of `len` zeroed commands with the default config.
    pub fn new(engine: E, len: usize) -> Result<Self> {
        Self::with_config(engine, len, BatchConfig::default())
    }

    /// Create a batch of `len` zeroed commands.
    pub fn with_config(engine: E, len: usize, config: BatchConfig) -> Result<Self> {
        config.validate()?;
        let buffers = BatchBuffers::allocate(len)?;
        Ok(Self {
            engine,
            config,
            slot: Slot::Idle(buffers),
            len,
            reallocations: 0,
        })
    }

    /// The engine dispatches are submitted to.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The active configuration.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BatchState {
        match &self.slot {
            Slot::Idle(_) => BatchState::Idle,
            Slot::Scheduled(dispatch) if dispatch.is_complete() => BatchState::Completed,
            Slot::Scheduled(_) => BatchState::Scheduled,
            Slot::Released => BatchState::Released,
        }
    }

    /// Number of ray slots.
    ///
    /// Fails with [`BatchError::LengthMismatch`] if the command and result
    /// buffers ever diverge, and with [`BatchError::Released`] after dispose.
    pub fn len(&self) -> Result<usize> {
        match &self.slot {
            Slot::Idle(buffers) => buffers.len(),
            Slot::Scheduled(_) => Ok(self.len),
            Slot::Released => Err(BatchError::Released),
        }
    }

    /// True if the batch has no ray slots.
    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// How many times the buffers have been reallocated by [`set_len`](Self::set_len).
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }

    /// Resize the batch to `len` slots.
    ///
    /// A no-op when the length is unchanged. Otherwise any outstanding
    /// dispatch is joined, both buffers are released, and a fresh zeroed
    /// pair is allocated. Contents are not preserved. On a released batch
    /// this allocates anew.
    pub fn set_len(&mut self, len: usize) -> Result<()> {
        let current = match &self.slot {
            Slot::Idle(buffers) => Some(buffers.len()?),
            Slot::Scheduled(_) => Some(self.len),
            Slot::Released => None,
        };
        if current == Some(len) {
            return Ok(());
        }

        self.release()?;
        let buffers = BatchBuffers::allocate(len)?;
        self.slot = Slot::Idle(buffers);
        self.len = len;
        self.reallocations += 1;
        debug!(len, reallocations = self.reallocations, "resized raycast batch");
        Ok(())
    }

    /// Submit every command for evaluation and return the completion handle.
    ///
    /// Never blocks on the new dispatch. `depends_on` delays evaluation until
    /// that handle completes. A `min_commands_per_chunk` of zero is treated
    /// as one.
    ///
    /// Scheduling while the previous dispatch is still running is misuse:
    /// it is reported per [`Strictness`], and unless rejected the previous
    /// dispatch is joined before the new one is submitted.
    pub fn schedule(
        &mut self,
        min_commands_per_chunk: usize,
        depends_on: JobHandle,
    ) -> Result<JobHandle> {
        if self.state() == BatchState::Scheduled {
            self.misuse(MisuseKind::ScheduleWhileScheduled)?;
        }
        self.complete()?;

        let buffers = match mem::replace(&mut self.slot, Slot::Released) {
            Slot::Idle(buffers) => buffers,
            other => {
                self.slot = other;
                return Err(BatchError::Released);
            }
        };

        let chunk = min_commands_per_chunk.max(1);
        let dispatch = self.engine.submit(buffers, chunk, depends_on);
        let handle = dispatch.job_handle();
        self.slot = Slot::Scheduled(dispatch);
        debug!(len = self.len, chunk, "scheduled raycast batch");
        Ok(handle)
    }

    /// [`schedule`](Self::schedule) with the configured chunk size and no dependency.
    pub fn schedule_default(&mut self) -> Result<JobHandle> {
        self.schedule(self.config.min_commands_per_chunk, JobHandle::completed())
    }

    /// Block until the outstanding dispatch, if any, has finished.
    ///
    /// Afterwards the batch is idle and every result slot is written.
    /// Completing an idle or released batch does nothing. If the dispatch
    /// failed to return its buffers the batch ends up released.
    pub fn complete(&mut self) -> Result<()> {
        match mem::replace(&mut self.slot, Slot::Released) {
            Slot::Scheduled(dispatch) => {
                let buffers = dispatch.join()?;
                self.slot = Slot::Idle(buffers);
                debug!(len = self.len, "completed raycast batch");
            }
            other => self.slot = other,
        }
        Ok(())
    }

    /// Completion handle of the outstanding dispatch, for chaining other work.
    ///
    /// Already complete when nothing is scheduled.
    pub fn job_handle(&self) -> JobHandle {
        match &self.slot {
            Slot::Scheduled(dispatch) => dispatch.job_handle(),
            _ => JobHandle::completed(),
        }
    }

    /// Command buffer, writable while idle.
    pub fn commands_mut(&mut self) -> Result<&mut [RaycastCommand]> {
        match &mut self.slot {
            Slot::Idle(buffers) => Ok(buffers.commands_mut()),
            Slot::Scheduled(_) => Err(BatchError::Busy),
            Slot::Released => Err(BatchError::Released),
        }
    }

    /// Command buffer, readable while idle.
    pub fn commands(&self) -> Result<&[RaycastCommand]> {
        self.idle_buffers().map(BatchBuffers::commands)
    }

    /// Result buffer, readable while idle.
    ///
    /// Slots hold meaningful hits only after a dispatch has completed.
    pub fn results(&self) -> Result<&[RaycastHit]> {
        self.idle_buffers().map(BatchBuffers::results)
    }

    /// Copy every result into `dest`, resizing it to the batch length.
    ///
    /// `dest` receives values, not a view: later changes to it never reach
    /// the batch. Copying while a dispatch is still running is misuse; it
    /// is reported per [`Strictness`] and, unless rejected, the dispatch is
    /// joined before reading, so the call blocks until it finishes.
    pub fn copy_results(&mut self, dest: &mut Vec<RaycastHit>) -> Result<()> {
        if self.state() == BatchState::Scheduled {
            self.misuse(MisuseKind::CopyWhileScheduled)?;
        }
        self.complete()?;

        let results = self.results()?;
        if dest.len() != results.len() {
            dest.resize(results.len(), RaycastHit::MISS);
        }
        dest.copy_from_slice(results);
        Ok(())
    }

    /// Join any outstanding dispatch, then release both buffers.
    ///
    /// Idempotent. Afterwards only `dispose` and [`set_len`](Self::set_len)
    /// are valid.
    pub fn dispose(&mut self) -> Result<()> {
        let released = matches!(self.slot, Slot::Released);
        self.release()?;
        if !released {
            debug!("disposed raycast batch");
        }
        Ok(())
    }

    /// Single path for freeing the buffers: join first, then drop.
    fn release(&mut self) -> Result<()> {
        let joined = self.complete();
        self.slot = Slot::Released;
        self.len = 0;
        joined
    }

    fn idle_buffers(&self) -> Result<&BatchBuffers> {
        match &self.slot {
            Slot::Idle(buffers) => Ok(buffers),
            Slot::Scheduled(_) => Err(BatchError::Busy),
            Slot::Released => Err(BatchError::Released),
        }
    }

    fn misuse(&self, kind: MisuseKind) -> Result<()> {
        match self.config.strictness {
            Strictness::Silent => Ok(()),
            Strictness::Warn => {
                warn!(len = self.len, "{kind}");
                Ok(())
            }
            Strictness::Fatal => Err(BatchError::Misuse(kind)),
        }
    }
}

impl<E: IntersectionEngine> Drop for RaycastBatch<E> {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            error!(error = %err, "raycast batch dropped with a failed dispatch");
        }
    }
}

impl<E: IntersectionEngine> fmt::Debug for RaycastBatch<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaycastBatch")
            .field("state", &self.state())
            .field("len", &self.len)
            .field("config", &self.config)
            .field("reallocations", &self.reallocations)
            .finish_non_exhaustive()
    }
}
