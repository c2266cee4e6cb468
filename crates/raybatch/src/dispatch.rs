//! In-flight dispatches of a buffer pair.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffers::BatchBuffers;
use crate::error::{BatchError, Result};
use crate::job::{JobCompleter, JobHandle};

type ReturnSlot = Arc<Mutex<Option<BatchBuffers>>>;

/// An outstanding evaluation of one [`BatchBuffers`] pair.
///
/// The buffers belong to the dispatch until [`Dispatch::join`] hands them
/// back, so nothing can touch or free them while the engine is writing.
pub struct Dispatch {
    job: JobHandle,
    slot: ReturnSlot,
}

impl Dispatch {
    /// Create a dispatch and the sender a worker uses to finish it.
    pub fn channel() -> (Self, DispatchSender) {
        let (job, completer) = JobHandle::pending();
        let slot: ReturnSlot = Arc::new(Mutex::new(None));
        let sender = DispatchSender {
            slot: Arc::clone(&slot),
            completer,
        };
        (Self { job, slot }, sender)
    }

    /// True once the worker has finished; the buffers still need a join.
    pub fn is_complete(&self) -> bool {
        self.job.is_complete()
    }

    /// Completion handle other work can depend on.
    pub fn job_handle(&self) -> JobHandle {
        self.job.clone()
    }

    /// Block until the worker finishes and take the buffers back.
    ///
    /// Fails with [`BatchError::DispatchFailed`] if the worker went away
    /// without returning them.
    pub fn join(self) -> Result<BatchBuffers> {
        self.job.wait();
        self.slot.lock().take().ok_or(BatchError::DispatchFailed)
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("complete", &self.is_complete())
            .finish_non_exhaustive()
    }
}

/// Worker side of a [`Dispatch`].
///
/// Dropping it without calling [`DispatchSender::finish`] completes the
/// dispatch as failed.
pub struct DispatchSender {
    slot: ReturnSlot,
    completer: JobCompleter,
}

impl DispatchSender {
    /// Hand the evaluated buffers back and signal completion.
    pub fn finish(self, buffers: BatchBuffers) {
        *self.slot.lock() = Some(buffers);
        self.completer.complete();
    }
}

impl fmt::Debug for DispatchSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchSender").finish_non_exhaustive()
    }
}
