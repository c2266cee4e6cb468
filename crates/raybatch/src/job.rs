//! Completion tokens for asynchronous work.
//!
//! A [`JobHandle`] is the waiting side: cheap to clone, pollable with
//! [`JobHandle::is_complete`], joinable with [`JobHandle::wait`]. The
//! producing side holds the matching [`JobCompleter`], which signals on
//! [`JobCompleter::complete`] or when dropped. A worker that unwinds
//! therefore never leaves a waiter blocked.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

#[derive(Default)]
struct Signal {
    done: Mutex<bool>,
    ready: Condvar,
}

impl Signal {
    fn is_set(&self) -> bool {
        *self.done.lock()
    }

    fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.ready.wait(&mut done);
        }
    }

    fn set(&self) {
        *self.done.lock() = true;
        self.ready.notify_all();
    }
}

#[derive(Clone, Default)]
enum Inner {
    #[default]
    Done,
    Pending(Arc<Signal>),
    All(Arc<[JobHandle]>),
}

/// Handle to a unit of asynchronous work, used for completion and ordering.
///
/// The default handle is already complete.
#[derive(Clone, Default)]
pub struct JobHandle {
    inner: Inner,
}

impl JobHandle {
    /// A handle with nothing to wait for.
    pub fn completed() -> Self {
        Self::default()
    }

    /// A handle that completes when the returned completer fires.
    pub fn pending() -> (Self, JobCompleter) {
        let signal = Arc::new(Signal::default());
        let handle = Self {
            inner: Inner::Pending(Arc::clone(&signal)),
        };
        (handle, JobCompleter { signal })
    }

    /// A handle that completes once every handle in `handles` has completed.
    pub fn combine<I>(handles: I) -> Self
    where
        I: IntoIterator<Item = JobHandle>,
    {
        let mut pending: Vec<JobHandle> = handles
            .into_iter()
            .filter(|h| !h.is_complete())
            .collect();
        match pending.len() {
            0 => Self::completed(),
            1 => pending.pop().unwrap_or_default(),
            _ => Self {
                inner: Inner::All(pending.into()),
            },
        }
    }

    /// True once the work has finished. Never blocks.
    pub fn is_complete(&self) -> bool {
        match &self.inner {
            Inner::Done => true,
            Inner::Pending(signal) => signal.is_set(),
            Inner::All(handles) => handles.iter().all(JobHandle::is_complete),
        }
    }

    /// Block the calling thread until the work has finished.
    ///
    /// Returns immediately for a completed handle.
    pub fn wait(&self) {
        match &self.inner {
            Inner::Done => {}
            Inner::Pending(signal) => signal.wait(),
            Inner::All(handles) => handles.iter().for_each(JobHandle::wait),
        }
    }
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("complete", &self.is_complete())
            .finish()
    }
}

/// Producing side of a [`JobHandle`].
pub struct JobCompleter {
    signal: Arc<Signal>,
}

impl JobCompleter {
    /// Mark the work finished and wake every waiter.
    pub fn complete(self) {
        drop(self);
    }
}

impl Drop for JobCompleter {
    fn drop(&mut self) {
        self.signal.set();
    }
}

impl fmt::Debug for JobCompleter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobCompleter").finish_non_exhaustive()
    }
}
