//! The intersection engine seam and its rayon-backed implementation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, error};

use crate::buffers::BatchBuffers;
use crate::command::{RaycastCommand, RaycastHit};
use crate::dispatch::{Dispatch, DispatchSender};
use crate::job::JobHandle;

/// Evaluates one ray query. Called concurrently from worker threads.
pub trait RayQuery: Send + Sync {
    /// Cast a single command and describe what it hit.
    fn cast(&self, command: &RaycastCommand) -> RaycastHit;
}

impl<Q: RayQuery + ?Sized> RayQuery for Arc<Q> {
    fn cast(&self, command: &RaycastCommand) -> RaycastHit {
        (**self).cast(command)
    }
}

/// Batched asynchronous evaluation of a buffer pair.
///
/// Implementations must not block the submitting thread, must only start
/// after `depends_on` completes, and must hand the buffers back through
/// the returned [`Dispatch`] with every result slot written.
pub trait IntersectionEngine: Send + Sync {
    /// Submit `buffers` for evaluation in chunks of at least
    /// `min_commands_per_chunk` commands.
    fn submit(
        &self,
        buffers: BatchBuffers,
        min_commands_per_chunk: usize,
        depends_on: JobHandle,
    ) -> Dispatch;
}

/// Evaluate every command of `buffers` into its result slot, in parallel.
///
/// Blocks until the whole batch is written. Results stay index-aligned with
/// commands regardless of how chunks are scheduled.
pub fn evaluate_batch<Q>(query: &Q, buffers: &mut BatchBuffers, min_commands_per_chunk: usize)
where
    Q: RayQuery + ?Sized,
{
    let chunk = min_commands_per_chunk.max(1);
    let (commands, results) = buffers.split_mut();
    results
        .par_chunks_mut(chunk)
        .zip(commands.par_chunks(chunk))
        .for_each(|(hits, cmds)| {
            for (hit, cmd) in hits.iter_mut().zip(cmds) {
                *hit = query.cast(cmd);
            }
        });
}

/// [`IntersectionEngine`] running a [`RayQuery`] on a rayon thread pool.
///
/// Uses the global pool unless one is supplied with [`RayonEngine::with_pool`].
pub struct RayonEngine<Q> {
    query: Arc<Q>,
    pool: Option<Arc<ThreadPool>>,
}

impl<Q: RayQuery + 'static> RayonEngine<Q> {
    /// Create an engine owning `query`.
    pub fn new(query: Q) -> Self {
        Self::from_shared(Arc::new(query))
    }

    /// Create an engine sharing `query` with other owners.
    pub fn from_shared(query: Arc<Q>) -> Self {
        Self { query, pool: None }
    }

    /// Run dispatches on `pool` instead of the global pool.
    pub fn with_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// The query evaluated for each command.
    pub fn query(&self) -> &Q {
        &self.query
    }

    fn spawn(&self, job: impl FnOnce() + Send + 'static) {
        match &self.pool {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
    }
}

impl<Q: RayQuery + 'static> IntersectionEngine for RayonEngine<Q> {
    fn submit(
        &self,
        buffers: BatchBuffers,
        min_commands_per_chunk: usize,
        depends_on: JobHandle,
    ) -> Dispatch {
        let (dispatch, sender) = Dispatch::channel();
        let query = Arc::clone(&self.query);
        let pool = self.pool.clone();
        let run = move || run_batch(&*query, buffers, min_commands_per_chunk, sender);

        if depends_on.is_complete() {
            self.spawn(run);
            return dispatch;
        }

        // Wait off-pool so a blocked dependency never holds a rayon worker.
        let waiter = thread::Builder::new()
            .name("raybatch-depends-on".into())
            .spawn(move || {
                depends_on.wait();
                match pool {
                    Some(pool) => pool.spawn(run),
                    None => rayon::spawn(run),
                }
            });
        if let Err(err) = waiter {
            // Dropping the closure dropped the sender: the dispatch reads as failed.
            error!(error = %err, "failed to spawn dependency waiter");
        }
        dispatch
    }
}

fn run_batch<Q>(
    query: &Q,
    mut buffers: BatchBuffers,
    min_commands_per_chunk: usize,
    sender: DispatchSender,
) where
    Q: RayQuery + ?Sized,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        evaluate_batch(query, &mut buffers, min_commands_per_chunk);
    }));
    match outcome {
        Ok(()) => {
            debug!(len = buffers.commands().len(), "batch evaluated");
            sender.finish(buffers);
        }
        Err(_) => {
            error!("ray query panicked; dropping batch buffers");
        }
    }
}
