#![warn(missing_docs)]

//! Batched asynchronous ray queries.
//!
//! Instead of issuing thousands of blocking ray casts per frame, a caller
//! fills one buffer of [`RaycastCommand`]s, schedules them as a single
//! parallel dispatch, does other work, and joins before reading the
//! index-aligned [`RaycastHit`]s.
//!
//! # Architecture
//!
//! - [`BatchBuffers`] - the paired, index-aligned command/result buffers
//! - [`JobHandle`] - completion token used for joining and for `depends_on` chaining
//! - [`Dispatch`] - an in-flight evaluation that owns the buffers until joined
//! - [`IntersectionEngine`] - the seam performing the actual intersection work
//! - [`RayonEngine`] - an engine running any [`RayQuery`] on a rayon pool
//! - [`RaycastBatch`] - the controller: resize, schedule, complete, copy out, dispose
//!
//! # Example
//!
//! ```ignore
//! use raybatch::{JobHandle, RaycastBatch, RaycastCommand, RayonEngine};
//!
//! let mut batch = RaycastBatch::new(RayonEngine::new(scene), 0)?;
//! batch.set_len(100)?;
//! for cmd in batch.commands_mut()? {
//!     *cmd = RaycastCommand::new(Point3::origin(), -Vec3::z(), 10.0);
//! }
//! batch.schedule(32, JobHandle::completed())?;
//! // ... other work ...
//! batch.complete()?;
//!
//! let mut hits = Vec::new();
//! batch.copy_results(&mut hits)?;
//! ```

mod batch;
mod buffers;
mod command;
pub mod config;
mod dispatch;
pub mod engine;
pub mod error;
mod job;

pub use batch::{BatchState, RaycastBatch};
pub use buffers::BatchBuffers;
pub use command::{LayerMask, RaycastCommand, RaycastHit};
pub use config::{BatchConfig, Strictness, DEFAULT_MIN_COMMANDS_PER_CHUNK};
pub use dispatch::{Dispatch, DispatchSender};
pub use engine::{evaluate_batch, IntersectionEngine, RayQuery, RayonEngine};
pub use error::{BatchError, MisuseKind, Result};
pub use job::{JobCompleter, JobHandle};
