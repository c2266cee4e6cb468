//! The paired command/result buffers.

use bytemuck::allocation::try_zeroed_slice_box;
use bytemuck::Zeroable;
use tracing::debug;

use crate::command::{RaycastCommand, RaycastHit};
use crate::error::{BatchError, Result};

/// Two index-aligned, fixed-capacity buffers: `commands[i]` produces `results[i]`.
///
/// Both buffers are allocated zeroed in a single step and released together
/// when the pair is dropped. A zeroed result slot reads as
/// [`RaycastHit::MISS`], but its contents carry no meaning until a dispatch
/// over the pair has completed.
#[derive(Debug)]
pub struct BatchBuffers {
    commands: Box<[RaycastCommand]>,
    results: Box<[RaycastHit]>,
}

impl BatchBuffers {
    /// Allocate a pair of `len` zeroed slots each.
    ///
    /// Allocation failure is reported rather than aborting the process.
    pub fn allocate(len: usize) -> Result<Self> {
        let commands = zeroed::<RaycastCommand>(len)?;
        let results = zeroed::<RaycastHit>(len)?;
        debug!(len, "allocated batch buffers");
        Ok(Self { commands, results })
    }

    /// Common element count of both buffers.
    pub fn len(&self) -> Result<usize> {
        let commands = self.commands.len();
        let results = self.results.len();
        if commands == results {
            Ok(commands)
        } else {
            Err(BatchError::LengthMismatch { commands, results })
        }
    }

    /// True if the pair holds no slots.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.results.is_empty()
    }

    /// Read-only view of the command buffer.
    pub fn commands(&self) -> &[RaycastCommand] {
        &self.commands
    }

    /// Mutable view of the command buffer.
    pub fn commands_mut(&mut self) -> &mut [RaycastCommand] {
        &mut self.commands
    }

    /// Read-only view of the result buffer.
    pub fn results(&self) -> &[RaycastHit] {
        &self.results
    }

    /// Commands to read and results to write, borrowed together.
    ///
    /// This is the view an intersection engine evaluates.
    pub fn split_mut(&mut self) -> (&[RaycastCommand], &mut [RaycastHit]) {
        (&self.commands, &mut self.results)
    }
}

fn zeroed<T: Zeroable>(len: usize) -> Result<Box<[T]>> {
    try_zeroed_slice_box::<T>(len).map_err(|()| BatchError::Allocation { len })
}
