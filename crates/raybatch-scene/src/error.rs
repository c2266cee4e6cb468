//! Error types for scene construction.

use thiserror::Error;

/// Errors that can occur while building a scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Primitive has degenerate or non-finite geometry.
    #[error("invalid primitive: {0}")]
    InvalidPrimitive(String),

    /// Two objects share an id.
    #[error("duplicate object id {0}")]
    DuplicateObjectId(u32),

    /// The next object id would exceed `u32::MAX`.
    #[error("object id space exhausted")]
    ObjectIdOverflow,
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
