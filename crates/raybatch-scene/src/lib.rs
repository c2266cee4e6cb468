#![warn(missing_docs)]

//! Analytic scene intersection engine for raybatch.
//!
//! A [`Scene`] holds static planes, spheres and boxes tagged with layer
//! masks. It implements [`raybatch::RayQuery`], so wrapping it in a
//! [`raybatch::RayonEngine`] gives a ready-to-use intersection engine for
//! [`raybatch::RaycastBatch`].
//!
//! # Example
//!
//! ```ignore
//! use raybatch::{JobHandle, LayerMask, RaycastBatch, RayonEngine};
//! use raybatch_scene::{Primitive, Scene};
//!
//! let mut scene = Scene::new();
//! scene.add(Primitive::plane(Point3::new(0.0, 0.0, -5.0), Vec3::z())?, LayerMask::ALL)?;
//!
//! let mut batch = RaycastBatch::new(RayonEngine::new(scene), 100)?;
//! ```

pub mod error;
mod primitive;
mod scene;

pub use error::{Result, SceneError};
pub use primitive::{Primitive, SurfaceHit};
pub use scene::{ObjectId, Scene, SceneHit, SceneObject};
