#![warn(missing_docs)]

//! Math types for batched ray queries.
//!
//! Thin wrappers around nalgebra in single precision: points, vectors,
//! directions, axis-aligned boxes and rays with a precomputed slab test.

mod aabb;
mod ray;

pub use aabb::Aabb3;
pub use ray::Ray;

use nalgebra::{Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f32>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f32>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f32>>;

/// Squared-length threshold below which a direction is treated as degenerate.
pub const DEGENERATE_DIRECTION_SQ: f32 = 1e-12;

/// Parallelism threshold for ray/plane tests.
pub const PARALLEL_EPSILON: f32 = 1e-7;

/// Convert a `[x, y, z]` array into a point.
#[inline]
pub fn point_from(a: [f32; 3]) -> Point3 {
    Point3::new(a[0], a[1], a[2])
}

/// Convert a `[x, y, z]` array into a vector.
#[inline]
pub fn vec_from(a: [f32; 3]) -> Vec3 {
    Vec3::new(a[0], a[1], a[2])
}
