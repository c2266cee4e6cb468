//! Analytic primitives and their closed-form ray intersections.

use raybatch_math::{Aabb3, Dir3, Point3, Ray, Vec3, PARALLEL_EPSILON};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};

/// Intersection of a ray with one primitive.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceHit {
    /// Parameter along the ray (distance, since rays are normalized).
    pub t: f32,
    /// Unit surface normal at the hit.
    pub normal: Vec3,
}

/// A static analytic shape.
///
/// Deserialization goes through the validating constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", try_from = "RawPrimitive")]
pub enum Primitive {
    /// Infinite plane through `origin`.
    Plane {
        /// A point on the plane.
        origin: Point3,
        /// Unit plane normal.
        normal: Dir3,
    },
    /// Solid sphere.
    Sphere {
        /// Sphere center.
        center: Point3,
        /// Sphere radius (> 0).
        radius: f32,
    },
    /// Solid axis-aligned box.
    Cuboid {
        /// Box extents.
        bounds: Aabb3,
    },
}

impl Primitive {
    /// Plane through `origin` with normal `normal` (normalized here).
    pub fn plane(origin: Point3, normal: Vec3) -> Result<Self> {
        if !is_finite_point(&origin) {
            return Err(SceneError::InvalidPrimitive("plane origin is not finite".into()));
        }
        let normal = Dir3::try_new(normal, PARALLEL_EPSILON)
            .filter(|n| n.iter().all(|c| c.is_finite()))
            .ok_or_else(|| SceneError::InvalidPrimitive("plane normal is degenerate".into()))?;
        Ok(Primitive::Plane { origin, normal })
    }

    /// Sphere of `radius` around `center`.
    pub fn sphere(center: Point3, radius: f32) -> Result<Self> {
        if !is_finite_point(&center) || !radius.is_finite() || radius <= 0.0 {
            return Err(SceneError::InvalidPrimitive(format!(
                "sphere radius must be positive and finite, got {radius}"
            )));
        }
        Ok(Primitive::Sphere { center, radius })
    }

    /// Box spanning `bounds`; every extent must be positive.
    pub fn cuboid(bounds: Aabb3) -> Result<Self> {
        let extent = bounds.max - bounds.min;
        if !is_finite_point(&bounds.min)
            || !is_finite_point(&bounds.max)
            || extent.iter().any(|e| *e <= 0.0)
        {
            return Err(SceneError::InvalidPrimitive("box extents must be positive".into()));
        }
        Ok(Primitive::Cuboid { bounds })
    }

    /// Nearest intersection with `t` in `[0, max_t]`.
    pub fn intersect(&self, ray: &Ray, max_t: f32) -> Option<SurfaceHit> {
        let hit = match self {
            Primitive::Plane { origin, normal } => intersect_plane(ray, origin, normal),
            Primitive::Sphere { center, radius } => intersect_sphere(ray, center, *radius),
            Primitive::Cuboid { bounds } => intersect_cuboid(ray, bounds),
        }?;
        (hit.t <= max_t).then_some(hit)
    }
}

/// Unchecked wire form of [`Primitive`].
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawPrimitive {
    Plane { origin: Point3, normal: Vec3 },
    Sphere { center: Point3, radius: f32 },
    Cuboid { bounds: Aabb3 },
}

impl TryFrom<RawPrimitive> for Primitive {
    type Error = SceneError;

    fn try_from(raw: RawPrimitive) -> Result<Self> {
        match raw {
            RawPrimitive::Plane { origin, normal } => Primitive::plane(origin, normal),
            RawPrimitive::Sphere { center, radius } => Primitive::sphere(center, radius),
            RawPrimitive::Cuboid { bounds } => Primitive::cuboid(bounds),
        }
    }
}

fn is_finite_point(p: &Point3) -> bool {
    p.iter().all(|c| c.is_finite())
}

/// Ray-plane intersection. The returned normal faces the ray origin.
fn intersect_plane(ray: &Ray, origin: &Point3, normal: &Dir3) -> Option<SurfaceHit> {
    let n = normal.as_ref();
    let denom = ray.direction.as_ref().dot(n);

    // Ray is parallel to plane
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t = (*origin - ray.origin).dot(n) / denom;
    if t < 0.0 {
        return None;
    }

    let normal = if denom > 0.0 { -*n } else { *n };
    Some(SurfaceHit { t, normal })
}

/// Ray-sphere intersection (quadratic). The normal points outward.
///
/// From inside the sphere the exit point is reported.
fn intersect_sphere(ray: &Ray, center: &Point3, radius: f32) -> Option<SurfaceHit> {
    let oc = ray.origin - *center;
    let d = ray.direction.as_ref();

    // |oc + t*d|^2 = r^2 with |d| = 1, in half-b form
    let half_b = oc.dot(d);
    let c = oc.dot(&oc) - radius * radius;
    let discriminant = half_b * half_b - c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t = [-half_b - sqrt_disc, -half_b + sqrt_disc]
        .into_iter()
        .find(|t| *t >= 0.0)?;

    let normal = (ray.at(t) - *center) / radius;
    Some(SurfaceHit { t, normal })
}

/// Ray-box intersection via the slab test. The normal is the outward
/// normal of the face that was hit.
fn intersect_cuboid(ray: &Ray, bounds: &Aabb3) -> Option<SurfaceHit> {
    let (t_min, t_max) = ray.intersect_aabb(bounds)?;
    let t = if bounds.contains(&ray.origin) { t_max } else { t_min };

    let center = bounds.center();
    let half = (bounds.max - bounds.min) * 0.5;
    let local = ray.at(t) - center;
    let scaled = Vec3::new(local.x / half.x, local.y / half.y, local.z / half.z);

    let axis = scaled.iamax();
    let mut normal = Vec3::zeros();
    normal[axis] = scaled[axis].signum();
    Some(SurfaceHit { t, normal })
}
