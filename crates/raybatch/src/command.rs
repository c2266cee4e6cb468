//! Query descriptors and result slots.
//!
//! Both records are plain-old-data so that buffers of them can be allocated
//! zeroed in one call and copied out by value.

use bytemuck::{Pod, Zeroable};
use raybatch_math::{point_from, vec_from, Point3, Ray, Vec3};
use serde::{Deserialize, Serialize};

/// Bit mask selecting which object layers a ray can hit.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Every layer.
    pub const ALL: Self = Self(u32::MAX);
    /// No layer; a ray with this mask never hits anything.
    pub const NONE: Self = Self(0);

    /// Mask containing only layer `index` (0..32).
    pub const fn layer(index: u32) -> Self {
        Self(1 << (index & 31))
    }

    /// True if the two masks share at least one layer.
    #[inline]
    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Union of two masks.
    pub const fn with(self, other: LayerMask) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// A single ray query.
///
/// The zeroed command has no direction and no reach, so it always misses.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RaycastCommand {
    /// Ray origin.
    pub origin: [f32; 3],
    /// Ray direction; need not be normalized.
    pub direction: [f32; 3],
    /// Maximum hit distance along the normalized direction.
    pub max_distance: f32,
    /// Layers this ray can hit.
    pub layers: LayerMask,
}

impl RaycastCommand {
    /// Create a command that can hit every layer.
    pub fn new(origin: Point3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin: [origin.x, origin.y, origin.z],
            direction: [direction.x, direction.y, direction.z],
            max_distance,
            layers: LayerMask::ALL,
        }
    }

    /// Restrict the layers this command can hit.
    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    /// Origin as a point.
    #[inline]
    pub fn origin(&self) -> Point3 {
        point_from(self.origin)
    }

    /// Direction as a vector.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        vec_from(self.direction)
    }

    /// Build the normalized ray for this command.
    ///
    /// Returns `None` when the command cannot hit anything: degenerate
    /// direction, non-positive or NaN reach, or an empty layer mask.
    pub fn ray(&self) -> Option<Ray> {
        if self.max_distance.is_nan() || self.max_distance <= 0.0 || self.layers == LayerMask::NONE {
            return None;
        }
        Ray::try_new(self.origin(), self.direction())
    }
}

/// Result slot for one ray query.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct RaycastHit {
    /// World-space hit point.
    pub point: [f32; 3],
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Surface normal at the hit point.
    pub normal: [f32; 3],
    /// Identifier of the object that was hit; zero on a miss.
    pub object_id: u32,
    /// 1 on a hit, 0 on a miss.
    pub hit: u32,
}

impl RaycastHit {
    /// The miss value, identical to a zeroed slot.
    pub const MISS: Self = Self {
        point: [0.0; 3],
        distance: 0.0,
        normal: [0.0; 3],
        object_id: 0,
        hit: 0,
    };

    /// Create a hit record.
    pub fn new(point: Point3, normal: Vec3, distance: f32, object_id: u32) -> Self {
        Self {
            point: [point.x, point.y, point.z],
            distance,
            normal: [normal.x, normal.y, normal.z],
            object_id,
            hit: 1,
        }
    }

    /// True if the ray hit something.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.hit != 0
    }

    /// Hit point, if any.
    pub fn point(&self) -> Option<Point3> {
        self.is_hit().then(|| point_from(self.point))
    }

    /// Hit normal, if any.
    pub fn normal(&self) -> Option<Vec3> {
        self.is_hit().then(|| vec_from(self.normal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_records() {
        let cmd: RaycastCommand = Zeroable::zeroed();
        assert!(cmd.ray().is_none());
        let hit: RaycastHit = Zeroable::zeroed();
        assert_eq!(hit, RaycastHit::MISS);
        assert!(!hit.is_hit());
        assert!(hit.point().is_none());
    }

    #[test]
    fn test_record_layout_has_no_padding() {
        assert_eq!(std::mem::size_of::<RaycastCommand>(), 32);
        assert_eq!(std::mem::size_of::<RaycastHit>(), 36);
    }

    #[test]
    fn test_command_ray() {
        let cmd = RaycastCommand::new(Point3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, -4.0), 10.0);
        let ray = cmd.ray().unwrap();
        assert_eq!(ray.origin, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(ray.direction.z, -1.0);

        assert!(cmd.with_layers(LayerMask::NONE).ray().is_none());
        let unreachable = RaycastCommand { max_distance: 0.0, ..cmd };
        assert!(unreachable.ray().is_none());
    }

    #[test]
    fn test_layer_masks() {
        let a = LayerMask::layer(0).with(LayerMask::layer(3));
        assert_eq!(a, LayerMask(0b1001));
        assert!(a.intersects(LayerMask::layer(3)));
        assert!(!a.intersects(LayerMask::layer(1)));
        assert!(!LayerMask::NONE.intersects(LayerMask::ALL));
    }

    #[test]
    fn test_hit_accessors() {
        let hit = RaycastHit::new(Point3::new(0.0, 0.0, -2.0), Vec3::z(), 2.0, 7);
        assert!(hit.is_hit());
        assert_eq!(hit.point(), Some(Point3::new(0.0, 0.0, -2.0)));
        assert_eq!(hit.normal(), Some(Vec3::z()));
        assert_eq!(hit.object_id, 7);
    }
}
