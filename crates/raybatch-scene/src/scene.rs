//! Static scene of analytic primitives.

use std::collections::HashSet;
use std::num::NonZeroU32;

use raybatch::{LayerMask, RayQuery, RaycastCommand, RaycastHit};
use raybatch_math::{Point3, Ray, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SceneError};
use crate::primitive::Primitive;

/// Identifier of an object in a [`Scene`]. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(NonZeroU32);

impl ObjectId {
    /// Raw id as written into [`RaycastHit::object_id`].
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// A primitive placed in a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Object id, assigned in insertion order starting at 1.
    pub id: ObjectId,
    /// Shape of the object.
    pub primitive: Primitive,
    /// Layers the object belongs to.
    pub layers: LayerMask,
}

/// Closest hit found by [`Scene::raycast`].
#[derive(Debug, Clone, Copy)]
pub struct SceneHit {
    /// Object that was hit.
    pub object: ObjectId,
    /// Distance along the ray.
    pub distance: f32,
    /// Hit point.
    pub point: Point3,
    /// Unit surface normal.
    pub normal: Vec3,
}

/// Collection of static objects queried by ray batches.
///
/// Deserialization rejects duplicate object ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScene")]
pub struct Scene {
    objects: Vec<SceneObject>,
}

#[derive(Deserialize)]
struct RawScene {
    objects: Vec<SceneObject>,
}

impl TryFrom<RawScene> for Scene {
    type Error = SceneError;

    fn try_from(raw: RawScene) -> Result<Self> {
        let mut seen = HashSet::with_capacity(raw.objects.len());
        for object in &raw.objects {
            if !seen.insert(object.id) {
                return Err(SceneError::DuplicateObjectId(object.id.get()));
            }
        }
        Ok(Self {
            objects: raw.objects,
        })
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a primitive on `layers` and return its id.
    ///
    /// The id is one past the largest id in the scene, so ids of a loaded
    /// scene are never reused.
    pub fn add(&mut self, primitive: Primitive, layers: LayerMask) -> Result<ObjectId> {
        let last = self.objects.iter().map(|o| o.id.get()).max().unwrap_or(0);
        let id = last
            .checked_add(1)
            .and_then(NonZeroU32::new)
            .map(ObjectId)
            .ok_or(SceneError::ObjectIdOverflow)?;
        debug!(id = id.get(), ?layers, "added scene object");
        self.objects.push(SceneObject {
            id,
            primitive,
            layers,
        });
        Ok(id)
    }

    /// Objects in insertion order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if the scene has no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Closest hit within `max_distance` on objects sharing a layer with `layers`.
    ///
    /// Ties go to the object added first.
    pub fn raycast(&self, ray: &Ray, max_distance: f32, layers: LayerMask) -> Option<SceneHit> {
        // TODO: add a BVH broadphase; this scans every object per ray.
        let mut best: Option<SceneHit> = None;
        for object in self.objects.iter().filter(|o| o.layers.intersects(layers)) {
            let reach = best.map_or(max_distance, |b| b.distance);
            let Some(hit) = object.primitive.intersect(ray, reach) else {
                continue;
            };
            if best.map_or(true, |b| hit.t < b.distance) {
                best = Some(SceneHit {
                    object: object.id,
                    distance: hit.t,
                    point: ray.at(hit.t),
                    normal: hit.normal,
                });
            }
        }
        best
    }
}

impl RayQuery for Scene {
    fn cast(&self, command: &RaycastCommand) -> RaycastHit {
        let Some(ray) = command.ray() else {
            return RaycastHit::MISS;
        };
        match self.raycast(&ray, command.max_distance, command.layers) {
            Some(hit) => RaycastHit::new(hit.point, hit.normal, hit.distance, hit.object.get()),
            None => RaycastHit::MISS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use raybatch_math::Aabb3;

    const FLOOR: LayerMask = LayerMask::layer(0);
    const PROPS: LayerMask = LayerMask::layer(1);

    fn test_scene() -> (Scene, ObjectId, ObjectId) {
        let mut scene = Scene::new();
        let floor = scene
            .add(Primitive::plane(Point3::new(0.0, 0.0, -5.0), Vec3::z()).unwrap(), FLOOR)
            .unwrap();
        let ball = scene
            .add(Primitive::sphere(Point3::new(0.0, 0.0, -2.0), 0.5).unwrap(), PROPS)
            .unwrap();
        (scene, floor, ball)
    }

    fn down(max_distance: f32) -> RaycastCommand {
        RaycastCommand::new(Point3::origin(), -Vec3::z(), max_distance)
    }

    #[test]
    fn test_ids_start_at_one() {
        let (scene, floor, ball) = test_scene();
        assert_eq!(floor.get(), 1);
        assert_eq!(ball.get(), 2);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_closest_hit_wins() {
        let (scene, _, ball) = test_scene();
        let hit = scene.cast(&down(10.0));
        assert!(hit.is_hit());
        assert_eq!(hit.object_id, ball.get());
        assert_relative_eq!(hit.distance, 1.5, epsilon = 1e-5);
        assert_relative_eq!(hit.normal[2], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_layer_mask_filters_objects() {
        let (scene, floor, _) = test_scene();
        let hit = scene.cast(&down(10.0).with_layers(FLOOR));
        assert_eq!(hit.object_id, floor.get());
        assert_relative_eq!(hit.distance, 5.0, epsilon = 1e-5);

        let miss = scene.cast(&down(10.0).with_layers(LayerMask::layer(7)));
        assert_eq!(miss, RaycastHit::MISS);
    }

    #[test]
    fn test_max_distance_limits_hits() {
        let (scene, _, _) = test_scene();
        assert_eq!(scene.cast(&down(1.0)), RaycastHit::MISS);
        assert!(scene.cast(&down(1.5)).is_hit());
    }

    #[test]
    fn test_degenerate_commands_miss() {
        let (scene, _, _) = test_scene();
        let no_direction = RaycastCommand::new(Point3::origin(), Vec3::zeros(), 10.0);
        assert_eq!(scene.cast(&no_direction), RaycastHit::MISS);
        assert_eq!(scene.cast(&down(0.0)), RaycastHit::MISS);
        assert_eq!(scene.cast(&down(-1.0)), RaycastHit::MISS);
    }

    #[test]
    fn test_scene_from_json() {
        let json = r#"{
            "objects": [{
                "id": 1,
                "primitive": {
                    "kind": "cuboid",
                    "bounds": { "min": [-1.0, -1.0, -4.0], "max": [1.0, 1.0, -3.0] }
                },
                "layers": 1
            }]
        }"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        let hit = scene.cast(&down(10.0));
        assert_eq!(hit.object_id, 1);
        assert_relative_eq!(hit.distance, 3.0, epsilon = 1e-5);

        let expected = Aabb3::new(Point3::new(-1.0, -1.0, -4.0), Point3::new(1.0, 1.0, -3.0));
        assert_eq!(scene.objects()[0].primitive, Primitive::cuboid(expected).unwrap());
    }

    #[test]
    fn test_scene_from_json_rejects_invalid_objects() {
        let zero_radius = r#"{
            "objects": [{
                "id": 2,
                "primitive": { "kind": "sphere", "center": [0.0, 0.0, -2.0], "radius": 0.0 },
                "layers": 1
            }]
        }"#;
        assert!(serde_json::from_str::<Scene>(zero_radius).is_err());

        let duplicate = r#"{
            "objects": [
                { "id": 3, "primitive": { "kind": "sphere", "center": [0.0, 0.0, -2.0], "radius": 1.0 }, "layers": 1 },
                { "id": 3, "primitive": { "kind": "sphere", "center": [0.0, 0.0, -6.0], "radius": 1.0 }, "layers": 1 }
            ]
        }"#;
        let err = serde_json::from_str::<Scene>(duplicate).unwrap_err();
        assert!(err.to_string().contains("duplicate object id 3"));
    }

    #[test]
    fn test_add_after_load_never_reuses_ids() {
        let json = r#"{
            "objects": [{
                "id": 2,
                "primitive": { "kind": "sphere", "center": [0.0, 0.0, -2.0], "radius": 0.5 },
                "layers": 1
            }]
        }"#;
        let mut scene: Scene = serde_json::from_str(json).unwrap();
        let floor = scene
            .add(Primitive::plane(Point3::new(0.0, 0.0, -5.0), Vec3::z()).unwrap(), FLOOR)
            .unwrap();
        assert_eq!(floor.get(), 3);

        let ids: HashSet<ObjectId> = scene.objects().iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), scene.len());

        let hit = scene.cast(&down(10.0));
        assert_eq!(hit.object_id, 2);
        assert!(hit.normal.iter().all(|c| c.is_finite()));
        assert_relative_eq!(hit.distance, 1.5, epsilon = 1e-5);
    }
}
