//! Proxy scene: simplified collision geometry registered by the host.
//!
//! Render geometry stays outside the core; objects that want to be hit by
//! pointer rays or confetti sweeps register a low-poly proxy shape here.
//! Collidability is an explicit capability set at registration, not a loose
//! tag walked out of a scene graph.

use std::f64::consts::TAU;

use nalgebra::{Isometry3, Point3, Vector3};

use crate::ray::{RayHit, RayQuery};
use crate::{Aabb, ObjectId};

/// Analytic proxy shape, expressed in the object's local frame.
#[derive(Debug, Clone, Copy)]
pub enum ProxyShape {
    /// Sphere centered at the local origin. Carries a spherical
    /// parametrization, so hits against it report surface UV.
    Sphere { radius: f64 },
    /// Box centered at the local origin.
    Cuboid { half_extents: Vector3<f64> },
}

/// One registered object: proxy shape + world transform + capabilities.
#[derive(Debug, Clone)]
struct SceneObject {
    id: ObjectId,
    shape: ProxyShape,
    transform: Isometry3<f64>,
    collidable: bool,
}

/// Immutable-for-the-run snapshot of candidate object ids.
///
/// Captured once (at celebration activation, or per pointer query) and then
/// only read. The scene keeps ownership of the actual geometry.
#[derive(Debug, Clone, Default)]
pub struct CollisionProxySet {
    ids: Vec<ObjectId>,
}

impl CollisionProxySet {
    pub fn from_ids(ids: Vec<ObjectId>) -> Self {
        Self { ids }
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.ids.iter().copied()
    }
}

/// Current world transform lookup for objects particles attach to.
pub trait TransformSource {
    /// None if the object is no longer known to the scene.
    fn world_transform(&self, id: ObjectId) -> Option<Isometry3<f64>>;
}

/// Registry of objects that opted into collision queries.
pub trait CollidableRegistry {
    /// Snapshot the ids of all currently collidable objects.
    fn collidable_snapshot(&self) -> CollisionProxySet;
}

/// The default scene implementation: a flat list of analytic proxies.
///
/// A handful of objects (polishable body, pedestal parts, ground stand-ins)
/// is all this toy ever holds, so linear scans beat any spatial structure.
#[derive(Debug, Default)]
pub struct ProxyScene {
    objects: Vec<SceneObject>,
    next_id: u32,
}

impl ProxyScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a proxy. `collidable` opts the object into collision
    /// snapshots; non-collidable objects can still be hit by explicit
    /// candidate sets (e.g. pointer picking against the polishable body).
    pub fn add_object(
        &mut self,
        shape: ProxyShape,
        transform: Isometry3<f64>,
        collidable: bool,
    ) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push(SceneObject {
            id,
            shape,
            transform,
            collidable,
        });
        id
    }

    /// Replace an object's world transform (animation, fades driven by the
    /// host). Unknown ids are ignored.
    pub fn set_transform(&mut self, id: ObjectId, transform: Isometry3<f64>) {
        if let Some(obj) = self.objects.iter_mut().find(|o| o.id == id) {
            obj.transform = transform;
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl TransformSource for ProxyScene {
    fn world_transform(&self, id: ObjectId) -> Option<Isometry3<f64>> {
        self.objects
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.transform)
    }
}

impl CollidableRegistry for ProxyScene {
    fn collidable_snapshot(&self) -> CollisionProxySet {
        CollisionProxySet::from_ids(
            self.objects
                .iter()
                .filter(|o| o.collidable)
                .map(|o| o.id)
                .collect(),
        )
    }
}

impl RayQuery for ProxyScene {
    fn cast_segment(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
        max_distance: f64,
        candidates: &CollisionProxySet,
    ) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .objects
            .iter()
            .filter(|o| candidates.contains(o.id))
            .filter_map(|o| intersect_object(o, origin, direction, max_distance))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

/// Intersect one object by transforming the segment into its local frame.
fn intersect_object(
    obj: &SceneObject,
    origin: Point3<f64>,
    direction: Vector3<f64>,
    max_distance: f64,
) -> Option<RayHit> {
    let local_origin = obj.transform.inverse_transform_point(&origin);
    let local_dir = obj.transform.inverse_transform_vector(&direction);

    let (t, local_normal, uv) = match obj.shape {
        ProxyShape::Sphere { radius } => intersect_sphere(local_origin, local_dir, radius)?,
        ProxyShape::Cuboid { half_extents } => {
            intersect_cuboid(local_origin, local_dir, half_extents)?
        }
    };

    if t > max_distance {
        return None;
    }

    Some(RayHit {
        distance: t,
        point: origin + direction * t,
        normal: obj.transform.transform_vector(&local_normal),
        object: obj.id,
        uv,
    })
}

/// Nearest front-face intersection with a sphere at the local origin.
#[allow(clippy::type_complexity)]
fn intersect_sphere(
    origin: Point3<f64>,
    dir: Vector3<f64>,
    radius: f64,
) -> Option<(f64, Vector3<f64>, Option<[f64; 2]>)> {
    let oc = origin.coords;
    let b = oc.dot(&dir);
    let c = oc.dot(&oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t <= 1e-9 {
        // Origin inside or behind the surface: sweeps start outside proxies,
        // so treat this as a miss rather than reporting a backface.
        return None;
    }
    let local = origin + dir * t;
    let normal = local.coords / radius;
    Some((t, normal, Some(sphere_uv(&normal))))
}

/// Spherical parametrization: u wraps around the equator, v runs pole to
/// pole. Matches the seam-at-u=0/1 layout the wear buffer expects.
fn sphere_uv(n: &Vector3<f64>) -> [f64; 2] {
    let u = (n.z.atan2(n.x) / TAU).rem_euclid(1.0);
    let v = 1.0 - n.y.clamp(-1.0, 1.0).acos() / std::f64::consts::PI;
    [u, v.clamp(0.0, 1.0 - f64::EPSILON)]
}

/// Slab-method intersection with an origin-centered box.
#[allow(clippy::type_complexity)]
fn intersect_cuboid(
    origin: Point3<f64>,
    dir: Vector3<f64>,
    half: Vector3<f64>,
) -> Option<(f64, Vector3<f64>, Option<[f64; 2]>)> {
    let bounds = Aabb::centered(half);
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;
    let mut entry_axis = 0usize;

    for axis in 0..3 {
        let o = origin.coords[axis];
        let d = dir[axis];
        if d.abs() < 1e-12 {
            if o < bounds.min[axis] || o > bounds.max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t1 = (bounds.min[axis] - o) * inv;
        let mut t2 = (bounds.max[axis] - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        if t1 > t_min {
            t_min = t1;
            entry_axis = axis;
        }
        t_max = t_max.min(t2);
        if t_min > t_max {
            return None;
        }
    }

    if t_min <= 1e-9 {
        return None;
    }

    let mut normal = Vector3::zeros();
    normal[entry_axis] = -dir[entry_axis].signum();
    Some((t_min, normal, None))
}
