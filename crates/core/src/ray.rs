//! Ray-query primitives: segment casts shared by pointer hit-testing and
//! particle collision sweeps.

use nalgebra::{Point3, Vector3};

use crate::scene::CollisionProxySet;
use crate::ObjectId;

/// A ray with finite reach (a swept segment).
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f64>,
    /// Unit direction.
    pub direction: Vector3<f64>,
    pub max_distance: f64,
}

impl Ray {
    /// Segment from `start` to `end`. Returns None for a degenerate
    /// (zero-length) segment so callers can skip the sweep entirely.
    pub fn between(start: Point3<f64>, end: Point3<f64>) -> Option<Self> {
        let delta = end - start;
        let dist = delta.norm();
        if dist < 1e-12 {
            return None;
        }
        Some(Self {
            origin: start,
            direction: delta / dist,
            max_distance: dist,
        })
    }

    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }
}

/// One intersection along a cast segment.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Distance from the ray origin.
    pub distance: f64,
    pub point: Point3<f64>,
    /// Unit surface normal at the hit, facing the ray origin's side.
    pub normal: Vector3<f64>,
    pub object: ObjectId,
    /// Surface-parameter coordinates in [0,1)², when the shape has a
    /// parametrization. None for shapes without one.
    pub uv: Option<[f64; 2]>,
}

/// Nearest-hit-first segment query against a candidate set.
///
/// The boundary both simulations consume: pointer-to-surface hit testing and
/// particle collision sweeps go through the same provider. Hosts with their
/// own acceleration structures implement this instead of using
/// [`crate::ProxyScene`].
pub trait RayQuery {
    /// Cast `origin + t * direction` for `t ∈ (0, max_distance]` against the
    /// candidate objects, returning hits ordered nearest first.
    fn cast_segment(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
        max_distance: f64,
        candidates: &CollisionProxySet,
    ) -> Vec<RayHit>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_segment_is_none() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!(Ray::between(p, p).is_none());
    }

    #[test]
    fn test_segment_direction_and_reach() {
        let ray = Ray::between(Point3::origin(), Point3::new(0.0, -3.0, 0.0)).unwrap();
        assert!((ray.max_distance - 3.0).abs() < 1e-12);
        assert!((ray.direction.y + 1.0).abs() < 1e-12);
        let end = ray.point_at(ray.max_distance);
        assert!((end.y + 3.0).abs() < 1e-12);
    }
}
