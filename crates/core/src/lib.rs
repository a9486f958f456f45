//! PolishSim core types shared across crates.
//!
//! Provides the ray-query primitives both simulations consume, the proxy
//! scene used for collision queries, coordinate conversion between nalgebra
//! (simulation) and glam (GPU upload), and common geometric types.

use nalgebra as na;

// Re-export key types so downstream crates don't repeat use-declarations
pub use na::{Isometry3, Matrix4, Point3, Rotation3, Translation3, Unit, UnitQuaternion, Vector3};

pub mod ray;
pub mod scene;

pub use ray::{Ray, RayHit, RayQuery};
pub use scene::{CollidableRegistry, CollisionProxySet, ProxyScene, ProxyShape, TransformSource};

/// Identifier for an object registered with the proxy scene.
///
/// Stable for the lifetime of the scene; handed back by ray hits and stored
/// by particles that attach to a parent object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u32);

/// Convert nalgebra Isometry3<f64> → glam Mat4 (for GPU upload).
pub fn isometry_to_glam(iso: &Isometry3<f64>) -> glam::Mat4 {
    let m = iso.to_homogeneous();
    mat4_to_glam(&m)
}

/// Convert nalgebra Matrix4<f64> → glam Mat4.
pub fn mat4_to_glam(m: &Matrix4<f64>) -> glam::Mat4 {
    glam::Mat4::from_cols_array(&[
        m[(0, 0)] as f32,
        m[(1, 0)] as f32,
        m[(2, 0)] as f32,
        m[(3, 0)] as f32,
        m[(0, 1)] as f32,
        m[(1, 1)] as f32,
        m[(2, 1)] as f32,
        m[(3, 1)] as f32,
        m[(0, 2)] as f32,
        m[(1, 2)] as f32,
        m[(2, 2)] as f32,
        m[(3, 2)] as f32,
        m[(0, 3)] as f32,
        m[(1, 3)] as f32,
        m[(2, 3)] as f32,
        m[(3, 3)] as f32,
    ])
}

/// Convert nalgebra Point3<f64> → glam Vec3.
pub fn point_to_glam(p: &Point3<f64>) -> glam::Vec3 {
    glam::Vec3::new(p.x as f32, p.y as f32, p.z as f32)
}

/// Convert nalgebra Vector3<f64> → glam Vec3.
pub fn vec3_to_glam(v: &Vector3<f64>) -> glam::Vec3 {
    glam::Vec3::new(v.x as f32, v.y as f32, v.z as f32)
}

/// GPU-uploadable per-instance transform (model matrix).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
}

impl InstanceRaw {
    pub fn from_glam(mat: glam::Mat4) -> Self {
        Self {
            model: mat.to_cols_array_2d(),
        }
    }

    /// Instance matrix from a pose and a uniform scale.
    pub fn from_pose(iso: &Isometry3<f64>, scale: f64) -> Self {
        let m = isometry_to_glam(iso) * glam::Mat4::from_scale(glam::Vec3::splat(scale as f32));
        Self::from_glam(m)
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl Aabb {
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Self { min, max }
    }

    /// Box centered at the origin with the given half-extents.
    pub fn centered(half_extents: Vector3<f64>) -> Self {
        Self {
            min: -half_extents,
            max: half_extents,
        }
    }

    pub fn contains(&self, p: &Vector3<f64>) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn center(&self) -> Vector3<f64> {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vector3<f64> {
        (self.max - self.min) * 0.5
    }

    pub fn extents(&self) -> Vector3<f64> {
        self.max - self.min
    }
}
