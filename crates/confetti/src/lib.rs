//! Celebration particle engine: a fixed pool of confetti falling under
//! gravity, colliding with tagged scene proxies via swept ray casts, and —
//! once landed — riding rigidly on a moving parent object.
//!
//! The system is dormant until [`ConfettiSystem::activate`] hands it a
//! collision snapshot; activation is one-shot, with no reset path. A fresh
//! celebration means constructing a fresh system.

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use polishsim_core::ray::RayQuery;
use polishsim_core::scene::{CollisionProxySet, TransformSource};
use polishsim_core::InstanceRaw;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub mod particle;

pub use particle::{Particle, ParticleState};

use particle::{
    GRAVITY, LANDING_EPSILON, LATERAL_DRAG, MIN_TRAVEL, TERMINAL_VELOCITY,
};

/// Timestep clamp: long frame stalls advance at most this far per tick.
pub const MAX_DT: f64 = 0.1;

/// Pool construction parameters.
#[derive(Debug, Clone)]
pub struct ConfettiParams {
    pub count: usize,
    /// Fallback landing height for particles that miss every proxy.
    pub ground_y: f64,
}

impl Default for ConfettiParams {
    fn default() -> Self {
        Self {
            count: 200,
            ground_y: -2.0,
        }
    }
}

/// The particle pool plus the collision snapshot captured at activation.
pub struct ConfettiSystem {
    particles: Vec<Particle>,
    /// Present once activated. Captured exactly once; geometry added or
    /// removed afterwards is invisible to the run.
    proxies: Option<CollisionProxySet>,
    ground_y: f64,
    rng: StdRng,
}

impl ConfettiSystem {
    /// Build the full pool up front with an OS-seeded RNG.
    pub fn new(params: &ConfettiParams) -> Self {
        Self::from_rng(params, StdRng::from_os_rng())
    }

    /// Deterministic pool for tests and replays.
    pub fn with_seed(params: &ConfettiParams, seed: u64) -> Self {
        Self::from_rng(params, StdRng::seed_from_u64(seed))
    }

    fn from_rng(params: &ConfettiParams, mut rng: StdRng) -> Self {
        let particles = (0..params.count).map(|_| Particle::spawn(&mut rng)).collect();
        Self {
            particles,
            proxies: None,
            ground_y: params.ground_y,
            rng,
        }
    }

    /// One-shot activation with the collision snapshot for this run.
    /// Re-activation is ignored; the first snapshot stands.
    pub fn activate(&mut self, proxies: CollisionProxySet) {
        if self.proxies.is_some() {
            log::warn!("confetti already active, ignoring re-activation");
            return;
        }
        log::debug!("confetti activated with {} collision proxies", proxies.len());
        self.proxies = Some(proxies);
    }

    pub fn is_active(&self) -> bool {
        self.proxies.is_some()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn landed_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_landed()).count()
    }

    pub fn all_landed(&self) -> bool {
        self.particles.iter().all(|p| p.is_landed())
    }

    /// Advance the whole pool by one frame. Dormant until activated.
    ///
    /// `scene` provides both the segment casts for falling particles and
    /// the current parent transforms for attached ones.
    pub fn step<S: RayQuery + TransformSource>(&mut self, dt: f64, scene: &S) {
        if self.proxies.is_none() {
            return;
        }
        let dt = dt.min(MAX_DT);

        for i in 0..self.particles.len() {
            match self.particles[i].state {
                ParticleState::Falling => self.step_falling(i, dt, scene),
                ParticleState::LandedAttached { parent, relative } => {
                    // Re-derive world pose from the parent's current
                    // transform; follows translation and animated fades
                    // without re-running physics.
                    if let Some(parent_world) = scene.world_transform(parent) {
                        let world = parent_world * relative;
                        let p = &mut self.particles[i];
                        p.position = Point3::from(world.translation.vector);
                        p.orientation = world.rotation;
                    }
                }
                ParticleState::LandedFree => {}
            }
        }
    }

    fn step_falling<S: RayQuery + TransformSource>(&mut self, index: usize, dt: f64, scene: &S) {
        let Some(proxies) = self.proxies.as_ref() else {
            return;
        };
        let p = &mut self.particles[index];

        // Gravity with a terminal-velocity floor; lateral drag each tick
        p.velocity.y = (p.velocity.y + GRAVITY * dt).max(TERMINAL_VELOCITY);
        p.velocity.x *= LATERAL_DRAG;
        p.velocity.z *= LATERAL_DRAG;

        let candidate = p.position + p.velocity * dt;
        p.orientation = UnitQuaternion::from_scaled_axis(p.angular_velocity * dt) * p.orientation;

        let delta = candidate - p.position;
        let travel = delta.norm();
        if travel <= MIN_TRAVEL {
            // At rest this tick; nothing to sweep (and no zero-length ray)
            p.position = candidate;
            return;
        }

        let direction = delta / travel;
        let hits = scene.cast_segment(p.position, direction, travel, proxies);

        if let Some(hit) = hits.first() {
            // Land on the first intersection along the path, never beyond
            let normal = if hit.normal.norm_squared() < 1e-12 {
                Vector3::y()
            } else {
                hit.normal.normalize()
            };
            p.position = hit.point + normal * LANDING_EPSILON;
            let roll = self.rng.random::<f64>() * std::f64::consts::TAU;
            p.orientation = orient_to_normal(&normal, roll);

            // Pose expressed in the parent's current local frame, so later
            // ticks re-derive world pose purely from the parent transform
            let relative = match scene.world_transform(hit.object) {
                Some(parent_world) => parent_world.inverse() * p.pose(),
                None => p.pose(),
            };
            p.state = ParticleState::LandedAttached {
                parent: hit.object,
                relative,
            };
        } else if candidate.y < self.ground_y {
            // Ground-plane fallback: lie flat with a random yaw
            p.position = Point3::new(candidate.x, self.ground_y + LANDING_EPSILON, candidate.z);
            let yaw = self.rng.random::<f64>() * std::f64::consts::TAU;
            p.orientation = orient_to_normal(&Vector3::y(), yaw);
            p.velocity = Vector3::zeros();
            p.state = ParticleState::LandedFree;
        } else {
            p.position = candidate;
        }
    }

    /// GPU-uploadable instance matrices for the whole pool.
    pub fn instances(&self) -> Vec<InstanceRaw> {
        self.particles
            .iter()
            .map(|p| InstanceRaw::from_pose(&p.pose(), p.scale))
            .collect()
    }

    /// Per-instance colors (rgba, opaque).
    pub fn colors(&self) -> Vec<[f32; 4]> {
        self.particles
            .iter()
            .map(|p| [p.color[0], p.color[1], p.color[2], 1.0])
            .collect()
    }
}

/// Orientation flush against a surface normal (local +Z onto the normal)
/// with an extra roll about that normal for varied resting poses.
fn orient_to_normal(normal: &Vector3<f64>, roll: f64) -> UnitQuaternion<f64> {
    let align = UnitQuaternion::rotation_between(&Vector3::z(), normal).unwrap_or_else(|| {
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI)
    });
    let axis = Unit::new_normalize(*normal);
    UnitQuaternion::from_axis_angle(&axis, roll) * align
}
