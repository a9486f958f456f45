//! Single confetti particle: pose, motion state, landing variants.

use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};
use polishsim_core::ObjectId;
use rand::rngs::StdRng;
use rand::Rng;

/// Downward acceleration (world units/s²). Deliberately gentler than real
/// gravity so the celebration reads as fluttering paper, not hail.
pub const GRAVITY: f64 = -2.5;
/// Fall-speed floor (terminal velocity).
pub const TERMINAL_VELOCITY: f64 = -5.0;
/// Per-tick multiplicative drag on lateral velocity.
pub const LATERAL_DRAG: f64 = 0.99;
/// Horizontal extent of the spawn volume.
pub const SPREAD_XZ: f64 = 4.0;
/// Bottom of the spawn volume.
pub const SPAWN_Y: f64 = 6.0;
/// Vertical jitter above `SPAWN_Y`, so the pool doesn't land all at once.
pub const SPAWN_Y_JITTER: f64 = 5.0;
/// Offset along the hit normal when landing, to dodge coplanar artifacts.
pub const LANDING_EPSILON: f64 = 0.01;
/// Travel distances below this skip the collision sweep.
pub const MIN_TRAVEL: f64 = 1e-5;

/// Fixed celebration palette (linear RGB).
pub const PALETTE: [[f32; 3]; 7] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];

/// Motion state. Both landed variants are terminal for a celebration run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleState {
    Falling,
    /// Came to rest on the ground plane; pose is frozen.
    LandedFree,
    /// Came to rest on a scene proxy; world pose is re-derived every tick
    /// from the parent's current transform composed with the pose the
    /// particle had in the parent's frame at the moment of landing.
    LandedAttached {
        parent: ObjectId,
        relative: Isometry3<f64>,
    },
}

/// One pooled particle, mutated in place every tick.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Point3<f64>,
    pub velocity: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub angular_velocity: Vector3<f64>,
    pub color: [f32; 3],
    pub scale: f64,
    pub state: ParticleState,
}

impl Particle {
    /// Randomized spawn within the volume above the scene.
    pub fn spawn(rng: &mut StdRng) -> Self {
        let position = Point3::new(
            (rng.random::<f64>() - 0.5) * SPREAD_XZ,
            SPAWN_Y + rng.random::<f64>() * SPAWN_Y_JITTER,
            (rng.random::<f64>() - 0.5) * SPREAD_XZ,
        );
        let velocity = Vector3::new(
            (rng.random::<f64>() - 0.5) * 3.0,
            -0.5 - rng.random::<f64>(),
            (rng.random::<f64>() - 0.5) * 3.0,
        );
        let orientation = UnitQuaternion::from_euler_angles(
            rng.random::<f64>() * std::f64::consts::TAU,
            rng.random::<f64>() * std::f64::consts::TAU,
            rng.random::<f64>() * std::f64::consts::TAU,
        );
        let angular_velocity = Vector3::new(
            (rng.random::<f64>() - 0.5) * 10.0,
            (rng.random::<f64>() - 0.5) * 10.0,
            (rng.random::<f64>() - 0.5) * 10.0,
        );
        let color = PALETTE[rng.random_range(0..PALETTE.len())];
        let scale = 0.15 + rng.random::<f64>() * 0.1;

        Self {
            position,
            velocity,
            orientation,
            angular_velocity,
            color,
            scale,
            state: ParticleState::Falling,
        }
    }

    pub fn is_landed(&self) -> bool {
        !matches!(self.state, ParticleState::Falling)
    }

    /// Current world pose as an isometry.
    pub fn pose(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.position.coords.into(), self.orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_spawn_within_volume() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let p = Particle::spawn(&mut rng);
            assert!(p.position.x.abs() <= SPREAD_XZ / 2.0);
            assert!(p.position.z.abs() <= SPREAD_XZ / 2.0);
            assert!(p.position.y >= SPAWN_Y && p.position.y <= SPAWN_Y + SPAWN_Y_JITTER);
            assert!(p.velocity.y < 0.0, "spawns moving downward");
            assert!(p.scale >= 0.15 && p.scale <= 0.25);
            assert_eq!(p.state, ParticleState::Falling);
        }
    }

    #[test]
    fn test_spawn_colors_from_palette() {
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..50 {
            let p = Particle::spawn(&mut rng);
            assert!(PALETTE.contains(&p.color));
        }
    }
}
