//! Exclusive pointer-stream ownership between camera navigation and
//! surface polishing, switched at pointer-down/up boundaries.

/// Who consumes pointer events right now. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOwner {
    /// Orbit/camera controls receive the stream (the idle default).
    Camera,
    /// The polishable surface captured the stream on pointer-down.
    Surface,
}

/// Pointer hand-off state machine.
///
/// A pointer-down that hits the polishable surface captures the stream and
/// suspends camera input until the matching pointer-up releases it. A down
/// that misses leaves the camera in charge for the whole drag.
#[derive(Debug)]
pub struct PointerRouter {
    owner: PointerOwner,
}

impl Default for PointerRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerRouter {
    pub fn new() -> Self {
        Self {
            owner: PointerOwner::Camera,
        }
    }

    /// Route a pointer-down. `surface_hit` is whether the pick ray struck
    /// the polishable object. Returns the owner for the ensuing drag.
    pub fn pointer_down(&mut self, surface_hit: bool) -> PointerOwner {
        self.owner = if surface_hit {
            PointerOwner::Surface
        } else {
            PointerOwner::Camera
        };
        self.owner
    }

    /// Pointer-up always restores camera ownership.
    pub fn pointer_up(&mut self) {
        self.owner = PointerOwner::Camera;
    }

    pub fn owner(&self) -> PointerOwner {
        self.owner
    }

    /// Hosts gate their orbit controls on this.
    pub fn camera_enabled(&self) -> bool {
        self.owner == PointerOwner::Camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_down_on_surface_suspends_camera() {
        let mut router = PointerRouter::new();
        assert!(router.camera_enabled());
        assert_eq!(router.pointer_down(true), PointerOwner::Surface);
        assert!(!router.camera_enabled());
        router.pointer_up();
        assert!(router.camera_enabled());
    }

    #[test]
    fn test_down_on_background_keeps_camera() {
        let mut router = PointerRouter::new();
        assert_eq!(router.pointer_down(false), PointerOwner::Camera);
        assert!(router.camera_enabled());
        router.pointer_up();
        assert!(router.camera_enabled());
    }

    #[test]
    fn test_ownership_switches_per_drag_not_mid_drag() {
        let mut router = PointerRouter::new();
        router.pointer_down(true);
        // No event between down and up changes the owner
        assert_eq!(router.owner(), PointerOwner::Surface);
        router.pointer_up();
        router.pointer_down(false);
        assert_eq!(router.owner(), PointerOwner::Camera);
    }
}
