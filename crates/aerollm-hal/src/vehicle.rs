//! [`VehicleState`] – read-only access to the live vehicle pose.
//!
//! Hosts implement this trait over whatever owns the vehicle transform.  The
//! scheduler samples it once per tick from its own task, so implementations
//! must be cheap and must not block.

use aerollm_types::Vec3;

/// Position and orientation basis of the vehicle at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    /// Unit vector along the nose.
    pub forward: Vec3,
    /// Unit vector out of the canopy.
    pub up: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::new(0.0, 0.0, 1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

/// A source of live vehicle pose.
pub trait VehicleState: Send + Sync {
    /// Return a consistent snapshot of the current pose.
    fn pose(&self) -> Pose;
}
