//! [`Observation`] – the vehicle snapshot sent to the model each tick.

use std::ops::{Mul, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::ActuatorCommand;

/// Smallest elapsed time used when estimating velocity, so two samples taken
/// back to back do not blow the estimate up.
pub const MIN_VELOCITY_DT: Duration = Duration::from_millis(1);

/// A plain 3-component vector in the host's world frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Per-tick snapshot of the vehicle. Built fresh each tick and dropped once
/// the request has been sent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    /// Finite-difference estimate, see [`estimate_velocity`].
    pub velocity: Vec3,
    /// The command the vehicle is currently acting on.
    pub last_command: ActuatorCommand,
}

/// Estimate velocity as `(current - previous) / elapsed`.
///
/// `elapsed` is floored at [`MIN_VELOCITY_DT`].
pub fn estimate_velocity(previous: Vec3, current: Vec3, elapsed: Duration) -> Vec3 {
    let dt = elapsed.max(MIN_VELOCITY_DT).as_secs_f32();
    (current - previous) * (1.0 / dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_is_delta_over_time() {
        let v = estimate_velocity(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, -4.0, 2.0),
            Duration::from_secs(2),
        );
        assert!((v.x - 5.0).abs() < 1e-5);
        assert!((v.y + 2.0).abs() < 1e-5);
        assert!((v.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_elapsed_uses_floor() {
        let v = estimate_velocity(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Duration::ZERO);
        assert!(v.x.is_finite());
        assert!((v.x - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn observation_serializes_last_command() {
        let obs = Observation {
            position: Vec3::new(1.0, 2.0, 3.0),
            forward: Vec3::new(0.0, 0.0, 1.0),
            up: Vec3::new(0.0, 1.0, 0.0),
            velocity: Vec3::ZERO,
            last_command: ActuatorCommand {
                throttle: 0.5,
                ..ActuatorCommand::ZERO
            },
        };
        let json = serde_json::to_string(&obs).unwrap();
        assert!(json.contains("\"lastCommand\""));
        assert!(json.contains("\"throttle\":0.5"));
        let back: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obs);
    }
}
