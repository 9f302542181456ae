//! [`SimVehicle`] – in-process vehicle stand-in for headless runs and tests.
//!
//! Holds a pose that callers move explicitly with [`SimVehicle::set_pose`].
//! It does not integrate commands into motion; that belongs to the host.

use std::sync::RwLock;

use aerollm_types::Vec3;

use crate::vehicle::{Pose, VehicleState};

/// A simulated vehicle whose pose is set by hand.
#[derive(Debug, Default)]
pub struct SimVehicle {
    pose: RwLock<Pose>,
}

impl SimVehicle {
    /// Create a vehicle at `pose`.
    pub fn new(pose: Pose) -> Self {
        Self {
            pose: RwLock::new(pose),
        }
    }

    /// Create a level vehicle at `position`.
    pub fn at(position: Vec3) -> Self {
        Self::new(Pose {
            position,
            ..Pose::default()
        })
    }

    /// Replace the current pose.
    pub fn set_pose(&self, pose: Pose) {
        match self.pose.write() {
            Ok(mut guard) => *guard = pose,
            Err(poisoned) => *poisoned.into_inner() = pose,
        }
    }

    /// Move the vehicle to `position`, keeping its orientation.
    pub fn set_position(&self, position: Vec3) {
        let mut pose = self.pose();
        pose.position = position;
        self.set_pose(pose);
    }
}

impl VehicleState for SimVehicle {
    fn pose(&self) -> Pose {
        match self.pose.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_vehicle_reports_initial_pose() {
        let vehicle = SimVehicle::at(Vec3::new(5.0, 100.0, -3.0));
        let pose = vehicle.pose();
        assert_eq!(pose.position, Vec3::new(5.0, 100.0, -3.0));
        assert_eq!(pose.up, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn set_position_keeps_orientation() {
        let vehicle = SimVehicle::new(Pose {
            position: Vec3::ZERO,
            forward: Vec3::new(1.0, 0.0, 0.0),
            up: Vec3::new(0.0, 0.0, 1.0),
        });
        vehicle.set_position(Vec3::new(2.0, 2.0, 2.0));
        let pose = vehicle.pose();
        assert_eq!(pose.position, Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(pose.forward, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(pose.up, Vec3::new(0.0, 0.0, 1.0));
    }
}
