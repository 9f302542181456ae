//! [`ActuatorCommand`] – the clamped control vector applied to the vehicle.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Control-surface and throttle positions.
///
/// | field | range |
/// |---|---|
/// | `aileron`, `elevator`, `rudder` | `[-1, 1]` |
/// | `throttle`, `airbrake`, `wheel_brakes` | `[0, 1]` |
///
/// Values coming from the model pass through [`ActuatorCommand::clamped`]
/// before they are published. NaN becomes `0.0`; infinities saturate at the
/// nearest bound.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActuatorCommand {
    /// Roll control.
    #[schemars(range(min = -1.0, max = 1.0))]
    pub aileron: f32,
    /// Pitch control.
    #[schemars(range(min = -1.0, max = 1.0))]
    pub elevator: f32,
    /// Yaw control.
    #[schemars(range(min = -1.0, max = 1.0))]
    pub rudder: f32,
    /// Forward thrust fraction.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub throttle: f32,
    /// Aerodynamic brake fraction.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub airbrake: f32,
    /// Ground brake fraction.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub wheel_brakes: f32,
}

/// Bounds for the signed control surfaces.
pub const SURFACE_RANGE: (f32, f32) = (-1.0, 1.0);
/// Bounds for the fractional controls.
pub const FRACTION_RANGE: (f32, f32) = (0.0, 1.0);

impl ActuatorCommand {
    /// All fields zero: surfaces centred, no thrust, no braking.
    pub const ZERO: Self = Self {
        aileron: 0.0,
        elevator: 0.0,
        rudder: 0.0,
        throttle: 0.0,
        airbrake: 0.0,
        wheel_brakes: 0.0,
    };

    /// Return a copy with every field forced into its declared range.
    ///
    /// Idempotent: `c.clamped().clamped() == c.clamped()`.
    pub fn clamped(self) -> Self {
        Self {
            aileron: clamp_field(self.aileron, SURFACE_RANGE),
            elevator: clamp_field(self.elevator, SURFACE_RANGE),
            rudder: clamp_field(self.rudder, SURFACE_RANGE),
            throttle: clamp_field(self.throttle, FRACTION_RANGE),
            airbrake: clamp_field(self.airbrake, FRACTION_RANGE),
            wheel_brakes: clamp_field(self.wheel_brakes, FRACTION_RANGE),
        }
    }

    /// `true` when every field already lies within its range.
    pub fn is_within_limits(&self) -> bool {
        let in_range = |v: f32, (lo, hi): (f32, f32)| v >= lo && v <= hi;
        in_range(self.aileron, SURFACE_RANGE)
            && in_range(self.elevator, SURFACE_RANGE)
            && in_range(self.rudder, SURFACE_RANGE)
            && in_range(self.throttle, FRACTION_RANGE)
            && in_range(self.airbrake, FRACTION_RANGE)
            && in_range(self.wheel_brakes, FRACTION_RANGE)
    }
}

fn clamp_field(value: f32, (lo, hi): (f32, f32)) -> f32 {
    if value.is_nan() {
        // 0 lies inside every range.
        return 0.0;
    }
    value.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extreme(v: f32) -> ActuatorCommand {
        ActuatorCommand {
            aileron: v,
            elevator: v,
            rudder: v,
            throttle: v,
            airbrake: v,
            wheel_brakes: v,
        }
    }

    #[test]
    fn default_is_zero_command() {
        assert_eq!(ActuatorCommand::default(), ActuatorCommand::ZERO);
        assert!(ActuatorCommand::ZERO.is_within_limits());
    }

    #[test]
    fn clamp_boundary_cases() {
        let c = ActuatorCommand {
            aileron: 2.0,
            elevator: -2.0,
            throttle: -0.5,
            airbrake: 1.5,
            ..ActuatorCommand::ZERO
        }
        .clamped();
        assert_eq!(c.aileron, 1.0);
        assert_eq!(c.elevator, -1.0);
        assert_eq!(c.throttle, 0.0);
        assert_eq!(c.airbrake, 1.0);
    }

    #[test]
    fn in_range_values_pass_through() {
        let c = ActuatorCommand {
            aileron: -0.25,
            elevator: 0.5,
            rudder: 1.0,
            throttle: 0.75,
            airbrake: 0.0,
            wheel_brakes: 1.0,
        };
        assert_eq!(c.clamped(), c);
    }

    #[test]
    fn clamping_is_idempotent_and_bounded() {
        for v in [
            -1e9_f32,
            -3.0,
            -1.0,
            -0.3,
            0.0,
            0.4,
            1.0,
            7.5,
            f32::MAX,
            f32::MIN,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::NAN,
        ] {
            let once = extreme(v).clamped();
            assert!(once.is_within_limits(), "out of range for input {v}");
            assert_eq!(once.clamped(), once, "not idempotent for input {v}");
        }
    }

    #[test]
    fn infinities_saturate_at_bounds() {
        let hi = extreme(f32::INFINITY).clamped();
        assert_eq!(hi.aileron, 1.0);
        assert_eq!(hi.throttle, 1.0);
        let lo = extreme(f32::NEG_INFINITY).clamped();
        assert_eq!(lo.rudder, -1.0);
        assert_eq!(lo.wheel_brakes, 0.0);
    }

    #[test]
    fn nan_becomes_zero() {
        let c = extreme(f32::NAN).clamped();
        assert_eq!(c, ActuatorCommand::ZERO);
    }

    #[test]
    fn serializes_wheel_brakes_in_camel_case() {
        let json = serde_json::to_string(&ActuatorCommand::ZERO).unwrap();
        assert!(json.contains("\"wheelBrakes\""));
        assert!(!json.contains("wheel_brakes"));
    }

    #[test]
    fn schema_lists_every_field() {
        let schema = serde_json::to_string(&schemars::schema_for!(ActuatorCommand)).unwrap();
        for field in ["aileron", "elevator", "rudder", "throttle", "airbrake", "wheelBrakes"] {
            assert!(schema.contains(field), "schema missing {field}");
        }
    }
}
