//! `aerollm-hal` – the vehicle side of the control loop.
//!
//! The control loop never touches the host's transform hierarchy or motion
//! integrator directly.  It reads the vehicle through [`VehicleState`] and
//! writes through a [`CommandSlot`]; everything else stays on the host.
//!
//! # Modules
//!
//! - [`vehicle`] – [`VehicleState`][vehicle::VehicleState]: read-only pose
//!   accessor sampled once per tick.
//! - [`command_slot`] – [`CommandSlot`][command_slot::CommandSlot]: the
//!   single current-command location that the scheduler (or a manual
//!   override) publishes into and the motion integrator reads from.
//! - [`sim`] – [`SimVehicle`][sim::SimVehicle]: an in-process stand-in for
//!   headless runs and tests.

pub mod command_slot;
pub mod sim;
pub mod vehicle;

pub use command_slot::{CommandSlot, CommandSource, PublishedCommand};
pub use sim::SimVehicle;
pub use vehicle::{Pose, VehicleState};
