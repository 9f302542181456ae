//! `aerollm-types` – shared data model for the AeroLLM control loop.
//!
//! # Modules
//!
//! - [`command`] – [`ActuatorCommand`][command::ActuatorCommand]: the six
//!   clamped control-surface and throttle positions sent to the vehicle.
//! - [`observation`] – [`Observation`][observation::Observation] and
//!   [`Vec3`][observation::Vec3]: the per-tick vehicle snapshot sent to the
//!   model.
//!
//! The workspace-wide error type [`PilotError`] lives here so every crate
//! reports failures in the same vocabulary.

pub mod command;
pub mod observation;

pub use command::ActuatorCommand;
pub use observation::{Observation, Vec3};

use thiserror::Error;

/// Why an in-flight request or tick wait was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The per-request timeout elapsed.
    Timeout,
    /// The owning control loop was stopped.
    Stopped,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::Timeout => write!(f, "request timed out"),
            CancelReason::Stopped => write!(f, "control loop stopped"),
        }
    }
}

/// Every failure the polling pipeline can surface.
///
/// None of these are fatal to a running loop: the scheduler reports them at
/// the tick boundary and moves on. Only [`PilotError::Configuration`] at
/// start-up and [`CancelReason::Stopped`] end the loop.
#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-success HTTP status (`status` set) or a network-level failure
    /// (`status` is `None`).
    #[error("Transport error (status {}): {body}", fmt_status(.status))]
    Transport { status: Option<u16>, body: String },

    #[error("Cancelled: {0}")]
    Cancelled(CancelReason),

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("No JSON object found in model reply")]
    Extraction,

    #[error("Command parse error: {0}")]
    Parse(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "n/a".to_string(), |s| s.to_string())
}

impl PilotError {
    /// `true` when this error means the loop was deliberately stopped.
    pub fn is_stop(&self) -> bool {
        matches!(self, PilotError::Cancelled(CancelReason::Stopped))
    }
}
