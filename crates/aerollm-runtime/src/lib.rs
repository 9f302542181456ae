//! `aerollm-runtime` – the actuator polling and command-application pipeline.
//!
//! On a fixed cadence the scheduler samples the vehicle, asks an
//! OpenAI-compatible chat endpoint what to do, digs a JSON object out of the
//! reply, clamps it into a safe [`ActuatorCommand`][aerollm_types::ActuatorCommand]
//! and publishes it to the vehicle's [`CommandSlot`][aerollm_hal::CommandSlot].
//!
//! # Modules
//!
//! - [`chat_client`] – [`ChatClient`][chat_client::ChatClient]: one
//!   `POST {base_url}/chat/completions` per call, with bearer auth, timeout
//!   and cancellation.  Implements the [`ChatTransport`][chat_client::ChatTransport]
//!   seam the scheduler depends on.
//! - [`deadline`] – [`Deadline`][deadline::Deadline]: a per-request timeout
//!   linked to the loop's cancellation token; whichever fires first wins.
//! - [`extract`] – [`extract_json_object`][extract::extract_json_object]:
//!   first-`{` to last-`}` substring heuristic.
//! - [`command_parser`] – [`parse_command`][command_parser::parse_command]:
//!   comment-tolerant, default-zero, clamping decoder.
//! - [`prompt`] – system prompt (with the command JSON Schema) and the
//!   per-tick observation message.
//! - [`scheduler`] – [`PollingScheduler`][scheduler::PollingScheduler]: the
//!   `Idle → Running → Idle` tick loop.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.

pub mod chat_client;
pub mod command_parser;
pub mod deadline;
pub mod extract;
pub mod prompt;
pub mod scheduler;
pub mod telemetry;

pub use chat_client::{
    ChatClient, ChatMessage, ChatTransport, CompletionRequest, EndpointConfig, Role, Sampling,
};
pub use command_parser::{parse_command, parse_reply};
pub use deadline::Deadline;
pub use extract::extract_json_object;
pub use scheduler::{PollingScheduler, SchedulerConfig, SchedulerState, StatsSnapshot};
pub use telemetry::{init_tracing, TracerProviderGuard};
