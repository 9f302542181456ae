//! Prompt construction: the fixed system prompt and the per-tick
//! observation message.

use aerollm_types::{ActuatorCommand, Observation};
use schemars::schema_for;

use crate::chat_client::ChatMessage;

/// Default instructions sent as the system message.  The JSON Schema of
/// [`ActuatorCommand`] is appended so the model sees exact field names and
/// ranges.
pub fn default_system_prompt() -> String {
    let schema = serde_json::to_string_pretty(&schema_for!(ActuatorCommand))
        .unwrap_or_else(|_| "(schema unavailable)".to_string());
    format!(
        "You are the autopilot of a small fixed-wing aircraft.\n\
         Each message contains an observation of the aircraft: position, \
         forward and up unit vectors, estimated velocity (world units per \
         second) and the command currently applied.\n\
         Reply with ONE JSON object holding the next control command. Fields:\n\
         - aileron, elevator, rudder: -1 to 1\n\
         - throttle, airbrake, wheelBrakes: 0 to 1\n\
         Omitted fields are treated as 0. Do not add prose outside the object.\n\
         ## Command schema\n{schema}\n"
    )
}

/// Render `observation` as the user-turn content.
pub fn observation_message(observation: &Observation) -> String {
    let json = serde_json::to_string(observation)
        .unwrap_or_else(|_| "(serialisation error)".to_string());
    format!("Observation: {json}\nWhat is your next command?")
}

/// Build the two-message conversation for one tick.  Nothing carries over
/// between ticks.
pub fn build_conversation(system_prompt: &str, observation: &Observation) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(observation_message(observation)),
    ]
}
