//! [`CommandSlot`] – the vehicle's current-command location.
//!
//! Backed by a [`tokio::sync::watch`] channel: one value, no history, and
//! every reader sees either the previous command or the new one in full,
//! never a mix of fields from both.
//!
//! # Example
//!
//! ```rust
//! use aerollm_hal::{CommandSlot, CommandSource};
//! use aerollm_types::ActuatorCommand;
//!
//! let slot = CommandSlot::new();
//! assert_eq!(slot.current(), ActuatorCommand::ZERO);
//!
//! slot.publish(
//!     ActuatorCommand { throttle: 0.8, ..ActuatorCommand::ZERO },
//!     CommandSource::Manual,
//! );
//! assert_eq!(slot.current().throttle, 0.8);
//! ```

use std::sync::Arc;

use aerollm_types::ActuatorCommand;
use tokio::sync::watch;
use tracing::debug;

/// Who wrote the command currently held in the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    /// Nothing has been published yet; the slot holds the zero command.
    Initial,
    /// Published by the polling scheduler from a model reply.
    Model,
    /// Published by a manual / keyboard override outside the control loop.
    Manual,
}

/// The value held in a [`CommandSlot`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublishedCommand {
    pub command: ActuatorCommand,
    pub source: CommandSource,
    /// Incremented on every publish; `0` means nothing was published yet.
    pub sequence: u64,
}

/// Shared single-value command location.  Clone it cheaply – all clones
/// refer to the same slot.
#[derive(Clone, Debug)]
pub struct CommandSlot {
    sender: Arc<watch::Sender<PublishedCommand>>,
}

impl CommandSlot {
    /// Create a slot holding [`ActuatorCommand::ZERO`].
    pub fn new() -> Self {
        let (sender, _) = watch::channel(PublishedCommand {
            command: ActuatorCommand::ZERO,
            source: CommandSource::Initial,
            sequence: 0,
        });
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replace the current command.
    ///
    /// The command is clamped on the way in so the vehicle never sees an
    /// out-of-range value, whichever writer published it.
    pub fn publish(&self, command: ActuatorCommand, source: CommandSource) {
        let command = command.clamped();
        self.sender.send_modify(|slot| {
            slot.command = command;
            slot.source = source;
            slot.sequence += 1;
        });
        debug!(?command, ?source, "command published");
    }

    /// The command the vehicle should currently act on.
    pub fn current(&self) -> ActuatorCommand {
        self.sender.borrow().command
    }

    /// The full slot contents including writer and sequence number.
    pub fn latest(&self) -> PublishedCommand {
        *self.sender.borrow()
    }

    /// Subscribe to changes.  The receiver is marked as having seen the
    /// current value.
    pub fn subscribe(&self) -> watch::Receiver<PublishedCommand> {
        self.sender.subscribe()
    }
}

impl Default for CommandSlot {
    fn default() -> Self {
        Self::new()
    }
}
