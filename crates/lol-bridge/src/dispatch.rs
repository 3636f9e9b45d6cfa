//! Action and command dispatch
//!
//! Every action goes to the `action` channel and every control command to
//! the `command` channel, encoded per [`WireFormat`]. The frames of one
//! message are pushed as a single batch, tag first.

use crate::broker::{QueueBroker, channel};
use crate::protocol::{WireFormat, encode_action, encode_command};
use lol_rl_core::{Action, Command, Result};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    wire_format: WireFormat,
    log_actions: bool,
}

impl ActionDispatcher {
    pub fn new(wire_format: WireFormat, log_actions: bool) -> Self {
        Self {
            wire_format,
            log_actions,
        }
    }

    /// Push one action
    pub async fn send<B: QueueBroker + ?Sized>(&self, broker: &B, action: &Action) -> Result<()> {
        let frames = encode_action(action, self.wire_format)?;
        if self.log_actions {
            info!("Action {}: {:?}", action.tag(), frames);
        } else {
            debug!("Action {}", action.tag());
        }
        broker.push_all(channel::ACTION, &frames).await
    }

    /// Push `n` independent noops, one message each
    pub async fn send_noops<B: QueueBroker + ?Sized>(&self, broker: &B, n: usize) -> Result<()> {
        for _ in 0..n {
            self.send(broker, &Action::Noop).await?;
        }
        Ok(())
    }

    /// Push one control command
    pub async fn send_command<B: QueueBroker + ?Sized>(
        &self,
        broker: &B,
        command: &Command,
    ) -> Result<()> {
        let frames = encode_command(command, self.wire_format)?;
        if self.log_actions {
            info!("Command {}: {:?}", command.tag(), frames);
        }
        broker.push_all(channel::COMMAND, &frames).await
    }
}
