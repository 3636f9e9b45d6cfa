//! Queue broker abstraction
//!
//! The broker is the only synchronization point between the controller and
//! the game server: named list channels with push, blocking pop and clear.
//! Within a channel messages are delivered in push order.

use async_trait::async_trait;
use lol_rl_core::Result;
use std::time::Duration;

/// Channel names shared with the game server
pub mod channel {
    /// Server -> controller: readiness signals, then observations
    pub const OBSERVATION: &str = "observation";
    /// Controller -> server: player actions
    pub const ACTION: &str = "action";
    /// Controller -> server: control commands
    pub const COMMAND: &str = "command";
}

/// A message taken off a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: String,
    pub payload: String,
}

/// Shared, multi-consumer blocking message queue
#[async_trait]
pub trait QueueBroker: Send + Sync {
    /// Enqueue a message (fire-and-forget)
    async fn push(&self, channel: &str, message: &str) -> Result<()>;

    /// Enqueue several messages in order.
    ///
    /// Implementations that can do so push the whole batch atomically, so a
    /// consumer never sees another producer's message between them.
    async fn push_all(&self, channel: &str, messages: &[String]) -> Result<()> {
        for message in messages {
            self.push(channel, message).await?;
        }
        Ok(())
    }

    /// Block until a message is available or `timeout` elapses.
    /// Returns `None` on timeout.
    async fn blocking_pop(&self, channel: &str, timeout: Duration) -> Result<Option<Delivery>>;

    /// Discard any pending messages
    async fn clear(&self, channel: &str) -> Result<()>;
}
