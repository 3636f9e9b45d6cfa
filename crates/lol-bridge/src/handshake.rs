//! Session handshake
//!
//! Run once per session:
//!
//! ```text
//! Init --clients_join--> WaitGameStarted --game_started--> Ready
//!   \                         \
//!    `--timeout / other ------`--> Failed
//! ```
//!
//! The rendering client is spawned on the `Init -> WaitGameStarted` edge.
//! Each step waits on its own timeout: server startup and client load time
//! are unrelated.

use crate::broker::{QueueBroker, channel};
use crate::process::ProcessSupervisor;
use lol_rl_core::{Command, LolRlError, Result};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Init,
    WaitGameStarted,
    Ready,
    Failed,
}

#[derive(Debug)]
pub struct Handshake {
    state: HandshakeState,
    clients_join_timeout: Duration,
    game_started_timeout: Duration,
}

impl Handshake {
    pub fn new(clients_join_timeout: Duration, game_started_timeout: Duration) -> Self {
        Self {
            state: HandshakeState::Init,
            clients_join_timeout,
            game_started_timeout,
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Signal awaited in the current state, with its wait bound
    pub fn expected(&self) -> Option<(Command, Duration)> {
        match self.state {
            HandshakeState::Init => Some((Command::ClientsJoin, self.clients_join_timeout)),
            HandshakeState::WaitGameStarted => {
                Some((Command::GameStarted, self.game_started_timeout))
            }
            HandshakeState::Ready | HandshakeState::Failed => None,
        }
    }

    /// Apply the outcome of one wait: `None` for a timeout, otherwise the
    /// raw payload popped from the `observation` channel.
    pub fn advance(&mut self, received: Option<&str>) -> Result<HandshakeState> {
        let Some((expected, waited)) = self.expected() else {
            return Ok(self.state);
        };

        let outcome = match received {
            None => Err(LolRlError::HandshakeTimeout {
                expected: expected.tag(),
                waited,
            }),
            Some(payload) => match serde_json::from_str::<serde_json::Value>(payload) {
                Err(e) => Err(e.into()),
                Ok(value) => {
                    let command = value.as_str().and_then(Command::from_tag);
                    if command.as_ref() == Some(&expected) {
                        Ok(())
                    } else {
                        Err(LolRlError::HandshakeProtocolViolation {
                            expected: expected.tag(),
                            received: payload.chars().take(120).collect(),
                        })
                    }
                }
            },
        };

        match outcome {
            Ok(()) => {
                self.state = match self.state {
                    HandshakeState::Init => HandshakeState::WaitGameStarted,
                    _ => HandshakeState::Ready,
                };
                debug!("Handshake received `{}`, now {:?}", expected.tag(), self.state);
                Ok(self.state)
            }
            Err(e) => {
                self.state = HandshakeState::Failed;
                Err(e)
            }
        }
    }

    /// Drive the handshake to `Ready` or the first failure
    pub async fn run<B, S>(&mut self, broker: &B, supervisor: &mut S) -> Result<()>
    where
        B: QueueBroker + ?Sized,
        S: ProcessSupervisor + ?Sized,
    {
        if self.state == HandshakeState::Failed {
            return Err(LolRlError::SessionClosed);
        }

        while let Some((expected, timeout)) = self.expected() {
            debug!("Waiting up to {:?} for `{}`", timeout, expected.tag());

            let delivery = match broker.blocking_pop(channel::OBSERVATION, timeout).await {
                Ok(delivery) => delivery,
                Err(e) => {
                    self.state = HandshakeState::Failed;
                    return Err(e);
                }
            };

            let next = self.advance(delivery.as_ref().map(|d| d.payload.as_str()))?;
            if next == HandshakeState::WaitGameStarted {
                info!("Clients can join, starting rendering client");
                if let Err(e) = supervisor.spawn_client().await {
                    self.state = HandshakeState::Failed;
                    return Err(e);
                }
            }
        }

        info!("Game started, agents may act");
        Ok(())
    }
}
