//! Observation polling
//!
//! The first poll of a session resets the `action` and `observation`
//! channels and asks the server to start observing, so the server never
//! produces observations into a dirty channel. Every poll then waits for one
//! message on `observation`.

use crate::broker::{QueueBroker, channel};
use crate::protocol::{WireFormat, encode_command};
use lol_rl_core::{Command, Observation, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct ObservationPoller {
    timeout: Duration,
    wire_format: WireFormat,
    started: bool,
    last: Option<Observation>,
}

impl ObservationPoller {
    pub fn new(timeout: Duration, wire_format: WireFormat) -> Self {
        Self {
            timeout,
            wire_format,
            started: false,
            last: None,
        }
    }

    /// Whether `start_observing` has been sent this session
    pub fn started(&self) -> bool {
        self.started
    }

    /// Most recent observation delivered
    pub fn last(&self) -> Option<&Observation> {
        self.last.as_ref()
    }

    async fn start<B: QueueBroker + ?Sized>(&mut self, broker: &B) -> Result<()> {
        info!("Resetting channels and starting observation");
        broker.clear(channel::ACTION).await?;
        broker.clear(channel::OBSERVATION).await?;
        let frames = encode_command(&Command::StartObserving, self.wire_format)?;
        broker.push_all(channel::COMMAND, &frames).await?;
        self.started = true;
        Ok(())
    }

    /// Wait for the next observation. `Ok(None)` means the timeout elapsed.
    pub async fn poll<B: QueueBroker + ?Sized>(&mut self, broker: &B) -> Result<Option<Observation>> {
        if !self.started {
            self.start(broker).await?;
        }

        let Some(delivery) = broker.blocking_pop(channel::OBSERVATION, self.timeout).await? else {
            warn!("Observation timed out after {:?}", self.timeout);
            return Ok(None);
        };

        let observation = Observation::from_json(&delivery.payload)?;
        debug!(
            "Observation with {} champion units",
            observation.champ_units.len()
        );
        self.last = Some(observation.clone());
        Ok(Some(observation))
    }
}
