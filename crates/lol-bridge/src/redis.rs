//! Redis-backed queue broker
//!
//! Channels are Redis lists. Producers `LPUSH` and consumers `BRPOP`, so each
//! list behaves as a FIFO queue.

use crate::broker::{Delivery, QueueBroker};
use async_trait::async_trait;
use fred::prelude::*;
use lol_rl_core::{LolRlError, Result};
use std::time::Duration;
use tracing::{debug, info};

fn broker_err(err: fred::error::Error) -> LolRlError {
    LolRlError::Broker(err.to_string())
}

/// Connection to a Redis (or Redis-compatible) endpoint
#[derive(Clone)]
pub struct RedisBroker {
    client: Client,
    url: String,
}

impl RedisBroker {
    /// Connect to `redis://{host}:{port}/0`
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_url(&format!("redis://{}:{}/0", host, port)).await
    }

    /// Connect using a full Redis URL
    pub async fn connect_url(url: &str) -> Result<Self> {
        info!("Connecting to broker at {}", url);

        let config = Config::from_url(url)
            .map_err(|e| LolRlError::Config(format!("Invalid broker URL {}: {}", url, e)))?;
        let client = Builder::from_config(config)
            .build()
            .map_err(|e| LolRlError::BrokerConnection(e.to_string()))?;
        client
            .init()
            .await
            .map_err(|e| LolRlError::BrokerConnection(format!("{}: {}", url, e)))?;

        info!("Broker connected");
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Close the connection
    pub async fn disconnect(&self) {
        let _ = self.client.quit().await;
        info!("Broker disconnected from {}", self.url);
    }
}

#[async_trait]
impl QueueBroker for RedisBroker {
    async fn push(&self, channel: &str, message: &str) -> Result<()> {
        debug!("LPUSH {} {}", channel, message);
        let _: i64 = self.client.lpush(channel, message).await.map_err(broker_err)?;
        Ok(())
    }

    async fn push_all(&self, channel: &str, messages: &[String]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        debug!("LPUSH {} {:?}", channel, messages);
        // A multi-value LPUSH inserts left to right in one command, so BRPOP
        // still yields the batch in its original order.
        let _: i64 = self
            .client
            .lpush(channel, messages.to_vec())
            .await
            .map_err(broker_err)?;
        Ok(())
    }

    async fn blocking_pop(&self, channel: &str, timeout: Duration) -> Result<Option<Delivery>> {
        // BRPOP treats 0 as "wait forever"
        if timeout.is_zero() {
            return Err(LolRlError::Config(
                "Blocking pop timeout must be positive".to_string(),
            ));
        }

        let popped: Option<(String, String)> = self
            .client
            .brpop(channel, timeout.as_secs_f64())
            .await
            .map_err(broker_err)?;

        Ok(popped.map(|(channel, payload)| {
            let preview: String = payload.chars().take(200).collect();
            debug!("BRPOP {} -> {}", channel, preview);
            Delivery { channel, payload }
        }))
    }

    async fn clear(&self, channel: &str) -> Result<()> {
        debug!("DEL {}", channel);
        let _: i64 = self.client.del(channel).await.map_err(broker_err)?;
        Ok(())
    }
}
