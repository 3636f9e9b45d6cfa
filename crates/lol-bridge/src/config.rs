//! Controller configuration

use crate::process::LaunchSpec;
use crate::protocol::WireFormat;
use lol_rl_core::{LolRlError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 60.0;
pub const DEFAULT_GAME_STARTED_TIMEOUT_SECONDS: f64 = 60.0;

/// Configuration for one controller session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Broker host
    pub host: String,
    /// Broker port
    pub port: u16,
    /// Bound on observation polls and the `clients_join` wait
    pub timeout_seconds: f64,
    /// Bound on the `game_started` wait (rendering client load time)
    pub game_started_timeout_seconds: f64,
    /// Encoding of the `action` and `command` channels
    pub wire_format: WireFormat,
    /// Log every dispatched action at info level
    pub log_actions: bool,
    /// Game server launch
    pub server: LaunchSpec,
    /// Rendering client launch
    pub client: LaunchSpec,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            game_started_timeout_seconds: DEFAULT_GAME_STARTED_TIMEOUT_SECONDS,
            wire_format: WireFormat::default(),
            log_actions: false,
            server: LaunchSpec::default(),
            client: LaunchSpec::default(),
        }
    }
}

impl ControllerConfig {
    /// Create config with custom broker endpoint
    pub fn with_broker(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LolRlError::Config(format!("read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| LolRlError::Config(format!("parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Result<Duration> {
        wait_bound("timeout_seconds", self.timeout_seconds)
    }

    pub fn game_started_timeout(&self) -> Result<Duration> {
        wait_bound("game_started_timeout_seconds", self.game_started_timeout_seconds)
    }

    /// Reject settings that would make a wait unbounded
    pub fn validate(&self) -> Result<()> {
        self.timeout()?;
        self.game_started_timeout()?;
        if self.host.is_empty() {
            return Err(LolRlError::Config("host must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Seconds as a non-zero `Duration`. `BRPOP 0` never returns.
fn wait_bound(name: &str, secs: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) if !duration.is_zero() => Ok(duration),
        _ => Err(LolRlError::Config(format!(
            "{} must be a positive number of seconds, got {}",
            name, secs
        ))),
    }
}
