//! Observation types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

/// Decoded snapshot of the game state
///
/// Only `champ_units` is interpreted by the controller; everything else the
/// server sends is preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Seconds since the game started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_time: Option<f64>,

    /// Champion units visible to the observer
    #[serde(default)]
    pub champ_units: Vec<ChampUnit>,

    /// Additional server-specific fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A champion unit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampUnit {
    /// 0.0 when dead, non-zero when alive
    pub alive: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_mp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_gold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_xp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_count: Option<f64>,

    /// Remaining numeric fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ChampUnit {
    pub fn is_dead(&self) -> bool {
        self.alive == 0.0
    }
}

impl Observation {
    /// True iff any champion unit has `alive == 0.0`
    pub fn someone_died(&self) -> bool {
        self.champ_units.iter().any(ChampUnit::is_dead)
    }

    /// Decode a payload from the `observation` channel.
    ///
    /// Accepts both a bare observation and one wrapped as
    /// `{"observation": {...}}`.
    pub fn from_json(payload: &str) -> Result<Self> {
        let frame: ObservationFrame = serde_json::from_str(payload)?;
        Ok(match frame {
            ObservationFrame::Wrapped { observation } => observation,
            ObservationFrame::Bare(observation) => observation,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ObservationFrame {
    Wrapped { observation: Observation },
    Bare(Observation),
}
