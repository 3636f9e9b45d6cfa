//! Out-of-band control commands
//!
//! `StartObserving` and `ChangeChampion` flow from the controller to the
//! server on the `command` channel. `ClientsJoin` and `GameStarted` are the
//! readiness signals the server sends on the `observation` channel during
//! the handshake.

use serde::{Deserialize, Serialize};

use crate::action::PlayerId;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Command {
    /// Ask the server to begin producing observations
    StartObserving,
    /// Server is ready for the rendering client to join
    ClientsJoin,
    /// Game has started and agents may act
    GameStarted,
    /// Swap the champion a player controls
    ChangeChampion(ChangeChampionPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeChampionPayload {
    pub player_id: PlayerId,
    pub champion_name: String,
}

impl Command {
    pub fn change_champion(player_id: PlayerId, champion_name: impl Into<String>) -> Self {
        Command::ChangeChampion(ChangeChampionPayload {
            player_id,
            champion_name: champion_name.into(),
        })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Command::StartObserving => "start_observing",
            Command::ClientsJoin => "clients_join",
            Command::GameStarted => "game_started",
            Command::ChangeChampion(_) => "change_champion",
        }
    }

    /// Look up a payload-less command by its tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "start_observing" => Some(Command::StartObserving),
            "clients_join" => Some(Command::ClientsJoin),
            "game_started" => Some(Command::GameStarted),
            _ => None,
        }
    }

    /// JSON payload for the legacy paired encoding, `None` for bare tags
    pub fn payload_json(&self) -> Result<Option<String>> {
        match self {
            Command::ChangeChampion(p) => Ok(Some(serde_json::to_string(p)?)),
            _ => Ok(None),
        }
    }
}
