//! Player actions sent to the game server

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Numeric player identifier assigned by the game server
pub type PlayerId = u32;

/// Scale applied to relative `move` offsets before transmission
pub const MOVE_SCALE: f64 = 100.0;

/// A single player action
///
/// Serializes as `{"type": "<tag>", "data": {...}}`. Coordinates are stored
/// exactly as they go on the wire, so [`Action::move_by`] applies
/// [`MOVE_SCALE`] at construction while `move_to` and `teleport` do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Action {
    /// Auto-attack another player
    Attack(AttackPayload),
    /// Cast a spell, optionally at a target or a location
    Spell(SpellPayload),
    /// Move relative to the current position
    Move(PositionPayload),
    /// Move to an absolute map position
    MoveTo(PositionPayload),
    /// Teleport to an absolute map position
    Teleport(PositionPayload),
    /// Reset every player to its spawn state
    Reset,
    /// Do nothing for one step
    Noop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackPayload {
    pub player_id: String,
    pub target_player_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellPayload {
    pub player_id: String,
    pub target_player_id: String,
    pub spell_slot: i64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionPayload {
    pub player_id: String,
    pub x: f64,
    pub y: f64,
}

impl Action {
    pub fn attack(player_id: PlayerId, target_player_id: PlayerId) -> Self {
        Action::Attack(AttackPayload {
            player_id: player_id.to_string(),
            target_player_id: target_player_id.to_string(),
        })
    }

    pub fn spell(
        player_id: PlayerId,
        target_player_id: PlayerId,
        spell_slot: i64,
        x: f64,
        y: f64,
    ) -> Self {
        Action::Spell(SpellPayload {
            player_id: player_id.to_string(),
            target_player_id: target_player_id.to_string(),
            spell_slot,
            x,
            y,
        })
    }

    /// Relative move; offsets are multiplied by [`MOVE_SCALE`]
    pub fn move_by(player_id: PlayerId, x: f64, y: f64) -> Self {
        Action::Move(PositionPayload {
            player_id: player_id.to_string(),
            x: x * MOVE_SCALE,
            y: y * MOVE_SCALE,
        })
    }

    /// Absolute move; coordinates pass through unscaled
    pub fn move_to(player_id: PlayerId, x: f64, y: f64) -> Self {
        Action::MoveTo(PositionPayload {
            player_id: player_id.to_string(),
            x,
            y,
        })
    }

    /// Teleport; coordinates pass through unscaled
    pub fn teleport(player_id: PlayerId, x: f64, y: f64) -> Self {
        Action::Teleport(PositionPayload {
            player_id: player_id.to_string(),
            x,
            y,
        })
    }

    /// Tag string the server demultiplexes on
    pub fn tag(&self) -> &'static str {
        match self {
            Action::Attack(_) => "attack",
            Action::Spell(_) => "spell",
            Action::Move(_) => "move",
            Action::MoveTo(_) => "move_to",
            Action::Teleport(_) => "teleport",
            Action::Reset => "reset",
            Action::Noop => "noop",
        }
    }

    /// JSON payload for the legacy paired encoding.
    /// `reset` and `noop` carry an empty string.
    pub fn payload_json(&self) -> Result<String> {
        let json = match self {
            Action::Attack(p) => serde_json::to_string(p)?,
            Action::Spell(p) => serde_json::to_string(p)?,
            Action::Move(p) | Action::MoveTo(p) | Action::Teleport(p) => {
                serde_json::to_string(p)?
            }
            Action::Reset | Action::Noop => String::new(),
        };
        Ok(json)
    }
}
