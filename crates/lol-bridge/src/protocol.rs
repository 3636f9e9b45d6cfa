//! Wire encoding for the `action` and `command` channels
//!
//! Two encodings are supported:
//! - `Paired`: the tag string, then the JSON payload, as two list entries.
//!   This is what the sandbox server consumes today.
//! - `Tagged`: one self-describing JSON message,
//!   `{"type": "<tag>", "data": {...}}`.
//!
//! Encoders return frames in push order; the broker pushes them as one batch.

use lol_rl_core::{Action, Command, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    #[default]
    Paired,
    Tagged,
}

/// Frames for one action
pub fn encode_action(action: &Action, format: WireFormat) -> Result<Vec<String>> {
    match format {
        WireFormat::Paired => Ok(vec![action.tag().to_string(), action.payload_json()?]),
        WireFormat::Tagged => Ok(vec![serde_json::to_string(action)?]),
    }
}

/// Frames for one control command.
///
/// In paired mode a command without payload is sent as its bare tag.
pub fn encode_command(command: &Command, format: WireFormat) -> Result<Vec<String>> {
    match format {
        WireFormat::Paired => {
            let mut frames = vec![command.tag().to_string()];
            if let Some(payload) = command.payload_json()? {
                frames.push(payload);
            }
            Ok(frames)
        }
        WireFormat::Tagged => Ok(vec![serde_json::to_string(command)?]),
    }
}

/// Decode an action from the frames produced by [`encode_action`]
pub fn decode_action(frames: &[String], format: WireFormat) -> Result<Action> {
    let missing = || lol_rl_core::LolRlError::Serialization("Missing action frame".to_string());
    match format {
        WireFormat::Tagged => {
            let message = frames.first().ok_or_else(missing)?;
            Ok(serde_json::from_str(message)?)
        }
        WireFormat::Paired => {
            let tag = frames.first().ok_or_else(missing)?;
            let payload = frames.get(1).ok_or_else(missing)?;
            // Re-wrap into the tagged form so serde does the dispatch
            let data: serde_json::Value = if payload.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_str(payload)?
            };
            let mut tagged = serde_json::Map::new();
            tagged.insert("type".into(), serde_json::Value::String(tag.clone()));
            if !data.is_null() {
                tagged.insert("data".into(), data);
            }
            Ok(serde_json::from_value(serde_json::Value::Object(tagged))?)
        }
    }
}
