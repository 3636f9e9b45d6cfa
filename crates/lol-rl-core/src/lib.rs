//! # lol-rl-core
//!
//! Core types for driving a League of Legends sandbox server.
//!
//! This crate provides the types shared by every controller implementation:
//! - Player actions and their payloads
//! - Control commands and readiness signals
//! - Decoded observations
//! - The controller error taxonomy

pub mod action;
pub mod command;
pub mod error;
pub mod observation;

pub use action::{Action, MOVE_SCALE, PlayerId};
pub use command::Command;
pub use error::{LolRlError, Result};
pub use observation::{ChampUnit, Observation};
