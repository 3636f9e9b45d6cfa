//! Remote controller for a League of Legends sandbox server
//!
//! Drives an out-of-process game server and its rendering client through a
//! shared blocking message queue:
//!
//! - **Broker**: named list channels (`observation`, `action`, `command`),
//!   backed by Redis in production and by memory in tests
//! - **Supervisor**: spawns and terminates the server and client processes
//! - **Handshake**: `clients_join` then `game_started`, each with its own timeout
//! - **Observer**: one-time `start_observing`, then bounded blocking polls
//! - **Dispatcher**: encodes player actions and control commands

pub mod broker;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod handshake;
pub mod memory;
pub mod observer;
pub mod process;
pub mod protocol;
pub mod redis;

pub use broker::{Delivery, QueueBroker, channel};
pub use config::ControllerConfig;
pub use controller::RemoteController;
pub use dispatch::ActionDispatcher;
pub use handshake::{Handshake, HandshakeState};
pub use memory::MemoryBroker;
pub use observer::ObservationPoller;
pub use process::{LaunchSpec, LocalSupervisor, ProcessHandle, ProcessSupervisor};
pub use protocol::WireFormat;
pub use redis::RedisBroker;
