//! Remote controller for a sandbox game server
//!
//! Turns queue messages into typed observations and typed actions into queue
//! messages. All calls are sequential awaits on the caller's task; the only
//! suspension points are blocking pops, each bounded by a timeout.

use crate::broker::QueueBroker;
use crate::config::ControllerConfig;
use crate::dispatch::ActionDispatcher;
use crate::handshake::{Handshake, HandshakeState};
use crate::observer::ObservationPoller;
use crate::process::ProcessSupervisor;
use lol_rl_core::{Action, Command, LolRlError, Observation, PlayerId, Result};
use tracing::{error, info, warn};

pub struct RemoteController<B: QueueBroker, S: ProcessSupervisor> {
    config: ControllerConfig,
    broker: B,
    supervisor: S,
    handshake: Handshake,
    poller: ObservationPoller,
    dispatcher: ActionDispatcher,
    closed: bool,
    terminated: bool,
}

impl<B: QueueBroker, S: ProcessSupervisor> RemoteController<B, S> {
    /// Build a controller and start the game server.
    ///
    /// Fails without holding any process if the server cannot be spawned.
    pub async fn launch(config: ControllerConfig, broker: B, mut supervisor: S) -> Result<Self> {
        config.validate()?;
        let handshake = Handshake::new(config.timeout()?, config.game_started_timeout()?);
        let poller = ObservationPoller::new(config.timeout()?, config.wire_format);
        let dispatcher = ActionDispatcher::new(config.wire_format, config.log_actions);

        info!(
            "Launching game server (broker {}:{}, timeout {}s)",
            config.host, config.port, config.timeout_seconds
        );
        supervisor.spawn_server().await?;

        Ok(Self {
            config,
            broker,
            supervisor,
            handshake,
            poller,
            dispatcher,
            closed: false,
            terminated: false,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn supervisor_mut(&mut self) -> &mut S {
        &mut self.supervisor
    }

    pub fn handshake_state(&self) -> HandshakeState {
        self.handshake.state()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(LolRlError::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// Wait for `clients_join`, start the rendering client, then wait for
    /// `game_started`.
    ///
    /// On failure every owned process is terminated and the session closed.
    pub async fn connect(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.handshake.state() == HandshakeState::Ready {
            warn!("connect() called on a ready session");
            return Ok(());
        }

        if let Err(e) = self.handshake.run(&self.broker, &mut self.supervisor).await {
            error!("Handshake failed: {}", e);
            if let Err(close_err) = self.close().await {
                warn!("Cleanup after failed handshake: {}", close_err);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Next observation, or `None` if none arrived within the timeout.
    ///
    /// The first call of a session resets the channels and sends
    /// `start_observing`.
    pub async fn observe(&mut self) -> Result<Option<Observation>> {
        self.ensure_open()?;
        self.poller.poll(&self.broker).await
    }

    pub fn last_observation(&self) -> Option<&Observation> {
        self.poller.last()
    }

    /// True iff any champion unit in `observation` is dead
    pub fn someone_died(observation: &Observation) -> bool {
        observation.someone_died()
    }

    /// Push any action
    pub async fn send_action(&mut self, action: Action) -> Result<Action> {
        self.ensure_open()?;
        self.dispatcher.send(&self.broker, &action).await?;
        Ok(action)
    }

    pub async fn player_attack(
        &mut self,
        player_id: PlayerId,
        target_player_id: PlayerId,
    ) -> Result<Action> {
        self.send_action(Action::attack(player_id, target_player_id))
            .await
    }

    pub async fn player_spell(
        &mut self,
        player_id: PlayerId,
        target_player_id: PlayerId,
        spell_slot: i64,
        x: f64,
        y: f64,
    ) -> Result<Action> {
        self.send_action(Action::spell(player_id, target_player_id, spell_slot, x, y))
            .await
    }

    /// Relative move; offsets are scaled by 100 on the wire
    pub async fn player_move(&mut self, player_id: PlayerId, x: f64, y: f64) -> Result<Action> {
        self.send_action(Action::move_by(player_id, x, y)).await
    }

    pub async fn player_move_to(&mut self, player_id: PlayerId, x: f64, y: f64) -> Result<Action> {
        self.send_action(Action::move_to(player_id, x, y)).await
    }

    pub async fn player_teleport(&mut self, player_id: PlayerId, x: f64, y: f64) -> Result<Action> {
        self.send_action(Action::teleport(player_id, x, y)).await
    }

    pub async fn players_reset(&mut self) -> Result<Action> {
        self.send_action(Action::Reset).await
    }

    /// Push `n` separate noops
    pub async fn player_noop(&mut self, n: usize) -> Result<Action> {
        self.ensure_open()?;
        self.dispatcher.send_noops(&self.broker, n).await?;
        Ok(Action::Noop)
    }

    pub async fn player_change(
        &mut self,
        player_id: PlayerId,
        champion_name: &str,
    ) -> Result<Command> {
        self.ensure_open()?;
        let command = Command::change_champion(player_id, champion_name);
        self.dispatcher.send_command(&self.broker, &command).await?;
        Ok(command)
    }

    /// Terminate owned processes. Idempotent once termination succeeds;
    /// a failed termination is retried by the next call.
    pub async fn close(&mut self) -> Result<()> {
        if self.terminated {
            return Ok(());
        }
        self.closed = true;
        info!("Closing controller session");
        self.supervisor.terminate_all().await?;
        self.terminated = true;
        Ok(())
    }

    /// Close and release the broker handle
    pub async fn quit(mut self) -> Result<()> {
        self.close().await
    }
}
