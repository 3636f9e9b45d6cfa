//! Full controller sessions against the in-memory broker

use async_trait::async_trait;
use lol_bridge::memory::JournalEntry;
use lol_bridge::protocol::decode_action;
use lol_bridge::{
    ControllerConfig, HandshakeState, LaunchSpec, LocalSupervisor, MemoryBroker,
    ProcessSupervisor, QueueBroker, RemoteController, WireFormat, channel,
};
use lol_rl_core::{Action, LolRlError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

#[derive(Clone, Default)]
struct Counters {
    servers: Arc<AtomicUsize>,
    clients: Arc<AtomicUsize>,
    terminations: Arc<AtomicUsize>,
    client_spawned: Arc<Notify>,
}

/// Supervisor that records calls instead of starting processes
struct RecordingSupervisor {
    counters: Counters,
    fail_server: bool,
    failing_terminations: usize,
}

impl RecordingSupervisor {
    fn new() -> (Self, Counters) {
        let counters = Counters::default();
        (
            Self {
                counters: counters.clone(),
                fail_server: false,
                failing_terminations: 0,
            },
            counters,
        )
    }
}

#[async_trait]
impl ProcessSupervisor for RecordingSupervisor {
    async fn spawn_server(&mut self) -> Result<()> {
        if self.fail_server {
            return Err(LolRlError::ProcessSpawn("game server: not found".into()));
        }
        self.counters.servers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn spawn_client(&mut self) -> Result<()> {
        self.counters.clients.fetch_add(1, Ordering::SeqCst);
        self.counters.client_spawned.notify_one();
        Ok(())
    }

    async fn terminate_all(&mut self) -> Result<()> {
        self.counters.terminations.fetch_add(1, Ordering::SeqCst);
        if self.failing_terminations > 0 {
            self.failing_terminations -= 1;
            return Err(LolRlError::Process("kill game server: permission denied".into()));
        }
        Ok(())
    }
}

fn config(timeout_seconds: f64) -> ControllerConfig {
    ControllerConfig {
        timeout_seconds,
        game_started_timeout_seconds: timeout_seconds,
        ..Default::default()
    }
}

async fn controller(
    timeout_seconds: f64,
) -> (RemoteController<MemoryBroker, RecordingSupervisor>, MemoryBroker, Counters) {
    let broker = MemoryBroker::new();
    let (supervisor, counters) = RecordingSupervisor::new();
    let controller = RemoteController::launch(config(timeout_seconds), broker.clone(), supervisor)
        .await
        .unwrap();
    (controller, broker, counters)
}

/// Plays the game server side of the handshake
fn fake_server(broker: MemoryBroker, counters: Counters) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        broker
            .push(channel::OBSERVATION, "\"clients_join\"")
            .await
            .unwrap();
        counters.client_spawned.notified().await;
        broker
            .push(channel::OBSERVATION, "\"game_started\"")
            .await
            .unwrap();
    })
}

#[tokio::test]
async fn test_connect_spawns_exactly_one_client() {
    let (mut ctrl, broker, counters) = controller(2.0).await;
    assert_eq!(counters.servers.load(Ordering::SeqCst), 1);
    assert_eq!(ctrl.handshake_state(), HandshakeState::Init);

    let server = fake_server(broker, counters.clone());
    assert_ok!(ctrl.connect().await);
    server.await.unwrap();

    assert_eq!(ctrl.handshake_state(), HandshakeState::Ready);
    assert_eq!(counters.clients.load(Ordering::SeqCst), 1);
    assert_eq!(counters.terminations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_connect_times_out_without_clients_join() {
    let (mut ctrl, _broker, counters) = controller(0.1).await;

    let err = assert_err!(ctrl.connect().await);
    assert!(matches!(
        err,
        LolRlError::HandshakeTimeout { expected: "clients_join", .. }
    ));
    assert_eq!(ctrl.handshake_state(), HandshakeState::Failed);
    assert_eq!(counters.clients.load(Ordering::SeqCst), 0);

    // Owned processes are gone and the session is unusable
    assert_eq!(counters.terminations.load(Ordering::SeqCst), 1);
    assert!(ctrl.is_closed());
    assert!(matches!(ctrl.observe().await, Err(LolRlError::SessionClosed)));
    assert!(matches!(ctrl.connect().await, Err(LolRlError::SessionClosed)));
}

#[tokio::test]
async fn test_connect_rejects_wrong_first_command() {
    let (mut ctrl, broker, counters) = controller(1.0).await;
    broker
        .push(channel::OBSERVATION, "\"game_started\"")
        .await
        .unwrap();

    let err = assert_err!(ctrl.connect().await);
    assert!(matches!(
        err,
        LolRlError::HandshakeProtocolViolation { expected: "clients_join", .. }
    ));
    assert_eq!(counters.clients.load(Ordering::SeqCst), 0);
    assert_eq!(counters.terminations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_connect_times_out_waiting_for_game_started() {
    let (mut ctrl, broker, counters) = controller(0.2).await;
    broker
        .push(channel::OBSERVATION, "\"clients_join\"")
        .await
        .unwrap();

    let err = assert_err!(ctrl.connect().await);
    assert!(matches!(
        err,
        LolRlError::HandshakeTimeout { expected: "game_started", .. }
    ));
    assert_eq!(counters.clients.load(Ordering::SeqCst), 1);
    assert_eq!(counters.terminations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_server_spawn_failure_fails_launch() {
    let (mut supervisor, counters) = RecordingSupervisor::new();
    supervisor.fail_server = true;

    let result = RemoteController::launch(config(1.0), MemoryBroker::new(), supervisor).await;
    assert!(matches!(result, Err(LolRlError::ProcessSpawn(_))));
    assert_eq!(counters.servers.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_config_fails_before_spawning() {
    let (supervisor, counters) = RecordingSupervisor::new();
    let result = RemoteController::launch(config(0.0), MemoryBroker::new(), supervisor).await;
    assert!(matches!(result, Err(LolRlError::Config(_))));
    assert_eq!(counters.servers.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_oversized_timeout_fails_before_spawning() {
    let (supervisor, counters) = RecordingSupervisor::new();
    let result = RemoteController::launch(config(1e20), MemoryBroker::new(), supervisor).await;
    assert!(matches!(result, Err(LolRlError::Config(_))));
    assert_eq!(counters.servers.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_start_observing_fires_once_per_session() {
    let (mut ctrl, broker, _counters) = controller(0.1).await;
    let obs = r#"{"champ_units": [{"alive": 1.0}, {"alive": 0.0}]}"#;

    assert!(ctrl.observe().await.unwrap().is_none());
    for _ in 0..3 {
        broker.push(channel::OBSERVATION, obs).await.unwrap();
        let observation = ctrl.observe().await.unwrap().unwrap();
        assert!(RemoteController::<MemoryBroker, RecordingSupervisor>::someone_died(
            &observation
        ));
    }

    let journal = broker.journal();
    let clears = journal
        .iter()
        .filter(|e| matches!(e, JournalEntry::Clear { .. }))
        .count();
    assert_eq!(clears, 2);
    assert_eq!(broker.drain(channel::COMMAND), vec!["start_observing"]);
    assert!(ctrl.last_observation().is_some());
}

#[tokio::test]
async fn test_attack_pushes_tag_then_payload() {
    let (mut ctrl, broker, _counters) = controller(1.0).await;

    let sent = ctrl.player_attack(1, 2).await.unwrap();
    assert_eq!(sent, Action::attack(1, 2));

    let frames = broker.drain(channel::ACTION);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], "attack");
    let payload: serde_json::Value = serde_json::from_str(&frames[1]).unwrap();
    assert_eq!(
        payload,
        serde_json::json!({"player_id": "1", "target_player_id": "2"})
    );
}

#[tokio::test]
async fn test_move_scaling_asymmetry_on_the_wire() {
    let (mut ctrl, broker, _counters) = controller(1.0).await;

    ctrl.player_move(7, 1.0, 2.0).await.unwrap();
    ctrl.player_move_to(7, 1.0, 2.0).await.unwrap();
    ctrl.player_teleport(7, 1.0, 2.0).await.unwrap();

    let frames = broker.drain(channel::ACTION);
    let decoded: Vec<Action> = frames
        .chunks(2)
        .map(|pair| decode_action(pair, WireFormat::Paired).unwrap())
        .collect();

    let coords: Vec<(String, f64, f64)> = decoded
        .iter()
        .map(|action| match action {
            Action::Move(p) | Action::MoveTo(p) | Action::Teleport(p) => {
                (action.tag().to_string(), p.x, p.y)
            }
            other => panic!("Unexpected action {:?}", other),
        })
        .collect();
    assert_eq!(
        coords,
        vec![
            ("move".to_string(), 100.0, 200.0),
            ("move_to".to_string(), 1.0, 2.0),
            ("teleport".to_string(), 1.0, 2.0),
        ]
    );
}

#[tokio::test]
async fn test_noop_and_reset_payloads_are_empty() {
    let (mut ctrl, broker, _counters) = controller(1.0).await;

    ctrl.player_noop(4).await.unwrap();
    let frames = broker.drain(channel::ACTION);
    assert_eq!(frames.len(), 8);
    for pair in frames.chunks(2) {
        assert_eq!(pair.to_vec(), vec!["noop", ""]);
    }

    ctrl.players_reset().await.unwrap();
    assert_eq!(broker.drain(channel::ACTION), vec!["reset", ""]);
}

#[tokio::test]
async fn test_change_champion_uses_command_channel() {
    let (mut ctrl, broker, _counters) = controller(1.0).await;

    ctrl.player_change(1, "Ezreal").await.unwrap();
    assert!(broker.pending(channel::ACTION).is_empty());
    assert_eq!(
        broker.drain(channel::COMMAND),
        vec![
            "change_champion",
            r#"{"player_id":1,"champion_name":"Ezreal"}"#
        ]
    );
}

#[tokio::test]
async fn test_tagged_session() {
    let broker = MemoryBroker::new();
    let (supervisor, _counters) = RecordingSupervisor::new();
    let config = ControllerConfig {
        wire_format: WireFormat::Tagged,
        timeout_seconds: 0.1,
        ..Default::default()
    };
    let mut ctrl = RemoteController::launch(config, broker.clone(), supervisor)
        .await
        .unwrap();

    ctrl.observe().await.unwrap();
    ctrl.player_spell(1, 2, 0, 3.0, 4.0).await.unwrap();

    assert_eq!(
        broker.drain(channel::COMMAND),
        vec![r#"{"type":"start_observing"}"#]
    );
    let frames = broker.drain(channel::ACTION);
    assert_eq!(frames.len(), 1);
    assert_eq!(
        decode_action(&frames, WireFormat::Tagged).unwrap(),
        Action::spell(1, 2, 0, 3.0, 4.0)
    );
}

#[tokio::test]
async fn test_close_is_idempotent_and_blocks_further_use() {
    let (mut ctrl, _broker, counters) = controller(1.0).await;

    ctrl.close().await.unwrap();
    ctrl.close().await.unwrap();
    assert_eq!(counters.terminations.load(Ordering::SeqCst), 1);

    assert!(matches!(
        ctrl.player_attack(1, 2).await,
        Err(LolRlError::SessionClosed)
    ));
    assert!(matches!(ctrl.player_noop(1).await, Err(LolRlError::SessionClosed)));
}

#[tokio::test]
async fn test_close_retries_failed_termination() {
    let broker = MemoryBroker::new();
    let (mut supervisor, counters) = RecordingSupervisor::new();
    supervisor.failing_terminations = 1;
    let mut ctrl = RemoteController::launch(config(1.0), broker, supervisor)
        .await
        .unwrap();

    assert!(matches!(ctrl.close().await, Err(LolRlError::Process(_))));
    assert!(ctrl.is_closed());
    assert!(matches!(ctrl.observe().await, Err(LolRlError::SessionClosed)));

    assert_ok!(ctrl.close().await);
    assert_ok!(ctrl.close().await);
    assert_eq!(counters.terminations.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_quit_terminates_processes() {
    let (ctrl, _broker, counters) = controller(1.0).await;
    ctrl.quit().await.unwrap();
    assert_eq!(counters.terminations.load(Ordering::SeqCst), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_local_processes_terminated_on_close() {
    let broker = MemoryBroker::new();
    let supervisor = LocalSupervisor::new(
        LaunchSpec::new("sleep").arg("30"),
        LaunchSpec::new("sleep").arg("30"),
    );
    let mut ctrl = RemoteController::launch(config(2.0), broker.clone(), supervisor)
        .await
        .unwrap();

    broker
        .push_all(
            channel::OBSERVATION,
            &["\"clients_join\"".to_string(), "\"game_started\"".to_string()],
        )
        .await
        .unwrap();
    ctrl.connect().await.unwrap();

    let supervisor = ctrl.supervisor_mut();
    assert!(supervisor.server().unwrap().is_running());
    assert!(supervisor.client().unwrap().is_running());

    ctrl.close().await.unwrap();
    let supervisor = ctrl.supervisor_mut();
    assert!(!supervisor.server().unwrap().is_running());
    assert!(!supervisor.client().unwrap().is_running());
}
