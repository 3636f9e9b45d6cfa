//! lol-controller: drive a League of Legends sandbox session
//!
//! Usage: `lol-controller [CONFIG.json] [MAX_STEPS]`
//!
//! Connects to the broker, starts the game server, runs the handshake and
//! then sends noops until a champion dies, observations stop, or
//! `MAX_STEPS` is reached. Owned processes are terminated on every exit.

use anyhow::{Context, Result};
use lol_bridge::{ControllerConfig, LocalSupervisor, RedisBroker, RemoteController};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_MAX_STEPS: usize = 1000;

type Controller = RemoteController<RedisBroker, LocalSupervisor>;

async fn run_session(controller: &mut Controller, max_steps: usize) -> Result<()> {
    controller.connect().await?;

    if let Some(server) = controller.supervisor_mut().server() {
        info!("{} pid {:?}", server.label(), server.id());
    }
    if let Some(client) = controller.supervisor_mut().client() {
        info!("{} pid {:?}", client.label(), client.id());
    }

    controller.players_reset().await?;

    for step in 0..max_steps {
        match controller.observe().await {
            Ok(Some(observation)) => {
                if Controller::someone_died(&observation) {
                    info!("Champion died at step {}, ending episode", step);
                    break;
                }
                controller.player_noop(1).await?;
            }
            Ok(None) => {
                warn!("No observation within {}s, stopping", controller.config().timeout_seconds);
                break;
            }
            Err(e) if !e.is_fatal() => warn!("Skipping unreadable observation: {}", e),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => ControllerConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path))?,
        None => ControllerConfig::default(),
    };
    let max_steps: usize = match args.get(2) {
        Some(n) => n.parse().with_context(|| format!("invalid MAX_STEPS {}", n))?,
        None => DEFAULT_MAX_STEPS,
    };

    info!("lol-controller starting");

    let supervisor = LocalSupervisor::from_config(&config)?;
    let broker = RedisBroker::connect(&config.host, config.port).await?;
    info!("Broker ready at {}", broker.url());
    let mut controller = RemoteController::launch(config, broker.clone(), supervisor).await?;

    let outcome = run_session(&mut controller, max_steps).await;

    if let Err(e) = controller.quit().await {
        error!("Failed to terminate game processes: {}", e);
    }
    broker.disconnect().await;

    info!("lol-controller shutting down");
    outcome
}
