//! External process supervision
//!
//! The controller owns two processes: the game server, started when the
//! controller is built, and the rendering client, started during the
//! handshake. Neither is ever restarted automatically.

use crate::config::ControllerConfig;
use async_trait::async_trait;
use lol_rl_core::{LolRlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Executable of the rendering client inside its deploy directory
pub const LEAGUE_CLIENT_EXE: &str = "./League of Legends.exe";

/// Port the rendering client's maestro handshake expects
pub const LEAGUE_CLIENT_MAESTRO_PORT: &str = "8394";

/// How to launch an external process. Passed through without interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Rendering client launch for a sandbox server at `host:port`.
    ///
    /// The last argument carries the connection token the client uses to
    /// join as `player_id`.
    pub fn league_client(
        deploy_dir: impl AsRef<Path>,
        server_host: &str,
        server_port: u16,
        blowfish_key: &str,
        player_id: u32,
    ) -> Self {
        Self::new(LEAGUE_CLIENT_EXE)
            .arg(LEAGUE_CLIENT_MAESTRO_PORT)
            .arg("")
            .arg("")
            .arg(format!(
                "{} {} {} {}",
                server_host, server_port, blowfish_key, player_id
            ))
            .current_dir(deploy_dir.as_ref())
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// An owned child process. Killed when dropped.
#[derive(Debug)]
pub struct ProcessHandle {
    label: String,
    child: Child,
    exit: Option<ExitStatus>,
}

impl ProcessHandle {
    /// Spawn `spec`, labelling the handle for logs and errors
    pub fn spawn(label: impl Into<String>, spec: &LaunchSpec) -> Result<Self> {
        let label = label.into();
        if spec.program.as_os_str().is_empty() {
            return Err(LolRlError::ProcessSpawn(format!(
                "{}: no program configured",
                label
            )));
        }

        let child = spec.command().spawn().map_err(|e| {
            LolRlError::ProcessSpawn(format!("{} ({}): {}", label, spec.program.display(), e))
        })?;

        info!("Spawned {} (pid {:?})", label, child.id());
        Ok(Self {
            label,
            child,
            exit: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// OS process id, `None` once the process has been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Whether the process is still running
    pub fn is_running(&mut self) -> bool {
        if self.exit.is_some() {
            return false;
        }
        let poll = self.child.try_wait();
        self.record_poll(poll)
    }

    fn record_poll(&mut self, poll: std::io::Result<Option<ExitStatus>>) -> bool {
        match poll {
            Ok(Some(status)) => {
                self.exit = Some(status);
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("Cannot poll {} status, assuming it runs: {}", self.label, e);
                true
            }
        }
    }

    /// Kill the process and reap it. No-op if it has already exited.
    pub async fn terminate(&mut self) -> Result<()> {
        if !self.is_running() {
            debug!("{} already exited ({:?})", self.label, self.exit);
            return Ok(());
        }

        info!("Terminating {}", self.label);
        self.child
            .start_kill()
            .map_err(|e| LolRlError::Process(format!("kill {}: {}", self.label, e)))?;
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| LolRlError::Process(format!("wait {}: {}", self.label, e)))?;
        self.exit = Some(status);
        Ok(())
    }
}

/// Owns the lifetimes of the game server and rendering client
#[async_trait]
pub trait ProcessSupervisor: Send {
    /// Start the game server
    async fn spawn_server(&mut self) -> Result<()>;

    /// Start the rendering client
    async fn spawn_client(&mut self) -> Result<()>;

    /// Terminate every owned process. Safe to call repeatedly.
    async fn terminate_all(&mut self) -> Result<()>;
}

/// Supervisor for processes on the local machine
pub struct LocalSupervisor {
    server_spec: LaunchSpec,
    client_spec: LaunchSpec,
    server: Option<ProcessHandle>,
    client: Option<ProcessHandle>,
}

impl LocalSupervisor {
    pub fn new(server_spec: LaunchSpec, client_spec: LaunchSpec) -> Self {
        Self {
            server_spec,
            client_spec,
            server: None,
            client: None,
        }
    }

    /// Supervisor for the launch specs in `config`.
    ///
    /// Both programs are checked here so a missing client path fails before
    /// the game server is started.
    pub fn from_config(config: &ControllerConfig) -> Result<Self> {
        for (name, spec) in [("server", &config.server), ("client", &config.client)] {
            if spec.program.as_os_str().is_empty() {
                return Err(LolRlError::Config(format!("{}.program must not be empty", name)));
            }
        }
        Ok(Self::new(config.server.clone(), config.client.clone()))
    }

    pub fn server(&mut self) -> Option<&mut ProcessHandle> {
        self.server.as_mut()
    }

    pub fn client(&mut self) -> Option<&mut ProcessHandle> {
        self.client.as_mut()
    }
}

#[async_trait]
impl ProcessSupervisor for LocalSupervisor {
    async fn spawn_server(&mut self) -> Result<()> {
        if let Some(mut previous) = self.server.take() {
            warn!("Game server already spawned, replacing it");
            previous.terminate().await?;
        }
        self.server = Some(ProcessHandle::spawn("game server", &self.server_spec)?);
        Ok(())
    }

    async fn spawn_client(&mut self) -> Result<()> {
        if let Some(mut previous) = self.client.take() {
            warn!("Rendering client already spawned, replacing it");
            previous.terminate().await?;
        }
        self.client = Some(ProcessHandle::spawn("rendering client", &self.client_spec)?);
        Ok(())
    }

    async fn terminate_all(&mut self) -> Result<()> {
        // Attempt both before reporting the first failure
        let client = match self.client.as_mut() {
            Some(handle) => handle.terminate().await,
            None => Ok(()),
        };
        let server = match self.server.as_mut() {
            Some(handle) => handle.terminate().await,
            None => Ok(()),
        };
        client.and(server)
    }
}
