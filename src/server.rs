//! Supervision of the backend process under test.

use crate::core::ServerConfig;
use crate::errors::{HarnessError, Result};
use crate::poller::retry;
use chrono::{DateTime, Utc};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Spawned, health not confirmed yet.
    Starting,
    /// Answered the health check.
    Alive,
    /// Termination requested, exit not observed yet.
    Stopping,
    Exited,
}

impl ProcessState {
    pub fn is_alive(self) -> bool {
        matches!(self, ProcessState::Starting | ProcessState::Alive)
    }
}

/// Idempotent stop for a supervised process. Cheap to clone.
#[derive(Clone)]
pub struct StopHandle {
    state: Arc<watch::Sender<ProcessState>>,
    terminate: Arc<Notify>,
}

impl StopHandle {
    /// Ask the process to terminate if it is still alive; no-op otherwise.
    pub fn stop(&self) {
        let requested = self.state.send_if_modified(|state| {
            if state.is_alive() {
                *state = ProcessState::Stopping;
                true
            } else {
                false
            }
        });
        if requested {
            self.terminate.notify_one();
        }
    }
}

/// A running backend plus its liveness.
pub struct ServerProcess {
    config: ServerConfig,
    pid: Option<u32>,
    started_at: DateTime<Utc>,
    state: watch::Receiver<ProcessState>,
    stopper: StopHandle,
    http: reqwest::Client,
}

impl ServerProcess {
    /// Spawn the backend with the test-mode environment.
    ///
    /// Spawn failures are logged and show up as `Exited`; they are not
    /// returned from here.
    pub fn spawn(config: ServerConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(ProcessState::Starting);
        let state_tx = Arc::new(state_tx);
        let terminate = Arc::new(Notify::new());

        let spawned = Command::new(&config.command)
            .args(&config.args)
            .current_dir(&config.service_dir)
            .envs(config.env())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn();

        let pid = match spawned {
            Ok(child) => {
                let pid = child.id();
                info!(
                    "Started {} in {} (pid {:?}, port {})",
                    config.command,
                    config.service_dir.display(),
                    pid,
                    config.port
                );
                tokio::spawn(watch_child(child, state_tx.clone(), terminate.clone()));
                pid
            }
            Err(e) => {
                error!("Error on server: failed to spawn {}: {}", config.command, e);
                state_tx.send_replace(ProcessState::Exited);
                None
            }
        };

        Self {
            config,
            pid,
            started_at: Utc::now(),
            state: state_rx,
            stopper: StopHandle {
                state: state_tx,
                terminate,
            },
            http: reqwest::Client::new(),
        }
    }

    /// Poll the health endpoint until it answers with a success status.
    pub async fn wait_until_healthy(&self) -> Result<()> {
        let url = self.config.health_url();
        debug!(%url, "polling health endpoint");

        retry(|| self.probe(&url), self.config.retry).await?;

        self.stopper.state.send_if_modified(|state| {
            if *state == ProcessState::Starting {
                *state = ProcessState::Alive;
                true
            } else {
                false
            }
        });
        info!("Server on port {} is healthy", self.config.port);
        Ok(())
    }

    async fn probe(&self, url: &str) -> Result<()> {
        if *self.state.borrow() == ProcessState::Exited {
            return Err(HarnessError::Process(format!(
                "{} exited before becoming healthy",
                self.config.command
            )));
        }
        self.http.get(url).send().await?.error_for_status()?;
        Ok(())
    }

    pub fn stop(&self) {
        if self.state().is_alive() {
            let uptime = Utc::now() - self.started_at;
            info!(
                "Stopping server (pid {:?}) after {}s",
                self.pid,
                uptime.num_seconds()
            );
        }
        self.stopper.stop();
    }

    /// A stop handle that outlives borrows of this process.
    pub fn stopper(&self) -> StopHandle {
        self.stopper.clone()
    }

    pub fn state(&self) -> ProcessState {
        *self.state.borrow()
    }

    pub fn is_alive(&self) -> bool {
        self.state().is_alive()
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn base_url(&self) -> String {
        self.config.base_url()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Resolve once the exit of the process has been observed.
    pub async fn wait_for_exit(&self) {
        let mut state = self.state.clone();
        // the sender lives in `self`, so the channel cannot close under us
        let _ = state.wait_for(|s| *s == ProcessState::Exited).await;
    }
}

/// Spawn the backend and wait for it to become healthy.
///
/// When the health check gives up the error is returned and the child is
/// left running; use [`ServerProcess::spawn`] and
/// [`ServerProcess::wait_until_healthy`] to keep hold of it.
pub async fn start_server(config: ServerConfig) -> Result<ServerProcess> {
    let process = ServerProcess::spawn(config);
    process.wait_until_healthy().await?;
    Ok(process)
}

async fn watch_child(
    mut child: Child,
    state: Arc<watch::Sender<ProcessState>>,
    terminate: Arc<Notify>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = terminate.notified() => {
            send_terminate(&mut child);
            child.wait().await
        }
    };

    match status {
        Ok(status) => info!("Server process exited: {}", status),
        Err(e) => error!("Error on server: {}", e),
    }
    state.send_replace(ProcessState::Exited);
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match child.id() {
        Some(pid) => {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                warn!("Failed to signal pid {}: {}", pid, e);
            }
        }
        None => debug!("Process already reaped, nothing to signal"),
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!("Failed to kill server process: {}", e);
    }
}
