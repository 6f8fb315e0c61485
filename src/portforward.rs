use crate::app::AppEvent;
use crate::model::PortForwardKey;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command as TokioCommand};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const STOP_TIMEOUT: Duration = Duration::from_secs(3);

struct Session {
    pid: u32,
    remote_port: u16,
    stop: Option<oneshot::Sender<()>>,
    waiter: JoinHandle<()>,
}

/// Owns the background `kubectl port-forward` children. A child that exits
/// on its own reports `AppEvent::PortForwardExited`; one stopped through the
/// registry is killed and reaped silently.
pub struct PortForwardRegistry {
    sessions: HashMap<PortForwardKey, Session>,
    events: UnboundedSender<AppEvent>,
    stop_timeout: Duration,
}

impl PortForwardRegistry {
    pub fn new(events: UnboundedSender<AppEvent>) -> Self {
        Self {
            sessions: HashMap::new(),
            events,
            stop_timeout: STOP_TIMEOUT,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn start(
        &mut self,
        key: PortForwardKey,
        namespace: &str,
        remote_port: u16,
    ) -> Result<u32> {
        let child = spawn_kubectl_port_forward(namespace, &key.pod, key.local_port, remote_port)?;
        self.adopt(key, remote_port, child)
    }

    /// Tracks an already spawned child under `key`.
    pub fn adopt(&mut self, key: PortForwardKey, remote_port: u16, mut child: Child) -> Result<u32> {
        let pid = child
            .id()
            .context("failed to determine process id for port-forward")?;
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let events = self.events.clone();
        let exit_key = key.clone();

        let waiter = tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    let (detail, success) = match status {
                        Ok(status) => (status.to_string(), status.success()),
                        Err(error) => (format!("wait failed: {error}"), false),
                    };
                    let _ = events.send(AppEvent::PortForwardExited {
                        key: exit_key,
                        detail,
                        success,
                    });
                }
                _ = stop_rx => {
                    if let Err(error) = child.kill().await {
                        warn!(pid, %error, "failed to kill port-forward");
                    }
                }
            }
        });

        info!(%key, pid, remote_port, "port-forward registered");
        if let Some(previous) = self.sessions.insert(
            key,
            Session {
                pid,
                remote_port,
                stop: Some(stop_tx),
                waiter,
            },
        ) {
            warn!(pid = previous.pid, "replaced an existing port-forward session");
            previous.waiter.abort();
        }
        Ok(pid)
    }

    /// Signals one child and waits for it to be reaped.
    pub async fn stop_one(&mut self, key: &PortForwardKey) -> bool {
        let Some(session) = self.sessions.remove(key) else {
            return false;
        };
        debug!(
            %key,
            pid = session.pid,
            remote_port = session.remote_port,
            "stopping port-forward"
        );
        self.shutdown(session).await;
        true
    }

    /// Signals every child and waits for each, bounded per child.
    pub async fn stop_all(&mut self) -> usize {
        let sessions = self.sessions.drain().collect::<Vec<_>>();
        let count = sessions.len();
        for (key, session) in sessions {
            debug!(%key, pid = session.pid, "stopping port-forward");
            self.shutdown(session).await;
        }
        if count > 0 {
            info!(count, "stopped port-forwards");
        }
        count
    }

    /// Drops the entry for a child that already exited.
    pub fn reap(&mut self, key: &PortForwardKey) {
        if let Some(session) = self.sessions.remove(key) {
            debug!(%key, pid = session.pid, "reaped port-forward");
        }
    }

    async fn shutdown(&self, mut session: Session) {
        if let Some(stop) = session.stop.take() {
            let _ = stop.send(());
        }
        match timeout(self.stop_timeout, &mut session.waiter).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => warn!(pid = session.pid, %error, "port-forward waiter failed"),
            Err(_) => {
                warn!(pid = session.pid, "port-forward did not exit in time");
                session.waiter.abort();
            }
        }
    }
}

fn spawn_kubectl_port_forward(
    namespace: &str,
    pod: &str,
    local_port: u16,
    remote_port: u16,
) -> Result<Child> {
    TokioCommand::new("kubectl")
        .arg("port-forward")
        .arg("-n")
        .arg(namespace)
        .arg(format!("pod/{pod}"))
        .arg(format!("{local_port}:{remote_port}"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn port-forward for {namespace}/pod/{pod}"))
}
