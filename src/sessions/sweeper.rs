//! Background eviction of idle sessions and stale artifacts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info};

use super::SessionRegistry;
use crate::publish::ArtifactStore;

/// Messages that can be sent to the sweeper.
#[derive(Debug, Clone)]
pub enum SweeperMessage {
    /// Run an eviction pass now.
    SweepNow,
    /// Stop the sweeper.
    Shutdown,
}

/// Periodically evicts expired sessions and artifacts.
pub struct SessionSweeper {
    sessions: Arc<SessionRegistry>,
    artifacts: Arc<ArtifactStore>,
    interval: Duration,
}

impl SessionSweeper {
    #[must_use]
    pub fn new(sessions: Arc<SessionRegistry>, artifacts: Arc<ArtifactStore>) -> Self {
        Self {
            sessions,
            artifacts,
            interval: Duration::from_secs(60),
        }
    }

    /// Sets how often an eviction pass runs.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs the sweep loop until a `Shutdown` arrives or the sender is dropped.
    pub async fn run(&self, mut rx: mpsc::Receiver<SweeperMessage>) {
        info!("Session sweeper started (every {:?})", self.interval);

        let mut timer = interval(self.interval);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.sweep().await;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(SweeperMessage::SweepNow) => {
                            debug!("Received sweep request");
                            self.sweep().await;
                        }
                        Some(SweeperMessage::Shutdown) | None => {
                            info!("Session sweeper shutting down");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// One eviction pass. Returns the number of sessions and artifacts removed.
    pub async fn sweep(&self) -> (usize, usize) {
        let sessions = self.sessions.evict_expired().await;
        let artifacts = self.artifacts.evict_expired().await;
        if sessions > 0 || artifacts > 0 {
            info!(
                "Evicted {} idle session(s) and {} artifact(s)",
                sessions, artifacts
            );
        }
        (sessions, artifacts)
    }
}

impl std::fmt::Debug for SessionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSweeper")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
