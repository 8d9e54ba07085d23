//! Background reconciliation.
//!
//! Event loop that reconciles every kind on a fixed interval and on demand,
//! until stopped. Network loss is expected: failures are logged and the
//! loop keeps going, with a single offline notice per outage.

use crate::error::{ClientError, ClientResult};
use crate::service::{RecordService, ReconcileReport, OFFLINE_NOTICE};
use crate::session::Session;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

enum SyncCommand {
    SyncNow(oneshot::Sender<ReconcileReport>),
    Stop,
}

/// Background reconciliation loop.
pub struct SyncEngine {
    service: Arc<RecordService>,
    session: Arc<Session>,
    interval: Duration,
    command_rx: mpsc::Receiver<SyncCommand>,
    offline: bool,
}

/// Handle for sending commands to the sync engine.
#[derive(Clone)]
pub struct SyncHandle {
    command_tx: mpsc::Sender<SyncCommand>,
}

impl SyncHandle {
    pub async fn stop(&self) -> ClientResult<()> {
        self.command_tx
            .send(SyncCommand::Stop)
            .await
            .map_err(|_| ClientError::Api("sync engine not running".to_string()))
    }

    /// Runs a reconciliation now and waits for its report.
    pub async fn sync_now(&self) -> ClientResult<ReconcileReport> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(SyncCommand::SyncNow(tx))
            .await
            .map_err(|_| ClientError::Api("sync engine not running".to_string()))?;
        rx.await
            .map_err(|_| ClientError::Api("sync engine stopped".to_string()))
    }
}

/// Creates a sync engine and its command handle.
pub fn create_sync_engine(
    service: Arc<RecordService>,
    session: Arc<Session>,
    interval: Duration,
) -> (SyncHandle, SyncEngine) {
    let (command_tx, command_rx) = mpsc::channel(16);
    let engine = SyncEngine {
        service,
        session,
        interval,
        command_rx,
        offline: false,
    };
    (SyncHandle { command_tx }, engine)
}

impl SyncEngine {
    /// Runs the loop until stopped or every handle is dropped.
    pub async fn run(&mut self) {
        info!("sync engine started for {}", self.session.owner());

        let mut ticker = tokio::time::interval(self.interval);
        // Skip first immediate tick
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.reconcile().await;
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SyncCommand::SyncNow(reply)) => {
                            let report = self.reconcile().await;
                            let _ = reply.send(report);
                        }
                        Some(SyncCommand::Stop) => {
                            info!("sync engine stopping");
                            break;
                        }
                        None => {
                            info!("command channel closed, stopping sync engine");
                            break;
                        }
                    }
                }
            }
        }

        info!("sync engine stopped");
    }

    async fn reconcile(&mut self) -> ReconcileReport {
        let report = self.service.reconcile_all(&self.session).await;
        if report.offline {
            if !self.offline {
                warn!("{OFFLINE_NOTICE}");
            }
            self.offline = true;
        } else {
            if self.offline {
                info!("remote reachable again");
            }
            self.offline = false;
        }
        debug!("reconciliation finished: {report:?}");
        report
    }
}
