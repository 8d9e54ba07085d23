//! Shared helpers: an in-process keeper server and client configs.

#![allow(dead_code)]

use keeper_cloud::{ClientConfig, RecordService};
use keeper_crypto::KdfParams;
use keeper_server::{serve, AppState, RemoteStore, ServerConfig};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A keeper server on an ephemeral port, backed by an in-memory store.
pub struct TestServer {
    pub url: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let state = AppState::new(RemoteStore::open_in_memory().unwrap());
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = rx.await;
            };
            serve(listener, state, &ServerConfig::default(), shutdown)
                .await
                .unwrap();
        });
        Self {
            url,
            shutdown: Some(tx),
            task,
        }
    }

    /// Shuts the server down; later requests fail to connect.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}

pub fn client_config(url: &str, vault_dir: &Path) -> ClientConfig {
    let mut config = ClientConfig::new(url, vault_dir);
    config.kdf = KdfParams::fast_insecure();
    config.request_timeout_secs = 2;
    config
}

/// One client "device": its own vault directory and service.
pub struct Device {
    pub dir: TempDir,
    pub service: Arc<RecordService>,
}

impl Device {
    pub fn new(url: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let service = Arc::new(RecordService::new(client_config(url, dir.path())).unwrap());
        Self { dir, service }
    }
}
