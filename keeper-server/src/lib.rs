//! Keeper remote store.
//!
//! Holds every owner's encrypted records in SQLite and serves them over a
//! small JSON API authenticated by a session cookie. The server never sees
//! plaintext: secret fields arrive and leave as client-side ciphertext.
//!
//! Conflicts between devices are settled here with last-writer-wins: an
//! overwrite is accepted only when its clock is not older than the stored
//! one, and the compare and the write happen in one transaction.

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod store;

pub use api::{router, AppState};
pub use config::ServerConfig;
pub use error::{StoreError, StoreResult};
pub use session::{SessionStore, SESSION_COOKIE};
pub use store::{RemoteStore, StoredRecord};

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    config: &ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = router(state, config);
    if let Ok(addr) = listener.local_addr() {
        info!("keeper server listening on {addr}");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
