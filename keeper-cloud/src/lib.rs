//! Keeper client.
//!
//! Provides:
//! - An HTTP client for the remote API that replays the session cookie
//! - An explicit [`Session`] holding the owner, derived key and local vault
//! - [`RecordService`]: register/login, encrypted put/get, blob upload and
//!   fetch, and per-kind reconciliation against the remote
//! - A background [`SyncEngine`] that reconciles on a timer and tolerates
//!   losing the network

pub mod api_client;
pub mod config;
pub mod error;
pub mod service;
pub mod session;
pub mod sync_engine;

pub use api_client::KeeperApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use service::{KindReport, ReconcileReport, RecordService};
pub use session::Session;
pub use sync_engine::{create_sync_engine, SyncEngine, SyncHandle};
