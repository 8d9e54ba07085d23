//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the keeper server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub listen_addr: String,

    /// SQLite database file.
    pub database_path: PathBuf,

    /// Deadline for a single request, in seconds.
    pub request_timeout_secs: u64,

    /// Largest accepted request body. Blob uploads carry whole files.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            database_path: PathBuf::from("keeper.db"),
            request_timeout_secs: 2,
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}
