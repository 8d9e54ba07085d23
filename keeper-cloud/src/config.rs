//! Client configuration.

use keeper_crypto::KdfParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the keeper client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the keeper server (e.g., "http://localhost:8080").
    pub api_base_url: String,

    /// Directory holding one vault subdirectory per owner.
    pub vault_dir: PathBuf,

    /// Interval between background reconciliations (seconds).
    pub sync_interval_secs: u64,

    /// Deadline for a single HTTP request (seconds).
    pub request_timeout_secs: u64,

    /// Cost of deriving the session key from the password.
    pub kdf: KdfParams,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            vault_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("keeper"),
            sync_interval_secs: 60,
            request_timeout_secs: 10,
            kdf: KdfParams::default(),
        }
    }
}

impl ClientConfig {
    /// Config pointing at `api_base_url` with vaults under `vault_dir`.
    pub fn new(api_base_url: impl Into<String>, vault_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            vault_dir: vault_dir.into(),
            ..Self::default()
        }
    }
}
