//! Client error types.

use keeper_crypto::CryptoError;
use keeper_vault::VaultError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("user already exists")]
    UserExists,

    #[error("invalid login or password")]
    InvalidCredentials,

    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("newer data available on remote storage")]
    OldData,

    #[error("no data")]
    Empty,

    #[error("authentication required")]
    AuthRequired,

    #[error("API request failed: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("cannot decode data: {0}")]
    Decode(String),

    #[error("crypto error: {0}")]
    Crypto(String),
}

impl ClientError {
    /// Whether the error means the remote could not be reached.
    pub fn is_offline(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}

impl From<CryptoError> for ClientError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Decryption | CryptoError::Decode(_) => ClientError::Decode(e.to_string()),
            other => ClientError::Crypto(other.to_string()),
        }
    }
}

impl From<VaultError> for ClientError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::AlreadyExists(key) => ClientError::AlreadyExists(key),
            VaultError::Storage(msg) => ClientError::Storage(msg),
            decode @ VaultError::Decode { .. } => ClientError::Decode(decode.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ClientError {
    fn from(e: tokio::task::JoinError) -> Self {
        ClientError::Storage(e.to_string())
    }
}
