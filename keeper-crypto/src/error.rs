use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Authentication tag mismatch: wrong key or tampered ciphertext.
    #[error("decryption failed: wrong key or corrupted data")]
    Decryption,

    #[error("malformed ciphertext: {0}")]
    Decode(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}
