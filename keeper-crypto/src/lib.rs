//! Encryption layer for Keeper.
//!
//! Every secret field is encrypted on the client before it reaches the local
//! vault or the remote store, using:
//! - Argon2id to derive a 32-byte session key from the account password
//! - ChaCha20-Poly1305 for authenticated encryption, one random nonce per call
//! - Zeroization of key material on drop
//!
//! # Key derivation
//!
//! The salt is derived from the owner identity rather than generated, so
//! every device of the same owner arrives at the same key from the same
//! password. The key is never stored; it lives only as long as the session.
//!
//! # Wire format
//!
//! Ciphertext strings are standard base64 of `nonce || ciphertext || tag`.

mod cipher;
mod error;
mod key;

pub use cipher::{
    decrypt, decrypt_from_base64, decrypt_string, encrypt, encrypt_string, encrypt_to_base64,
    EncryptedData, NONCE_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, derive_owner_key, DerivedKey, KdfParams, Salt, KEY_SIZE, SALT_SIZE};
