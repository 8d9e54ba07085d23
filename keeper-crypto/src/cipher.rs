//! Authenticated encryption with ChaCha20-Poly1305.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use zeroize::Zeroizing;

pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

/// Nonce plus ciphertext-with-tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedData {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Decode(format!(
                "ciphertext too short: {} bytes",
                bytes.len()
            )));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_SIZE);
        let mut n = [0u8; NONCE_SIZE];
        n.copy_from_slice(nonce);
        Ok(Self {
            nonce: n,
            ciphertext: ciphertext.to_vec(),
        })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::Decode(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

fn cipher_for(key: &DerivedKey) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()))
}

/// Encrypts `plaintext` under a fresh random nonce.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher_for(key)
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut n = [0u8; NONCE_SIZE];
    n.copy_from_slice(nonce.as_slice());
    Ok(EncryptedData {
        nonce: n,
        ciphertext,
    })
}

pub fn decrypt(key: &DerivedKey, data: &EncryptedData) -> CryptoResult<Vec<u8>> {
    cipher_for(key)
        .decrypt(Nonce::from_slice(&data.nonce), data.ciphertext.as_slice())
        .map_err(|_| CryptoError::Decryption)
}

/// Encrypts bytes into the base64 wire string.
pub fn encrypt_to_base64(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<String> {
    Ok(encrypt(key, plaintext)?.to_base64())
}

pub fn decrypt_from_base64(key: &DerivedKey, encoded: &str) -> CryptoResult<Vec<u8>> {
    decrypt(key, &EncryptedData::from_base64(encoded)?)
}

pub fn encrypt_string(key: &DerivedKey, plaintext: &str) -> CryptoResult<String> {
    encrypt_to_base64(key, plaintext.as_bytes())
}

pub fn decrypt_string(key: &DerivedKey, encoded: &str) -> CryptoResult<String> {
    let bytes = Zeroizing::new(decrypt_from_base64(key, encoded)?);
    String::from_utf8(bytes.to_vec()).map_err(|e| CryptoError::Decode(e.to_string()))
}
