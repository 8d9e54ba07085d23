//! The authenticated session.
//!
//! Holding a [`Session`] is what "authenticated" means: it carries the owner
//! identity, the key derived from the owner's password and the vault bound
//! to the owner's directory. Every record operation takes one explicitly.
//! Dropping it zeroizes the key.

use crate::error::ClientResult;
use keeper_crypto::{decrypt_string, encrypt_string, DerivedKey};
use keeper_types::Record;
use keeper_vault::LocalVault;
use std::fmt;

pub struct Session {
    owner: String,
    key: DerivedKey,
    vault: LocalVault,
}

impl Session {
    pub fn new(owner: &str, key: DerivedKey, vault: LocalVault) -> Self {
        Self {
            owner: owner.to_string(),
            key,
            vault,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn vault(&self) -> &LocalVault {
        &self.vault
    }

    pub(crate) fn key(&self) -> &DerivedKey {
        &self.key
    }

    /// Encrypts every secret field of `record`.
    pub fn seal<R: Record>(&self, mut record: R) -> ClientResult<R> {
        for field in record.secret_fields_mut() {
            *field = encrypt_string(&self.key, field)?;
        }
        Ok(record)
    }

    /// Decrypts every secret field of `record`.
    pub fn open<R: Record>(&self, mut record: R) -> ClientResult<R> {
        for field in record.secret_fields_mut() {
            *field = decrypt_string(&self.key, field)?;
        }
        Ok(record)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("owner", &self.owner)
            .field("vault", &self.vault.root())
            .finish_non_exhaustive()
    }
}
