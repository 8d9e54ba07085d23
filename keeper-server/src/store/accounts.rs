//! Account registration and credential checks.

use super::RemoteStore;
use crate::error::{StoreError, StoreResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use rusqlite::{params, ErrorCode, OptionalExtension};
use tracing::info;

impl RemoteStore {
    /// Creates an account. The password is kept only as an Argon2 hash.
    pub fn register(&self, login: &str, password: &str) -> StoreResult<()> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .to_string();

        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO users (login, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![login, hash, Utc::now().timestamp_millis()],
        ) {
            Ok(_) => {
                info!("registered user {login}");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::UserExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verifies a login/password pair.
    pub fn check_auth(&self, login: &str, password: &str) -> StoreResult<()> {
        let stored: Option<String> = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT password_hash FROM users WHERE login = ?1",
                params![login],
                |row| row.get(0),
            )
            .optional()?
        };
        let stored = stored.ok_or(StoreError::InvalidCredentials)?;
        let parsed =
            PasswordHash::new(&stored).map_err(|e| StoreError::Storage(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| StoreError::InvalidCredentials)
    }
}
