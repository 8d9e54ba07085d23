//! Cookie sessions.
//!
//! Tokens are random and map to an owner identity held only on the server.
//! Sessions live in memory and do not survive a restart; clients log in
//! again.

use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session.id";

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new token for `owner`.
    pub async fn issue(&self, owner: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions
            .write()
            .await
            .insert(token.clone(), owner.to_string());
        token
    }

    /// Owner behind `token`, if the session exists.
    pub async fn resolve(&self, token: &str) -> Option<String> {
        self.sessions.read().await.get(token).cloned()
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}
