//! HTTP client for the keeper server.
//!
//! Register and login capture the `session.id` cookie; every record call
//! replays it. Status codes map onto [`ClientError`]:
//! 401 → `InvalidCredentials` (login) or `AuthRequired`, 404 → `Empty`,
//! 409 → `UserExists`, `AlreadyExists` or `OldData` by the body's status.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use keeper_types::{BlobRecord, BlobSelector, Credentials, Record};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

const SESSION_COOKIE: &str = "session.id";

/// State shared across API client clones.
#[derive(Default)]
struct AuthState {
    session: Option<String>,
    login: Option<String>,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

/// HTTP client for the keeper server.
#[derive(Clone)]
pub struct KeeperApiClient {
    client: Client,
    base_url: String,
    auth: Arc<RwLock<AuthState>>,
}

impl KeeperApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth: Arc::new(RwLock::new(AuthState::default())),
        })
    }

    pub async fn is_authenticated(&self) -> bool {
        self.auth.read().await.session.is_some()
    }

    pub async fn login_name(&self) -> Option<String> {
        self.auth.read().await.login.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // ── Auth ──

    pub async fn register(&self, login: &str, password: &str) -> ClientResult<()> {
        let resp = self.send_credentials("/api/user/register", login, password).await?;
        match resp.status() {
            StatusCode::OK => self.capture_session(login, &resp).await,
            StatusCode::CONFLICT => Err(ClientError::UserExists),
            _ => Err(error_from_response(resp).await),
        }
    }

    pub async fn login(&self, login: &str, password: &str) -> ClientResult<()> {
        let resp = self.send_credentials("/api/user/login", login, password).await?;
        match resp.status() {
            StatusCode::OK => self.capture_session(login, &resp).await,
            StatusCode::UNAUTHORIZED => Err(ClientError::InvalidCredentials),
            _ => Err(error_from_response(resp).await),
        }
    }

    /// Drops the session locally and asks the server to forget it.
    pub async fn logout(&self) {
        let session = {
            let mut auth = self.auth.write().await;
            auth.login = None;
            auth.session.take()
        };
        if let Some(token) = session {
            let result = self
                .client
                .post(self.url("/api/user/logout"))
                .header(COOKIE, format!("{SESSION_COOKIE}={token}"))
                .send()
                .await;
            if let Err(e) = result {
                debug!("logout request failed: {e}");
            }
        }
    }

    async fn send_credentials(
        &self,
        path: &str,
        login: &str,
        password: &str,
    ) -> ClientResult<Response> {
        let body = Credentials {
            login: login.to_string(),
            password: password.to_string(),
        };
        Ok(self.client.post(self.url(path)).json(&body).send().await?)
    }

    async fn capture_session(&self, login: &str, resp: &Response) -> ClientResult<()> {
        let token = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| {
                let pair = v.split(';').next()?.trim();
                let (name, value) = pair.split_once('=')?;
                (name == SESSION_COOKIE).then(|| value.to_string())
            })
            .ok_or_else(|| ClientError::Api("server did not issue a session cookie".into()))?;

        let mut auth = self.auth.write().await;
        auth.session = Some(token);
        auth.login = Some(login.to_string());
        Ok(())
    }

    async fn session_cookie(&self) -> ClientResult<String> {
        self.auth
            .read()
            .await
            .session
            .as_ref()
            .map(|token| format!("{SESSION_COOKIE}={token}"))
            .ok_or(ClientError::AuthRequired)
    }

    // ── Records ──

    /// Uploads one record. The record's `overwrite` flag is sent as is.
    pub async fn upload<R: Record>(&self, record: &R) -> ClientResult<()> {
        let cookie = self.session_cookie().await?;
        let url = self.url(&format!("/api/user/upload/{}", R::KIND.upload_segment()));
        let resp = self
            .client
            .post(&url)
            .header(COOKIE, cookie)
            .json(record)
            .send()
            .await?;

        match resp.status() {
            StatusCode::CREATED | StatusCode::OK => {
                debug!("uploaded {} {}", R::KIND, record.unique_key());
                Ok(())
            }
            StatusCode::CONFLICT => match error_from_response(resp).await {
                ClientError::AlreadyExists(_) => {
                    Err(ClientError::AlreadyExists(record.unique_key().to_string()))
                }
                other => Err(other),
            },
            _ => Err(error_from_response(resp).await),
        }
    }

    /// Every record of one kind. Blobs come back as metadata only.
    pub async fn download_all<R: Record>(&self) -> ClientResult<Vec<R>> {
        let cookie = self.session_cookie().await?;
        let url = self.url(&format!(
            "/api/user/download/{}",
            R::KIND.download_segment()
        ));
        let resp = self.client.get(&url).header(COOKIE, cookie).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(error_from_response(resp).await);
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// One blob including its content.
    pub async fn fetch_blob(&self, description: &str) -> ClientResult<BlobRecord> {
        let cookie = self.session_cookie().await?;
        let resp = self
            .client
            .post(self.url("/api/user/download/binary"))
            .header(COOKIE, cookie)
            .json(&BlobSelector {
                description: description.to_string(),
            })
            .send()
            .await?;
        if resp.status() != StatusCode::OK {
            return Err(error_from_response(resp).await);
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

async fn error_from_response(resp: Response) -> ClientError {
    let status = resp.status();
    let body: ErrorBody = resp.json().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED => ClientError::AuthRequired,
        StatusCode::NOT_FOUND => ClientError::Empty,
        StatusCode::CONFLICT => match body.status.as_str() {
            "old_data" => ClientError::OldData,
            "user_exists" => ClientError::UserExists,
            _ => ClientError::AlreadyExists(body.message),
        },
        _ => ClientError::Api(format!("{status}: {}", body.message)),
    }
}
