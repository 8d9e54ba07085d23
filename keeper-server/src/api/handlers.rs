//! Endpoint handlers.

use super::auth::{session_cookie, session_token, Owner};
use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::error::StoreResult;
use crate::store::StoredRecord;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::Json;
use keeper_types::{BlobRecord, BlobSelector, Credentials, Record};
use std::sync::Arc;
use tracing::{debug, info};

type SessionResponse = (StatusCode, [(HeaderName, String); 1]);

/// Runs a store call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .map_err(ApiError::from)
}

fn credentials(body: Result<Json<Credentials>, JsonRejection>) -> Result<Credentials, ApiError> {
    let Json(creds) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if creds.login.is_empty() || creds.password.is_empty() {
        return Err(ApiError::bad_request("login and password must not be empty"));
    }
    Ok(creds)
}

async fn start_session(state: &AppState, login: &str) -> SessionResponse {
    let token = state.sessions.issue(login).await;
    (StatusCode::OK, [(SET_COOKIE, session_cookie(&token))])
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<SessionResponse, ApiError> {
    let creds = credentials(body)?;
    let store = state.store.clone();
    let (login, password) = (creds.login.clone(), creds.password);
    blocking(move || store.register(&login, &password)).await?;
    Ok(start_session(&state, &creds.login).await)
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<SessionResponse, ApiError> {
    let creds = credentials(body)?;
    let store = state.store.clone();
    let (login, password) = (creds.login.clone(), creds.password);
    blocking(move || store.check_auth(&login, &password)).await?;
    info!("user {} logged in", creds.login);
    Ok(start_session(&state, &creds.login).await)
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(&token).await;
    }
    StatusCode::OK
}

pub async fn upload<R: StoredRecord>(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    body: Result<Json<R>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(record) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if record.unique_key().is_empty() {
        return Err(ApiError::bad_request("record key must not be empty"));
    }
    debug!("{owner}: upload {} {}", R::KIND, record.unique_key());
    let store = state.store.clone();
    blocking(move || store.put(&owner, &record)).await?;
    Ok(StatusCode::CREATED)
}

pub async fn download_all<R: StoredRecord>(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
) -> ApiResult<Vec<R>> {
    let store = state.store.clone();
    let records = blocking(move || store.list_all::<R>(&owner)).await?;
    Ok(Json(records))
}

pub async fn download_blob(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    body: Result<Json<BlobSelector>, JsonRejection>,
) -> ApiResult<BlobRecord> {
    let Json(selector) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let store = state.store.clone();
    let blob =
        blocking(move || store.get_one::<BlobRecord>(&owner, &selector.description)).await?;
    Ok(Json(blob))
}
