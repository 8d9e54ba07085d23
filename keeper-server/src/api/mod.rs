//! HTTP API.
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | POST | `/api/user/register` | 200 + session cookie |
//! | POST | `/api/user/login` | 200 + session cookie |
//! | POST | `/api/user/logout` | 200 |
//! | POST | `/api/user/upload/{logopass,text,credit-card,binary}` | 201 |
//! | GET | `/api/user/download/{logopasses,texts,credit-cards}` | 200 + array |
//! | GET | `/api/user/download/binary-list` | 200 + metadata array |
//! | POST | `/api/user/download/binary` | 200 + blob with content |

use crate::config::ServerConfig;
use crate::session::SessionStore;
use crate::store::RemoteStore;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use keeper_types::{BlobRecord, CardSecret, LoginSecret, Record, TextSecret};
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::{ApiError, ApiResult};

/// State shared across handlers.
pub struct AppState {
    pub store: RemoteStore,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(store: RemoteStore) -> Arc<Self> {
        Arc::new(Self {
            store,
            sessions: SessionStore::new(),
        })
    }
}

fn upload_path<R: Record>() -> String {
    format!("/api/user/upload/{}", R::KIND.upload_segment())
}

fn download_path<R: Record>() -> String {
    format!("/api/user/download/{}", R::KIND.download_segment())
}

/// Builds the API router.
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        // Accounts
        .route("/api/user/register", post(handlers::register))
        .route("/api/user/login", post(handlers::login))
        .route("/api/user/logout", post(handlers::logout))
        // Uploads
        .route(&upload_path::<LoginSecret>(), post(handlers::upload::<LoginSecret>))
        .route(&upload_path::<TextSecret>(), post(handlers::upload::<TextSecret>))
        .route(&upload_path::<CardSecret>(), post(handlers::upload::<CardSecret>))
        .route(&upload_path::<BlobRecord>(), post(handlers::upload::<BlobRecord>))
        // Downloads
        .route(&download_path::<LoginSecret>(), get(handlers::download_all::<LoginSecret>))
        .route(&download_path::<TextSecret>(), get(handlers::download_all::<TextSecret>))
        .route(&download_path::<CardSecret>(), get(handlers::download_all::<CardSecret>))
        .route(&download_path::<BlobRecord>(), get(handlers::download_all::<BlobRecord>))
        .route("/api/user/download/binary", post(handlers::download_blob))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .with_state(state)
}
