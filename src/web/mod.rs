//! HTTP surface: router construction, shared application context and the
//! error type handlers bubble into.

pub mod flash;
pub mod guard;
pub mod handlers;
pub mod views;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::auth::AuthError;
use crate::config::Config;
use crate::database::{Database, DatabaseError};

/// Explicitly constructed application state, passed to every handler via
/// axum's state extractor. The single SQLite connection lives behind a
/// mutex; each request completes its store access before responding.
#[derive(Clone)]
pub struct Context {
    pub db: Arc<Mutex<Database>>,
    pub config: Arc<Config>,
}

impl Context {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(config),
        }
    }
}

/// Failures that escape a handler. Everything recoverable (validation,
/// conflicts, authorization) is handled in the handlers themselves with a
/// flash message and a redirect.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

/// Build the application router around a context
pub fn router(ctx: Context) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store).with_secure(false);

    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/create", post(handlers::create_task))
        .route("/update/:id", post(handlers::update_task))
        .route("/complete/:id", post(handlers::complete_task))
        .route("/delete/:id", post(handlers::delete_task))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
