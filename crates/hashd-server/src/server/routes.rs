//! HTTP surface of the hashing service.
//!
//! Paths and verbs are part of the compatibility contract:
//!
//! - `POST /hash` with form field `password` → `200` with the decimal
//!   submission id; the digest is computed asynchronously.
//! - `GET /hash/{id}` → `200` with the digest, `404` for unknown, pending,
//!   or malformed ids.
//! - `/shutdown` (any verb) → `200 OK`, idempotent drain trigger.
//! - `GET /stats` → `200` with `{"total": <int>, "average": <int>}`.
//!
//! Verbs outside the contract answer `400` rather than the framework's
//! default `405`. Client errors are resolved entirely at this boundary and
//! never touch shared state.

use crate::server::config::ServerConfig;
use crate::server::jobs;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use axum::routing::{any, get, post};
use hashd_core::{Error, HashStore, Stats};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

/// Shared handler state: the store plus the runtime configuration.
#[derive(Clone)]
pub struct AppState {
    store: Arc<HashStore>,
    config: ServerConfig,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApiError {
    /// Wrong verb, missing or empty `password` field, or an undecodable
    /// form body.
    #[error("Bad Request")]
    BadRequest,

    /// Unknown, pending, or malformed identifier.
    #[error("Not Found")]
    NotFound,

    /// The service is draining and refuses new submissions.
    #[error("Service is shutting down")]
    ShuttingDown,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::ShuttingDown => Self::ShuttingDown,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, self.to_string()).into_response()
    }
}

/// Builds the service router around a shared store.
pub fn router(store: Arc<HashStore>, config: ServerConfig) -> Router {
    let state = AppState { store, config };

    Router::new()
        .route("/hash", post(submit_hash).fallback(unsupported_verb))
        .route("/hash/{id}", get(lookup_hash).fallback(unsupported_verb))
        .route("/shutdown", any(request_shutdown))
        .route("/stats", get(stats).fallback(unsupported_verb))
        .layer(CatchPanicLayer::custom(handle_handler_panic))
        .with_state(state)
}

/// Last-resort fault boundary around the request handlers, the HTTP
/// counterpart of the completion tasks' `catch_unwind`: a panicking handler
/// is logged and answered with `500` instead of tearing down its connection.
/// Shared state is untouched (`parking_lot` locks do not poison).
fn handle_handler_panic(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("Request handler panicked: {}", jobs::panic_message(panic.as_ref()));
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

#[derive(serde::Deserialize)]
struct HashSubmission {
    #[serde(default)]
    password: String,
}

async fn unsupported_verb() -> ApiError {
    ApiError::BadRequest
}

/// `POST /hash`: accepts a submission and answers with its identifier.
///
/// The response body is the decimal id and nothing else; the completion task
/// is spawned after allocation and the response never waits on it.
#[tracing::instrument(skip_all)]
async fn submit_hash(
    State(state): State<AppState>,
    submission: Result<Form<HashSubmission>, FormRejection>,
) -> Result<String, ApiError> {
    let Ok(Form(submission)) = submission else {
        return Err(ApiError::BadRequest);
    };
    if submission.password.is_empty() {
        return Err(ApiError::BadRequest);
    }

    // No await between allocation and spawn: the handler future cannot be
    // dropped in between, so every issued id gets exactly one completion
    // task and the drain accounting stays balanced.
    let id = state.store.submit()?;
    jobs::spawn_digest(
        Arc::clone(&state.store),
        state.config.hash_delay,
        id,
        submission.password,
    );

    Ok(id.to_string())
}

/// `GET /hash/{id}`: returns the digest of a settled submission.
///
/// Malformed identifiers are a not-found condition, never a server error.
async fn lookup_hash(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    let id = parse_hash_id(&id).ok_or(ApiError::NotFound)?;
    state.store.get(id).ok_or(ApiError::NotFound)
}

/// `GET /stats`: aggregate statistics as JSON.
async fn stats(State(state): State<AppState>) -> Json<Stats> {
    Json(state.store.stats())
}

/// `/shutdown` (any verb): idempotent drain trigger, always `200 OK`.
///
/// The transition latches the flag, fires the listener-stop signal, and
/// evaluates the drain condition; with nothing outstanding the process
/// terminates right away.
async fn request_shutdown(State(state): State<AppState>) -> &'static str {
    state.store.begin_shutdown();
    "OK"
}

/// Accepts exactly one positive decimal integer: all ASCII digits, non-zero,
/// no sign, no trailing text. Anything else is treated as an unknown id.
fn parse_hash_id(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().filter(|&id| id != 0)
}
