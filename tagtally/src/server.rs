//! HTTP transport: `POST /` with a JSON array of URLs answers with one
//! document per distinct URL.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tagtally_core::BatchRunner;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    runner: Arc<BatchRunner>,
}

pub fn router(runner: BatchRunner) -> Router {
    let state = AppState {
        runner: Arc::new(runner),
    };

    Router::new()
        .route("/", post(submit_batch).fallback(method_not_allowed))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    runner: BatchRunner,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(runner))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn submit_batch(State(state): State<AppState>, body: Bytes) -> Response {
    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Please send a request body");
    }

    let urls: Vec<String> = match serde_json::from_slice(&body) {
        Ok(urls) => urls,
        Err(e) => {
            warn!("Rejected batch request: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Body must be a JSON array of URL strings: {}", e),
            );
        }
    };

    info!("Batch request with {} URLs", urls.len());
    let batch = state.runner.run(&urls).await;

    Json(batch).into_response()
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let limiter = state.runner.limiter();
    Json(json!({
        "status": "ok",
        "capacity": limiter.capacity(),
        "available": limiter.available(),
    }))
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Only POST is supported")
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}
