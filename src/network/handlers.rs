//! Request handlers
//!
//! Translate HTTP requests into engine calls and engine results into
//! status codes.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::put,
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::engine::Engine;
use crate::error::{KvError, Result};

/// Build the `/v1/{key}` router around a shared engine
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route(
            "/v1/{key}",
            put(put_value).get(get_value).delete(delete_value),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

async fn put_value(
    State(engine): State<Arc<Engine>>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<StatusCode> {
    let value = String::from_utf8(body.to_vec())
        .map_err(|e| KvError::InvalidValue(format!("request body is not UTF-8: {}", e)))?;
    run_blocking(move || engine.put(&key, &value)).await?;
    Ok(StatusCode::CREATED)
}

async fn get_value(
    State(engine): State<Arc<Engine>>,
    Path(key): Path<String>,
) -> Result<String> {
    engine.get(&key)
}

async fn delete_value(
    State(engine): State<Arc<Engine>>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    run_blocking(move || engine.delete(&key)).await?;
    Ok(StatusCode::OK)
}

/// Mutations may block on a full log queue, so keep them off the async workers
async fn run_blocking<F>(f: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| KvError::Network(format!("handler task failed: {}", e)))?
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for KvError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            KvError::KeyNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            KvError::WriterClosed => (StatusCode::INTERNAL_SERVER_ERROR, "WRITER_CLOSED"),
            KvError::InvalidValue(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_VALUE"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(ErrorBody {
            error: code,
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}
