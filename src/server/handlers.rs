//! Request handlers
//!
//! - `GET /healthcheck` - liveness probe
//! - `POST /` - store a secret, returns its id
//! - `GET /` - missing id, always 400
//! - `GET /{id}` - burn-after-read retrieval

use super::responses::{data_response, json_response, text_error, CreateSecretResponse};
use super::AppState;
use crate::store::TakeError;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use std::collections::HashMap;
use tracing::{info, warn};

/// Field holding the secret in a create request body
pub const PLAIN_TEXT_FIELD: &str = "plain_text";

/// Extract the secret from a create request body.
///
/// The body must be a JSON object of string (or `null`) values, or `null`
/// itself. A missing or `null` `plain_text` field yields an empty secret.
///
/// # Errors
///
/// Fails when the body is not such an object.
pub fn parse_plain_text(body: &[u8]) -> Result<String, serde_json::Error> {
    let fields: Option<HashMap<String, Option<String>>> = serde_json::from_slice(body)?;
    Ok(fields
        .and_then(|mut fields| fields.remove(PLAIN_TEXT_FIELD))
        .flatten()
        .unwrap_or_default())
}

/// Health check
pub async fn health_check() -> &'static str {
    "ok"
}

/// Store a secret
///
/// The body is parsed as JSON whatever the `Content-Type` header says.
pub async fn create_secret(State(state): State<AppState>, body: Bytes) -> Response {
    let plain_text = match parse_plain_text(&body) {
        Ok(plain_text) => plain_text,
        Err(e) => {
            warn!(error = %e, "Rejected unparsable create request body");
            return text_error(StatusCode::BAD_REQUEST, "Failed to parse body");
        }
    };

    let id = state.store.insert(plain_text).await;
    info!("Stored secret");

    json_response(StatusCode::OK, &CreateSecretResponse { id })
}

/// Retrieve and delete a secret
pub async fn take_secret(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    take(&state, &id).await
}

/// `GET /` carries no id
pub async fn take_without_id(State(state): State<AppState>) -> Response {
    take(&state, "").await
}

/// Fallback for unsupported methods on known paths
pub async fn method_not_allowed() -> Response {
    text_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn take(state: &AppState, id: &str) -> Response {
    match state.store.take(id).await {
        Ok(plaintext) => {
            info!("Secret retrieved and burned");
            data_response(StatusCode::OK, plaintext)
        }
        Err(e) => {
            info!(reason = %e, "Secret retrieval refused");
            data_response(take_error_status(e), "")
        }
    }
}

/// HTTP status for a failed take
pub fn take_error_status(error: TakeError) -> StatusCode {
    match error {
        TakeError::EmptyId => StatusCode::BAD_REQUEST,
        TakeError::NotFound => StatusCode::NOT_FOUND,
    }
}
