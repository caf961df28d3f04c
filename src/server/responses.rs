//! Response formatting
//!
//! JSON bodies are encoded up front so `Content-Length` can be set explicitly,
//! matching the wire format existing clients expect:
//! - Create: `{"id": "<fingerprint>"}`
//! - Retrieve: `{"data": "<plaintext>"}` (empty string on any failure)
//!
//! Plain-text errors mirror the classic `http.Error` shape: message plus newline.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// Body returned after storing a secret
#[derive(Debug, Serialize)]
pub struct CreateSecretResponse {
    pub id: String,
}

/// Body returned when retrieving a secret
#[derive(Debug, Serialize)]
pub struct SecretDataResponse {
    pub data: String,
}

/// Encode `body` as JSON with explicit `Content-Type` and `Content-Length`.
///
/// Encoding failures become a 500; any store mutation has already happened.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let length = HeaderValue::from(bytes.len());
            (
                status,
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
                    (header::CONTENT_LENGTH, length),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to encode response body");
            text_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create response")
        }
    }
}

/// `{"data": ...}` response
pub fn data_response(status: StatusCode, data: impl Into<String>) -> Response {
    json_response(status, &SecretDataResponse { data: data.into() })
}

/// Plain-text error response
pub fn text_error(status: StatusCode, message: &str) -> Response {
    (status, format!("{message}\n")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response_sets_headers() {
        let response = data_response(StatusCode::NOT_FOUND, "");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        // {"data":""}
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "11");
    }

    #[test]
    fn test_text_error_is_plain_text() {
        let response = text_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }
}
