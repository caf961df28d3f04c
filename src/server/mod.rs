//! # HTTP Server
//!
//! Axum router exposing the secret store.
//!
//! Request paths carry secret ids, so neither the trace spans nor the request
//! log record the raw URI; they record the matched route template instead.

mod handlers;
mod responses;

pub use handlers::{
    create_secret, health_check, method_not_allowed, parse_plain_text, take_error_status,
    take_secret, take_without_id, PLAIN_TEXT_FIELD,
};
pub use responses::{
    data_response, json_response, text_error, CreateSecretResponse, SecretDataResponse,
};

use crate::constants::MAX_BODY_BYTES;
use crate::store::SecretStore;
use axum::extract::{DefaultBodyLimit, MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<SecretStore>,
}

impl AppState {
    pub fn new(store: Arc<SecretStore>) -> Self {
        Self { store }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/healthcheck",
            get(health_check)
                .head(method_not_allowed)
                .fallback(method_not_allowed),
        )
        .route(
            "/",
            get(take_without_id)
                .head(method_not_allowed)
                .post(create_secret)
                .fallback(method_not_allowed),
        )
        // Every other path is an id; POST stores regardless of the path.
        // HEAD is routed explicitly, otherwise axum runs the GET handler and burns the secret.
        .route(
            "/{*id}",
            get(take_secret)
                .head(method_not_allowed)
                .post(create_secret)
                .fallback(method_not_allowed),
        )
        .route_layer(middleware::from_fn(logging_middleware))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http().make_span_with(
                |request: &Request| {
                    tracing::info_span!("http_request", method = %request.method())
                },
            )),
        )
        .with_state(state)
}

/// Log method, route template and status of every routed request
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_owned(), |path| path.as_str().to_owned());

    let response = next.run(request).await;

    info!(
        %method,
        route = %route,
        status = response.status().as_u16(),
        "Request handled"
    );
    response
}
