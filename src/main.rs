//! # One-Time Secret Service
//!
//! HTTP service storing secrets that can be read exactly once.
//!
//! ## Endpoints
//!
//! - `GET /healthcheck` returns `ok`
//! - `POST /` with `{"plain_text": "..."}` returns `{"id": "<md5>"}`
//! - `GET /<id>` returns `{"data": "..."}` once, then 404
//!
//! ## Configuration
//!
//! - `DATA_FILE_PATH` (required): JSON file holding the secret snapshot
//! - `PORT` (default `3000`), `BIND_ADDRESS` (default `0.0.0.0`)
//! - `FLUSH_ON_TAKE` (default `false`): persist deletions immediately
//! - `RUST_LOG`: tracing filter

use anyhow::Result;
use onetime_secret::runtime::{initialize, serve};

#[tokio::main]
async fn main() -> Result<()> {
    let init_result = initialize().await?;

    serve(init_result).await
}
