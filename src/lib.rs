//! One-Time Secret Library
//!
//! Burn-after-read secret exchange: a client stores a plaintext and gets back
//! its fingerprint; the first caller presenting that fingerprint receives the
//! plaintext, which is then erased.
//!
//! The core is [`store::SecretStore`]. Everything else (configuration, the
//! axum router, process bootstrap) is plumbing around it.

pub mod config;
pub mod constants;
pub mod runtime;
pub mod server;
pub mod store;

pub use store::{fingerprint, SecretStore, TakeError};
