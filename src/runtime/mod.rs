//! # Runtime Module
//!
//! Process bootstrap for the secret service: initialization, serving and
//! shutdown handling.

pub mod initialization;
pub mod shutdown;

pub use initialization::*;
pub use shutdown::*;
