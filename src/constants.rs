//! # Constants
//!
//! Environment variable names and default values shared by the configuration
//! and runtime modules.

/// Path of the JSON file holding the persisted secret snapshot (required)
pub const DATA_FILE_PATH_ENV: &str = "DATA_FILE_PATH";

/// HTTP listen port
pub const PORT_ENV: &str = "PORT";

/// HTTP listen interface
pub const BIND_ADDRESS_ENV: &str = "BIND_ADDRESS";

/// Persist the snapshot after every successful take, not only after inserts
pub const FLUSH_ON_TAKE_ENV: &str = "FLUSH_ON_TAKE";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Default listen interface (all IPv4 interfaces)
pub const DEFAULT_BIND_ADDRESS: [u8; 4] = [0, 0, 0, 0];

/// Deletions are only persisted by the next insert unless enabled
pub const DEFAULT_FLUSH_ON_TAKE: bool = false;

/// Tracing filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "onetime_secret=info,tower_http=info";

/// Largest accepted create request body (8 MiB)
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;
