//! Logging utilities.
//!
//! This module centralizes logger initialization. It stays on the `log` facade
//! and only installs `env_logger` as the backend.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
