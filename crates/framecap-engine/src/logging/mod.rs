//! Logging utilities.
//!
//! Centralizes logger initialization for binaries built on the engine.
//! Library code only ever talks to the `log` facade.

mod init;

pub use init::{init_logging, LoggingConfig};
