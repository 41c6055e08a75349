//! # Portico Common
//!
//! Shared utilities for the Portico offline engine: logging configuration and
//! small helpers used across the workspace.
//!
//! Each Portico crate defines its own error enum; this crate deliberately does
//! not export a catch-all error type.

pub mod logging;
pub mod time;

pub use logging::{init_logging, LogConfig, LogFormat};
pub use time::now_millis;
