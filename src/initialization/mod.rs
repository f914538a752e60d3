//! Process-level initialization.
//!
//! This module provides functions to initialize shared resources:
//! - The `env_logger` backend (plain or JSON output)
//! - The `reqwest` client used by the default transport
//!
//! All initialization functions return `InitializationError` on failure.

mod client;
mod logger;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
