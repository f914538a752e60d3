//! Configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, limits, header names, media types)
//! - Layered fetch configuration (`FetchConfig` + `FetchOverrides`)
//! - CLI option types and parsing

mod cli;
mod constants;
mod types;

// Re-export all constants
pub use cli::{Command, Opt};
pub use constants::*;
pub use types::{
    CacheOverrides, CacheSettings, CacheType, FetchConfig, FetchOverrides, HashAlgorithm,
    LogFormat, LogLevel,
};
