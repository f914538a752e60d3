//! Error handling and fetch statistics.
//!
//! This module provides:
//! - Error type definitions (DNS codec, cache rejections, fetch failures)
//! - Fetch statistics tracking (errors and info metrics)
//! - Error type extraction for statistics
//!
//! No component retries on its own; every error is surfaced to the caller,
//! who owns retry policy.

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_fetch_error, categorize_status, update_error_stats};
pub use stats::FetchStats;
pub use types::{
    BoxError, CacheRejection, DnsError, ErrorType, FetchError, InfoType, InitializationError,
};
