//! DNS over HTTPS.
//!
//! This module provides:
//! - The request model (`DohRequest`) and wire-format selection
//! - The provider JSON answer schema, shared by binary answers
//! - `DohClient`, which sends questions through an [`HttpExchange`](crate::transport::HttpExchange)
//!
//! A provider URL whose path is `/dns-query` is spoken to in RFC 8484
//! binary; anything else gets the JSON API.

mod client;
mod types;

// Re-export public API
pub use client::DohClient;
pub use types::{DohContentType, DohRecord, DohRequest, DohResponse};
