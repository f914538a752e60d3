//! fetch_hole library: an HTTP request pipeline with DoH lookups,
//! WHATWG redirect following and response caching
//!
//! This library wraps a single-exchange HTTP primitive ([`HttpExchange`]) with:
//! - A redirect-following fetch engine ([`FetchHole`]) that strips credentials
//!   across origins, rewrites methods and bodies, and resolves referrer policy
//! - A content-addressable in-memory response cache
//! - `Content-Length`/`ETag` backfill and `text/event-stream` demultiplexing
//! - A DNS-over-HTTPS client ([`DohClient`]) with a bounds-checked wire codec
//!
//! # Example
//!
//! ```no_run
//! use fetch_hole::{FetchHole, FetchOverrides, FetchRequest};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fetch_hole = FetchHole::with_reqwest(FetchOverrides::default())?;
//! let request = FetchRequest::get("https://example.com/")?;
//!
//! let response = fetch_hole.fetch(request, &FetchOverrides::default()).await?;
//! println!("{} after {} redirect(s)", response.status, response.url_list.len() - 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Event-stream consumption runs on a
//! spawned task.

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod dns;
pub mod doh;
pub mod error_handling;
pub mod fetch;
pub mod http;
pub mod initialization;
pub mod transport;

// Re-export public API
pub use cache::MemoryCache;
pub use config::{
    CacheOverrides, CacheSettings, CacheType, FetchConfig, FetchOverrides, HashAlgorithm,
    LogFormat, LogLevel,
};
pub use doh::{DohClient, DohRequest, DohResponse};
pub use error_handling::{FetchError, FetchStats};
pub use fetch::{FetchHole, StreamEvent};
pub use http::{Body, FetchRequest, FetchResponse, ReferrerPolicy};
pub use transport::{HttpExchange, RedirectMode, ReqwestExchange};
