//! Response cache.
//!
//! This module provides:
//! - `MemoryCache`, a single-slot-per-URL in-memory store
//! - Request equivalence (URL, method, header multiset, body digest)
//! - The put-time rejection rules of the platform Cache API

mod equivalence;
mod memory;

// Re-export public API
pub use equivalence::{cache_key, fetch_equivalent};
pub use memory::{CacheEntry, MemoryCache};
