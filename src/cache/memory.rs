//! In-memory response cache.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::header::HeaderValue;
use reqwest::Method;

use super::equivalence::{cache_key, fetch_equivalent};
use crate::config::{CacheSettings, CacheType, CACHE_HIT_HEADER, HTTP_STATUS_PARTIAL_CONTENT};
use crate::error_handling::CacheRejection;
use crate::http::{FetchRequest, FetchResponse};

/// A stored request/response pair. Both bodies are buffered.
#[derive(Debug)]
pub struct CacheEntry {
    /// The request as the caller made it.
    pub request: FetchRequest,
    /// The stored response, stamped with the cache-hit header on a match.
    pub response: FetchResponse,
}

/// Single-slot-per-URL response cache.
///
/// Entries are immutable once stored and replaced wholesale under the write
/// lock, so a concurrent `match_request` sees either the old or the new pair.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
}

impl MemoryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, request: &FetchRequest) -> Option<Arc<CacheEntry>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&cache_key(&request.url)).cloned()
    }

    /// Checks the put-time rules without touching either body: non-GET
    /// requests (unless `ignore_method`), 206 responses and `Vary: *`
    /// (unless `ignore_vary`) are refused.
    pub fn admissible(
        request: &FetchRequest,
        response: &FetchResponse,
        settings: &CacheSettings,
    ) -> Result<(), CacheRejection> {
        if !settings.ignore_method && request.method != Method::GET {
            return Err(CacheRejection::Method(request.method.to_string()));
        }
        if response.status.as_u16() == HTTP_STATUS_PARTIAL_CONTENT {
            return Err(CacheRejection::PartialContent);
        }
        if !settings.ignore_vary && response.varies_on_everything() {
            return Err(CacheRejection::VaryWildcard);
        }
        Ok(())
    }

    /// Stores a copy of `request`/`response`, replacing any entry for the URL.
    ///
    /// # Errors
    ///
    /// Returns a `CacheRejection` if [`MemoryCache::admissible`] refuses the
    /// pair or either body is a stream. Nothing is stored in that case.
    pub fn put(
        &self,
        request: &FetchRequest,
        response: &FetchResponse,
        settings: &CacheSettings,
    ) -> Result<(), CacheRejection> {
        Self::admissible(request, response, settings)?;

        let entry = CacheEntry {
            request: request.try_clone().ok_or(CacheRejection::StreamingBody)?,
            response: response.try_clone().ok_or(CacheRejection::StreamingBody)?,
        };

        let key = cache_key(&request.url);
        log::debug!("Cache store: {}", key);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::new(entry));
        Ok(())
    }

    /// Returns a copy of the stored response if the stored request is
    /// equivalent to `request`, stamped with the cache-hit header.
    pub fn match_request(
        &self,
        request: &FetchRequest,
        settings: &CacheSettings,
    ) -> Option<FetchResponse> {
        let entry = self.lookup(request)?;
        if !fetch_equivalent(&entry.request, request, settings) {
            return None;
        }

        let mut response = entry.response.try_clone()?;
        response
            .headers
            .insert(CACHE_HIT_HEADER, HeaderValue::from_static(CacheType::Memory.as_str()));
        Some(response)
    }

    /// Removes the URL's entry if its request is equivalent to `request`.
    /// Returns true if an entry was removed.
    pub fn delete(&self, request: &FetchRequest, settings: &CacheSettings) -> bool {
        let Some(entry) = self.lookup(request) else {
            return false;
        };
        if !fetch_equivalent(&entry.request, request, settings) {
            return false;
        }

        let key = cache_key(&request.url);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Leave a pair stored by a concurrent put in place.
        match entries.get(&key) {
            Some(current) if Arc::ptr_eq(current, &entry) => {
                entries.remove(&key);
                true
            }
            _ => false,
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
