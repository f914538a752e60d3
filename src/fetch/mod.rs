//! Redirect-following fetch engine.
//!
//! This module provides `FetchHole`, which runs one fetch call as a small
//! state machine:
//!
//! ```text
//! CacheLookup -> Exchange -> Done
//!                   |  ^
//!                   v  |
//!                 Redirect          (any state) -> Failed
//! ```
//!
//! - `CacheLookup` serves an equivalent stored response, stamped as a hit
//! - `Exchange` sends one request through the [`HttpExchange`] with a deadline
//! - `Redirect` applies the WHATWG redirect step ([`follow_redirect`])
//! - `Done` stores cacheable responses, backfills `Content-Length`/`ETag`
//!   and attaches event channels to `text/event-stream` bodies
//!
//! Redirects are strictly sequential and nothing is retried.

mod backfill;
mod events;
mod redirects;

use std::sync::Arc;

use reqwest::Method;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::cache::MemoryCache;
use crate::config::{CacheType, FetchConfig, FetchOverrides};
use crate::error_handling::{
    categorize_status, update_error_stats, ErrorType, FetchError, FetchStats, InfoType,
    InitializationError,
};
use crate::http::{Body, FetchRequest, FetchResponse};
use crate::transport::{enforce_redirect_mode, HttpExchange, RedirectMode, ReqwestExchange};

// Re-export public API
pub use backfill::{backfill, fill_missing_headers};
pub use events::{demux, parse_line, EventChannels, StreamEvent};
pub use redirects::{follow_redirect, is_tainted, RedirectState};

/// Where a `Done` response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Cache,
    Network,
}

/// States of one fetch call.
enum State {
    CacheLookup(RedirectState),
    Exchange(RedirectState),
    Redirect(RedirectState, FetchResponse),
    Done(RedirectState, FetchResponse, Source),
    Failed(FetchError),
}

/// The fetch engine.
///
/// Cheap to share behind an `Arc`; the response cache and statistics are
/// the only state shared between concurrent calls.
pub struct FetchHole {
    exchange: Arc<dyn HttpExchange>,
    config: FetchConfig,
    cache: Arc<MemoryCache>,
    stats: Arc<FetchStats>,
}

impl FetchHole {
    /// Creates an engine whose defaults are the built-in configuration
    /// overlaid with `overrides`.
    pub fn new(exchange: Arc<dyn HttpExchange>, overrides: FetchOverrides) -> Self {
        let config = FetchConfig::default().merged(&overrides);
        if config.cache.cache_type == CacheType::Disk {
            log::warn!("Disk cache is not available; using the memory cache");
        }
        Self {
            exchange,
            config,
            cache: Arc::new(MemoryCache::new()),
            stats: Arc::new(FetchStats::new()),
        }
    }

    /// Creates an engine over a default [`ReqwestExchange`].
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the client cannot be built.
    pub fn with_reqwest(overrides: FetchOverrides) -> Result<Self, InitializationError> {
        Ok(Self::new(Arc::new(ReqwestExchange::with_defaults()?), overrides))
    }

    /// Constructor-level configuration (before call-time overrides).
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// The response cache shared by every call on this engine.
    pub fn cache(&self) -> &MemoryCache {
        &self.cache
    }

    /// Counters shared by every call on this engine.
    pub fn stats(&self) -> Arc<FetchStats> {
        Arc::clone(&self.stats)
    }

    /// Runs one fetch call.
    ///
    /// `overrides` take precedence over the constructor configuration for
    /// this call only.
    ///
    /// # Errors
    ///
    /// - `FetchError::Timeout` if an exchange exceeds the deadline
    /// - `FetchError::Aborted` if the request's abort token fires
    /// - `FetchError::Network` for redirect violations
    /// - `FetchError::Upstream` for a non-2xx final status in hard-fail mode
    /// - `FetchError::Transport` if the transport fails
    pub async fn fetch(
        &self,
        request: FetchRequest,
        overrides: &FetchOverrides,
    ) -> Result<FetchResponse, FetchError> {
        let config = self.config.merged(overrides);
        let method = request.method.clone();
        let original_url = request.url.clone();
        // Cache entries are keyed and matched on the request as the caller made it.
        let original = request.try_clone();

        let mut state = State::CacheLookup(RedirectState::new(request));
        let (rs, response, source) = loop {
            state = match state {
                State::CacheLookup(rs) => self.cache_lookup(rs, &config),
                State::Exchange(rs) => self.exchange_step(rs, &config).await,
                State::Redirect(rs, response) => {
                    match follow_redirect(rs, &response, config.redirect_count, &self.stats) {
                        Ok(rs) => State::Exchange(rs),
                        Err(e) => State::Failed(e),
                    }
                }
                State::Done(rs, response, source) => break (rs, response, source),
                State::Failed(e) => return Err(self.failed(e, &method, &original_url, &config)),
            };
        };

        let response = match source {
            Source::Cache => response,
            Source::Network => match self.finish(original.as_ref(), rs, response, &config).await {
                Ok(response) => response,
                Err(e) => return Err(self.failed(e, &method, &original_url, &config)),
            },
        };

        if config.log_enabled(log::Level::Info) {
            log::info!(
                "{} {} -> {} ({} redirect(s), {})",
                method,
                original_url,
                response.status.as_u16(),
                response.url_list.len().saturating_sub(1),
                match source {
                    Source::Cache => "cache hit",
                    Source::Network => "network",
                }
            );
        }
        Ok(response)
    }

    fn failed(
        &self,
        error: FetchError,
        method: &Method,
        url: &Url,
        config: &FetchConfig,
    ) -> FetchError {
        update_error_stats(&self.stats, &error);
        if config.log_enabled(log::Level::Warn) {
            log::warn!("{} {} failed: {}", method, url, error);
        }
        error
    }

    fn cache_lookup(&self, rs: RedirectState, config: &FetchConfig) -> State {
        if !config.caching_enabled() {
            return State::Exchange(rs);
        }
        match self.cache.match_request(&rs.current, &config.cache) {
            Some(hit) => {
                log::debug!("Cache hit: {}", rs.current.url);
                self.stats.increment_info(InfoType::CacheHit);
                State::Done(rs, hit, Source::Cache)
            }
            None => {
                self.stats.increment_info(InfoType::CacheMiss);
                State::Exchange(rs)
            }
        }
    }

    async fn exchange_step(&self, mut rs: RedirectState, config: &FetchConfig) -> State {
        let mode = if rs.hops >= config.redirect_count {
            RedirectMode::Error
        } else {
            RedirectMode::Manual
        };
        let url = rs.current.url.to_string();
        let abort = rs.current.abort.clone();

        if rs.current.has_unreplayable_body() {
            rs.body_consumed = true;
        }
        let outgoing = rs.current.take_for_send();
        let exchange = tokio::time::timeout(config.timeout, self.exchange.exchange(outgoing, mode));

        let result = match abort {
            Some(token) => tokio::select! {
                _ = token.cancelled() => {
                    return State::Failed(FetchError::Aborted { url });
                }
                result = exchange => result,
            },
            None => exchange.await,
        };

        let response = match result {
            Err(_) => {
                return State::Failed(FetchError::Timeout {
                    url,
                    after: config.timeout,
                })
            }
            Ok(Err(e)) => return State::Failed(e),
            Ok(Ok(response)) => response,
        };

        let response = match enforce_redirect_mode(response, mode, rs.hops) {
            Ok(response) => response,
            Err(e) => return State::Failed(e),
        };

        if response.is_redirect() {
            return State::Redirect(rs, response);
        }
        if response.ok() {
            return State::Done(rs, response, Source::Network);
        }

        let status = response.status.as_u16();
        if config.hard_fail {
            State::Failed(FetchError::Upstream {
                url,
                status,
                hops: rs.hops,
                reason: response.status_text.clone(),
            })
        } else {
            if config.log_enabled(log::Level::Warn) {
                log::warn!("{} returned HTTP {} (soft fail)", url, status);
            }
            self.stats.increment_error(categorize_status(status));
            State::Done(rs, response, Source::Network)
        }
    }

    /// Post-processing for a response that came from the network.
    async fn finish(
        &self,
        original: Option<&FetchRequest>,
        rs: RedirectState,
        mut response: FetchResponse,
        config: &FetchConfig,
    ) -> Result<FetchResponse, FetchError> {
        response.url_list = rs.current.url_list.clone();
        response.redirected = rs.hops > 0;

        if response.is_event_stream() {
            let cancel = rs
                .current
                .abort
                .as_ref()
                .map(CancellationToken::child_token)
                .unwrap_or_default();
            let (body, channels) = demux(std::mem::take(&mut response.body).into_stream(), cancel);
            response.body = Body::Stream(body);
            response.events = Some(channels);
            self.stats.increment_info(InfoType::EventStream);
            return Ok(response);
        }
        if response.is_streaming() {
            return Ok(response);
        }

        let algorithm = config.cache.hash_algorithm;
        let admissible = match original {
            Some(request) if config.caching_enabled() && response.ok() => {
                match MemoryCache::admissible(request, &response, &config.cache) {
                    Ok(()) => Some(request),
                    Err(rejection) => {
                        log::debug!("Not caching {}: {}", response.url, rejection);
                        self.stats.increment_error(ErrorType::CacheRejected);
                        None
                    }
                }
            }
            _ => None,
        };

        let Some(request) = admissible else {
            backfill(&mut response, algorithm);
            return Ok(response);
        };

        let body = std::mem::take(&mut response.body);
        let buffering = tokio::time::timeout(config.timeout, body.bytes());
        let buffered = match rs.current.abort.clone() {
            Some(token) => tokio::select! {
                _ = token.cancelled() => {
                    return Err(FetchError::Aborted {
                        url: response.url.to_string(),
                    });
                }
                result = buffering => result,
            },
            None => buffering.await,
        };
        let bytes = buffered.map_err(|_| FetchError::Timeout {
            url: response.url.to_string(),
            after: config.timeout,
        })??;
        response.body = Body::Full(bytes);
        backfill(&mut response, algorithm);

        match self.cache.put(request, &response, &config.cache) {
            Ok(()) => self.stats.increment_info(InfoType::CacheStore),
            Err(rejection) => {
                log::debug!("Not caching {}: {}", response.url, rejection);
                self.stats.increment_error(ErrorType::CacheRejected);
            }
        }
        Ok(response)
    }
}
