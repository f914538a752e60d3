//! Configuration types.
//!
//! `FetchConfig` is the fully resolved configuration one fetch call runs with.
//! It is produced by layering [`FetchOverrides`] on top of the built-in
//! defaults:
//!
//! call-time override > constructor override > built-in default
//!
//! Each layer only replaces the fields it sets; nothing is deep-merged
//! dynamically.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{DEFAULT_REDIRECT_COUNT, DEFAULT_TIMEOUT};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Which cache tier backs the fetch engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CacheType {
    /// No caching.
    Off,
    /// In-process memory cache.
    Memory,
    /// Disk cache. Not implemented; served from the memory tier.
    Disk,
}

impl CacheType {
    /// Name used in the cache-hit marker header.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::Off => "off",
            CacheType::Memory => "memory",
            CacheType::Disk => "disk",
        }
    }
}

/// Digest used for body fingerprints (cache equivalence and ETag backfill).
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HashAlgorithm {
    /// SHA-1
    Sha1,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashAlgorithm {
    /// Canonical lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    /// Accepts OpenSSL-style digest names (`sha256`, `SHA-256`, `sha2-256`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" | "sha2256" => Ok(HashAlgorithm::Sha256),
            "sha384" | "sha2384" => Ok(HashAlgorithm::Sha384),
            "sha512" | "sha2512" => Ok(HashAlgorithm::Sha512),
            _ => Err(format!("Unsupported hash algorithm: {}", s)),
        }
    }
}

/// Cache settings, including the Cache API query options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheSettings {
    /// Tier used for storing and matching.
    pub cache_type: CacheType,
    /// Digest for body equivalence and `ETag` backfill.
    pub hash_algorithm: HashAlgorithm,
    /// Treat every method as GET when storing and matching.
    pub ignore_method: bool,
    /// Drop the query string when comparing request URLs.
    pub ignore_search: bool,
    /// Store responses even when they carry `Vary: *`.
    pub ignore_vary: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            cache_type: CacheType::Memory,
            hash_algorithm: HashAlgorithm::Sha256,
            ignore_method: false,
            ignore_search: false,
            ignore_vary: false,
        }
    }
}

/// Fully resolved configuration for one fetch call.
///
/// # Examples
///
/// ```
/// use fetch_hole::config::{FetchConfig, FetchOverrides};
///
/// let ctor = FetchOverrides { redirect_count: Some(5), ..Default::default() };
/// let call = FetchOverrides { hard_fail: Some(false), ..Default::default() };
///
/// let resolved = FetchConfig::default().merged(&ctor).merged(&call);
/// assert_eq!(resolved.redirect_count, 5);
/// assert!(!resolved.hard_fail);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchConfig {
    /// Cache tier and matching options.
    pub cache: CacheSettings,
    /// Fail the call on a non-2xx, non-redirect status instead of returning it.
    pub hard_fail: bool,
    /// Verbosity of the engine's own per-request logging.
    pub log_level: LogLevel,
    /// Maximum redirects followed per call.
    pub redirect_count: usize,
    /// Deadline for each individual exchange.
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            hard_fail: true,
            log_level: LogLevel::Info,
            redirect_count: DEFAULT_REDIRECT_COUNT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchConfig {
    /// Returns a copy of `self` with every field set in `overrides` replaced.
    pub fn merged(&self, overrides: &FetchOverrides) -> FetchConfig {
        let cache = &overrides.cache;
        FetchConfig {
            cache: CacheSettings {
                cache_type: cache.cache_type.unwrap_or(self.cache.cache_type),
                hash_algorithm: cache.hash_algorithm.unwrap_or(self.cache.hash_algorithm),
                ignore_method: cache.ignore_method.unwrap_or(self.cache.ignore_method),
                ignore_search: cache.ignore_search.unwrap_or(self.cache.ignore_search),
                ignore_vary: cache.ignore_vary.unwrap_or(self.cache.ignore_vary),
            },
            hard_fail: overrides.hard_fail.unwrap_or(self.hard_fail),
            log_level: overrides.log_level.unwrap_or(self.log_level),
            redirect_count: overrides.redirect_count.unwrap_or(self.redirect_count),
            timeout: overrides.timeout.unwrap_or(self.timeout),
        }
    }

    /// Whether the per-call log level admits messages at `level`.
    pub fn log_enabled(&self, level: log::Level) -> bool {
        level <= log::LevelFilter::from(self.log_level)
    }

    /// Whether a cache tier is active for this call.
    pub fn caching_enabled(&self) -> bool {
        self.cache.cache_type != CacheType::Off
    }
}

/// Partial cache settings; `None` keeps the lower layer's value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheOverrides {
    /// Overrides `CacheSettings::cache_type`.
    pub cache_type: Option<CacheType>,
    /// Overrides `CacheSettings::hash_algorithm`.
    pub hash_algorithm: Option<HashAlgorithm>,
    /// Overrides `CacheSettings::ignore_method`.
    pub ignore_method: Option<bool>,
    /// Overrides `CacheSettings::ignore_search`.
    pub ignore_search: Option<bool>,
    /// Overrides `CacheSettings::ignore_vary`.
    pub ignore_vary: Option<bool>,
}

/// Partial fetch configuration; `None` keeps the lower layer's value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchOverrides {
    /// Cache overrides, merged field by field.
    pub cache: CacheOverrides,
    /// Overrides `FetchConfig::hard_fail`.
    pub hard_fail: Option<bool>,
    /// Overrides `FetchConfig::log_level`.
    pub log_level: Option<LogLevel>,
    /// Overrides `FetchConfig::redirect_count`.
    pub redirect_count: Option<usize>,
    /// Overrides `FetchConfig::timeout`.
    pub timeout: Option<Duration>,
}
