//! Error categorization.
//!
//! Maps concrete [`FetchError`] values onto the [`ErrorType`] buckets used for
//! statistics.

use super::stats::FetchStats;
use super::types::{DnsError, ErrorType, FetchError};

/// Categorizes an HTTP status code that the caller did not accept.
pub fn categorize_status(status: u16) -> ErrorType {
    match status {
        400..=499 => ErrorType::UpstreamClientError,
        500..=599 => ErrorType::UpstreamServerError,
        _ => ErrorType::UpstreamOtherError,
    }
}

/// Categorizes a [`FetchError`] into an [`ErrorType`].
pub fn categorize_fetch_error(error: &FetchError) -> ErrorType {
    match error {
        FetchError::Dns(DnsError::MalformedPacket { .. }) => ErrorType::MalformedPacket,
        FetchError::Dns(DnsError::Encode(_)) => ErrorType::DnsEncodeError,
        FetchError::Timeout { .. } => ErrorType::Timeout,
        FetchError::Aborted { .. } => ErrorType::Aborted,
        FetchError::Upstream { status, .. } => categorize_status(*status),
        FetchError::Network { .. } => ErrorType::RedirectViolation,
        FetchError::CacheRejected(_) => ErrorType::CacheRejected,
        FetchError::Transport { .. } => ErrorType::TransportError,
        FetchError::Decode { .. } => ErrorType::DecodeError,
    }
}

impl FetchError {
    /// Statistics bucket for this error.
    pub fn error_type(&self) -> ErrorType {
        categorize_fetch_error(self)
    }
}

/// Records a fetch error in the statistics tracker.
pub fn update_error_stats(stats: &FetchStats, error: &FetchError) {
    stats.increment_error(error.error_type());
}
