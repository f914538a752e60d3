//! DNS wire codec.
//!
//! This module provides:
//! - Record type, class and response code tables
//! - The message model (`DnsMessage`, `ResourceRecord`, `HeaderFlags`)
//! - RFC 1035 query encoding and bounds-checked response decoding
//! - Reverse-lookup name construction for PTR queries
//!
//! Decoding works on untrusted network bytes: every length is validated
//! before it is read, and compression pointers may only point backwards.

mod decode;
mod encode;
mod message;
mod reverse;
mod types;

// Re-export public API
pub use decode::{decode_domain_name, decode_message, format_ipv6};
pub use encode::{encode_domain_name, encode_query, MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
pub use message::{DnsMessage, DnsQuery, HeaderFlags, RecordData, ResourceRecord};
pub use reverse::{reverse_name, reverse_name_v4, reverse_name_v6};
pub use types::{RecordClass, RecordType, ResponseCode};

#[cfg(test)]
mod tests;
