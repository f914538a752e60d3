//! DNS query encoding (RFC 1035 wire format).

use bytes::{BufMut, BytesMut};

use super::message::{DnsQuery, HeaderFlags};
use super::types::RecordClass;
use crate::error_handling::DnsError;

/// Maximum length of a single label.
pub const MAX_LABEL_LENGTH: usize = 63;
/// Maximum length of an encoded name, including length bytes and the root.
pub const MAX_NAME_LENGTH: usize = 255;

/// Encodes a domain name as length-prefixed labels terminated by a zero byte.
///
/// A trailing dot is accepted; `""` and `"."` encode the root.
///
/// # Errors
///
/// Returns `DnsError::Encode` for empty interior labels, labels longer than
/// 63 bytes, or names longer than 255 bytes on the wire.
pub fn encode_domain_name(name: &str, buf: &mut BytesMut) -> Result<(), DnsError> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    let start = buf.len();

    if !trimmed.is_empty() {
        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(DnsError::Encode(format!("Empty label in name: {}", name)));
            }
            if label.len() > MAX_LABEL_LENGTH {
                return Err(DnsError::Encode(format!(
                    "Label '{}' is {} bytes (max {})",
                    label,
                    label.len(),
                    MAX_LABEL_LENGTH
                )));
            }
            buf.put_u8(label.len() as u8);
            buf.put_slice(label.as_bytes());
        }
    }
    buf.put_u8(0);

    let encoded_len = buf.len() - start;
    if encoded_len > MAX_NAME_LENGTH {
        return Err(DnsError::Encode(format!(
            "Name is {} bytes on the wire (max {}): {}",
            encoded_len, MAX_NAME_LENGTH, name
        )));
    }
    Ok(())
}

/// Encodes a single-question query.
///
/// Header: the query's id, RD set (CD when requested), QDCOUNT 1, all other
/// counts zero. Question: the encoded name, QTYPE, QCLASS IN.
pub fn encode_query(query: &DnsQuery) -> Result<Vec<u8>, DnsError> {
    let mut buf = BytesMut::with_capacity(12 + query.name.len() + 6);

    let flags = HeaderFlags {
        recursion_desired: true,
        checking_disabled: query.checking_disabled,
        ..Default::default()
    };

    buf.put_u16(query.id);
    buf.put_u16(flags.to_bits());
    buf.put_u16(1); // QDCOUNT
    buf.put_u16(0); // ANCOUNT
    buf.put_u16(0); // NSCOUNT
    buf.put_u16(0); // ARCOUNT

    encode_domain_name(&query.name, &mut buf)?;
    buf.put_u16(query.record_type.number());
    buf.put_u16(RecordClass::IN.0);

    Ok(buf.to_vec())
}
