//! DNS message decoding (RFC 1035 wire format).
//!
//! Every read is bounds-checked against the buffer before it happens; a
//! short buffer surfaces as `DnsError::MalformedPacket` and never as a panic.

use std::net::Ipv4Addr;

use super::message::{DnsMessage, HeaderFlags, RecordData, ResourceRecord};
use super::types::{RecordClass, RecordType};
use crate::error_handling::DnsError;

const HEADER_LEN: usize = 12;
const POINTER_TAG: u8 = 0b1100_0000;

/// Bounds-checked big-endian reader over a message buffer.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    fn take(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DnsError> {
        let bytes = slice(self.buf, self.pos, n, context)?;
        self.pos += n;
        Ok(bytes)
    }

    fn u16(&mut self, context: &'static str) -> Result<u16, DnsError> {
        let b = self.take(2, context)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, context: &'static str) -> Result<u32, DnsError> {
        let b = self.take(4, context)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

fn malformed(context: &'static str, offset: usize, needed: usize, buf: &[u8]) -> DnsError {
    DnsError::MalformedPacket {
        context,
        offset,
        needed,
        available: buf.len().saturating_sub(offset),
    }
}

fn slice<'a>(
    buf: &'a [u8],
    offset: usize,
    n: usize,
    context: &'static str,
) -> Result<&'a [u8], DnsError> {
    match offset.checked_add(n) {
        Some(end) if end <= buf.len() => Ok(&buf[offset..end]),
        _ => Err(malformed(context, offset, n, buf)),
    }
}

/// Decodes a (possibly compressed) domain name starting at `offset`.
///
/// Returns the dotted name (`""` for the root) and the offset the caller
/// should resume at: just past the terminating zero byte, or, if a
/// compression pointer was followed, just past the *first* pointer.
///
/// A pointer must target an offset strictly below the start of the segment
/// being parsed (the initial offset, then each jump target), so the walk
/// always terminates.
pub fn decode_domain_name(buf: &[u8], offset: usize) -> Result<(String, usize), DnsError> {
    let mut labels: Vec<String> = Vec::new();
    let mut pos = offset;
    let mut segment_start = offset;
    let mut resume: Option<usize> = None;
    let mut wire_len = 0usize;

    loop {
        let len = *buf
            .get(pos)
            .ok_or_else(|| malformed("name length", pos, 1, buf))?;

        match len & POINTER_TAG {
            POINTER_TAG => {
                let b = slice(buf, pos, 2, "compression pointer")?;
                let target = (((b[0] & !POINTER_TAG) as usize) << 8) | b[1] as usize;
                if target >= segment_start {
                    return Err(malformed("compression pointer", pos, 2, buf));
                }
                if resume.is_none() {
                    resume = Some(pos + 2);
                }
                segment_start = target;
                pos = target;
            }
            0 => {
                if len == 0 {
                    pos += 1;
                    break;
                }
                let label = slice(buf, pos + 1, len as usize, "label")?;
                wire_len += len as usize + 1;
                if wire_len > super::encode::MAX_NAME_LENGTH {
                    return Err(malformed("name", offset, wire_len, buf));
                }
                labels.push(String::from_utf8_lossy(label).into_owned());
                pos += 1 + len as usize;
            }
            // 0b01 / 0b10 prefixes are reserved
            _ => return Err(malformed("label type", pos, 1, buf)),
        }
    }

    Ok((labels.join("."), resume.unwrap_or(pos)))
}

/// Formats 16 address bytes as 8 hex groups, replacing the leftmost longest
/// run of two or more zero groups with `::`.
pub fn format_ipv6(bytes: &[u8; 16]) -> String {
    let groups: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    let (mut best_start, mut best_len) = (0usize, 0usize);
    let mut i = 0;
    while i < groups.len() {
        if groups[i] == 0 {
            let start = i;
            while i < groups.len() && groups[i] == 0 {
                i += 1;
            }
            // strict comparison keeps the leftmost run on ties
            if i - start > best_len {
                best_start = start;
                best_len = i - start;
            }
        } else {
            i += 1;
        }
    }

    let hex = |gs: &[u16]| {
        gs.iter()
            .map(|g| format!("{:x}", g))
            .collect::<Vec<_>>()
            .join(":")
    };

    if best_len < 2 {
        return hex(&groups);
    }
    format!(
        "{}::{}",
        hex(&groups[..best_start]),
        hex(&groups[best_start + best_len..])
    )
}

fn decode_txt(rdata: &[u8]) -> Result<Vec<String>, DnsError> {
    let mut strings = Vec::new();
    let mut pos = 0;
    while pos < rdata.len() {
        let len = rdata[pos] as usize;
        let text = slice(rdata, pos + 1, len, "txt string")?;
        strings.push(String::from_utf8_lossy(text).into_owned());
        pos += 1 + len;
    }
    Ok(strings)
}

fn decode_rdata(
    buf: &[u8],
    record_type: RecordType,
    rdata_offset: usize,
    rdata: &[u8],
) -> Result<RecordData, DnsError> {
    let data = match record_type {
        RecordType::A => {
            let b = slice(rdata, 0, 4, "A rdata").map_err(|_| {
                malformed("A rdata", rdata_offset, 4, &buf[..rdata_offset + rdata.len()])
            })?;
            RecordData::A(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
        }
        RecordType::AAAA => {
            let b = slice(rdata, 0, 16, "AAAA rdata").map_err(|_| {
                malformed(
                    "AAAA rdata",
                    rdata_offset,
                    16,
                    &buf[..rdata_offset + rdata.len()],
                )
            })?;
            let mut octets = [0u8; 16];
            octets.copy_from_slice(b);
            RecordData::Aaaa(octets)
        }
        RecordType::CNAME => RecordData::Cname(decode_domain_name(buf, rdata_offset)?.0),
        RecordType::NS => RecordData::Ns(decode_domain_name(buf, rdata_offset)?.0),
        RecordType::PTR => RecordData::Ptr(decode_domain_name(buf, rdata_offset)?.0),
        RecordType::TXT => RecordData::Txt(decode_txt(rdata)?),
        _ => RecordData::Opaque(rdata.to_vec()),
    };
    Ok(data)
}

fn decode_record(
    reader: &mut Reader<'_>,
    question: bool,
) -> Result<ResourceRecord, DnsError> {
    let (name, next) = decode_domain_name(reader.buf, reader.pos)?;
    reader.pos = next;

    let record_type = RecordType(reader.u16("record type")?);
    let class = RecordClass(reader.u16("record class")?);

    if question {
        return Ok(ResourceRecord {
            name,
            record_type,
            class,
            ttl: None,
            data: RecordData::None,
        });
    }

    let ttl = reader.u32("ttl")?;
    let rdlength = reader.u16("rdata length")? as usize;
    let rdata_offset = reader.pos;
    let rdata = reader.take(rdlength, "rdata")?;

    // The cursor already sits past the declared rdata; nothing the type
    // decoder consumes can move it.
    let data = decode_rdata(reader.buf, record_type, rdata_offset, rdata)?;

    Ok(ResourceRecord {
        name,
        record_type,
        class,
        ttl: Some(ttl),
        data,
    })
}

/// Decodes a complete DNS message.
///
/// # Errors
///
/// Returns `DnsError::MalformedPacket` if any declared length or count runs
/// past the end of `buf`.
pub fn decode_message(buf: &[u8]) -> Result<DnsMessage, DnsError> {
    let mut reader = Reader::new(buf, 0);
    if buf.len() < HEADER_LEN {
        return Err(malformed("header", 0, HEADER_LEN, buf));
    }

    let id = reader.u16("header")?;
    let flags = HeaderFlags::from_bits(reader.u16("header")?);
    let qdcount = reader.u16("header")?;
    let ancount = reader.u16("header")?;
    let nscount = reader.u16("header")?;
    let arcount = reader.u16("header")?;

    let mut section = |count: u16, question: bool| -> Result<Vec<ResourceRecord>, DnsError> {
        (0..count)
            .map(|_| decode_record(&mut reader, question))
            .collect()
    };

    let questions = section(qdcount, true)?;
    let answers = section(ancount, false)?;
    let authorities = section(nscount, false)?;
    let additionals = section(arcount, false)?;

    Ok(DnsMessage {
        id,
        flags,
        questions,
        answers,
        authorities,
        additionals,
    })
}
