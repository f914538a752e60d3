//! DNS message model.
//!
//! Messages and records are created per query/response and discarded once
//! mapped to the caller's shape.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::types::{RecordClass, RecordType, ResponseCode};

/// Header flags of a decoded message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderFlags {
    /// QR: message is a response.
    pub response: bool,
    /// OPCODE (4 bits); 0 for a standard query.
    pub opcode: u8,
    /// AA
    pub authoritative: bool,
    /// TC
    pub truncated: bool,
    /// RD
    pub recursion_desired: bool,
    /// RA
    pub recursion_available: bool,
    /// AD
    pub authenticated_data: bool,
    /// CD
    pub checking_disabled: bool,
    /// RCODE
    pub response_code: ResponseCode,
}

const QR_MASK: u16 = 0x8000;
const OPCODE_SHIFT: u16 = 11;
const AA_MASK: u16 = 0x0400;
const TC_MASK: u16 = 0x0200;
const RD_MASK: u16 = 0x0100;
const RA_MASK: u16 = 0x0080;
const AD_MASK: u16 = 0x0020;
const CD_MASK: u16 = 0x0010;
const RCODE_MASK: u16 = 0x000F;

impl HeaderFlags {
    /// Unpacks the 16-bit flags word of the header.
    pub fn from_bits(bits: u16) -> Self {
        Self {
            response: bits & QR_MASK != 0,
            opcode: ((bits >> OPCODE_SHIFT) & 0x0F) as u8,
            authoritative: bits & AA_MASK != 0,
            truncated: bits & TC_MASK != 0,
            recursion_desired: bits & RD_MASK != 0,
            recursion_available: bits & RA_MASK != 0,
            authenticated_data: bits & AD_MASK != 0,
            checking_disabled: bits & CD_MASK != 0,
            response_code: ResponseCode((bits & RCODE_MASK) as u8),
        }
    }

    /// Packs the flags back into the 16-bit header word.
    pub fn to_bits(&self) -> u16 {
        let mut bits = ((self.opcode as u16) & 0x0F) << OPCODE_SHIFT;
        bits |= (self.response_code.0 as u16) & RCODE_MASK;
        for (set, mask) in [
            (self.response, QR_MASK),
            (self.authoritative, AA_MASK),
            (self.truncated, TC_MASK),
            (self.recursion_desired, RD_MASK),
            (self.recursion_available, RA_MASK),
            (self.authenticated_data, AD_MASK),
            (self.checking_disabled, CD_MASK),
        ] {
            if set {
                bits |= mask;
            }
        }
        bits
    }
}

/// Type-specific record data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    /// Question records carry no data.
    None,
    /// IPv4 address.
    A(Ipv4Addr),
    /// Raw 16 bytes, rendered with zero-run compression.
    Aaaa([u8; 16]),
    /// Canonical name.
    Cname(String),
    /// Name server.
    Ns(String),
    /// Reverse-lookup target.
    Ptr(String),
    /// Character strings, in order.
    Txt(Vec<String>),
    /// Types without a decoder keep their raw rdata.
    Opaque(Vec<u8>),
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::None => Ok(()),
            RecordData::A(addr) => write!(f, "{}", addr),
            RecordData::Aaaa(bytes) => f.write_str(&super::decode::format_ipv6(bytes)),
            RecordData::Cname(name) | RecordData::Ns(name) | RecordData::Ptr(name) => {
                f.write_str(name)
            }
            RecordData::Txt(strings) => {
                let quoted: Vec<String> = strings.iter().map(|s| format!("\"{}\"", s)).collect();
                f.write_str(&quoted.join(" "))
            }
            RecordData::Opaque(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

impl RecordData {
    /// Returns the IPv6 address for AAAA data.
    pub fn as_ipv6(&self) -> Option<Ipv6Addr> {
        match self {
            RecordData::Aaaa(bytes) => Some(Ipv6Addr::from(*bytes)),
            _ => None,
        }
    }
}

/// One record from any of the four sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Owner name, without a trailing dot.
    pub name: String,
    /// TYPE (QTYPE for questions).
    pub record_type: RecordType,
    /// CLASS (QCLASS for questions).
    pub class: RecordClass,
    /// Absent for question records.
    pub ttl: Option<u32>,
    /// Decoded rdata.
    pub data: RecordData,
}

/// A decoded DNS message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsMessage {
    /// Transaction id.
    pub id: u16,
    /// Header flags.
    pub flags: HeaderFlags,
    /// Question section.
    pub questions: Vec<ResourceRecord>,
    /// Answer section.
    pub answers: Vec<ResourceRecord>,
    /// Authority section.
    pub authorities: Vec<ResourceRecord>,
    /// Additional section.
    pub additionals: Vec<ResourceRecord>,
}

/// A query to be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery {
    /// Transaction id.
    pub id: u16,
    /// Name to resolve.
    pub name: String,
    /// QTYPE
    pub record_type: RecordType,
    /// Sets the CD bit.
    pub checking_disabled: bool,
}

impl DnsQuery {
    /// Creates a query with a random transaction id and recursion desired.
    pub fn new(name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            id: rand::random::<u16>(),
            name: name.into(),
            record_type,
            checking_disabled: false,
        }
    }

    /// Replaces the random transaction id.
    pub fn with_id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    /// Sets the CD bit.
    pub fn with_checking_disabled(mut self, cd: bool) -> Self {
        self.checking_disabled = cd;
        self
    }
}
