//! DNS parameter tables.
//!
//! Record type, class and response code name/number tables. Each table is a
//! static slice turned into an immutable bidirectional map on first use.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error_handling::DnsError;

/// Record types from the IANA registry that the codec knows by name.
const RECORD_TYPES: &[(&str, u16)] = &[
    ("A", 1),
    ("NS", 2),
    ("CNAME", 5),
    ("SOA", 6),
    ("PTR", 12),
    ("HINFO", 13),
    ("MX", 15),
    ("TXT", 16),
    ("RP", 17),
    ("AFSDB", 18),
    ("SIG", 24),
    ("KEY", 25),
    ("AAAA", 28),
    ("LOC", 29),
    ("SRV", 33),
    ("NAPTR", 35),
    ("KX", 36),
    ("CERT", 37),
    ("DNAME", 39),
    ("OPT", 41),
    ("APL", 42),
    ("DS", 43),
    ("SSHFP", 44),
    ("IPSECKEY", 45),
    ("RRSIG", 46),
    ("NSEC", 47),
    ("DNSKEY", 48),
    ("DHCID", 49),
    ("NSEC3", 50),
    ("NSEC3PARAM", 51),
    ("TLSA", 52),
    ("SMIMEA", 53),
    ("HIP", 55),
    ("CDS", 59),
    ("CDNSKEY", 60),
    ("OPENPGPKEY", 61),
    ("CSYNC", 62),
    ("ZONEMD", 63),
    ("SVCB", 64),
    ("HTTPS", 65),
    ("EUI48", 108),
    ("EUI64", 109),
    ("TKEY", 249),
    ("TSIG", 250),
    ("IXFR", 251),
    ("AXFR", 252),
    ("ANY", 255),
    ("URI", 256),
    ("CAA", 257),
];

const RECORD_CLASSES: &[(&str, u16)] = &[("IN", 1), ("CH", 3), ("HS", 4), ("NONE", 254), ("ANY", 255)];

const RESPONSE_CODES: &[(&str, u8)] = &[
    ("NOERROR", 0),
    ("FORMERR", 1),
    ("SERVFAIL", 2),
    ("NXDOMAIN", 3),
    ("NOTIMP", 4),
    ("REFUSED", 5),
    ("YXDOMAIN", 6),
    ("YXRRSET", 7),
    ("NXRRSET", 8),
    ("NOTAUTH", 9),
    ("NOTZONE", 10),
];

/// Immutable name <-> number map.
struct BiMap<N> {
    by_name: HashMap<&'static str, N>,
    by_number: HashMap<N, &'static str>,
}

impl<N: Copy + Eq + std::hash::Hash> BiMap<N> {
    fn from_table(table: &[(&'static str, N)]) -> Self {
        Self {
            by_name: table.iter().map(|&(name, n)| (name, n)).collect(),
            by_number: table.iter().map(|&(name, n)| (n, name)).collect(),
        }
    }
}

static TYPE_MAP: LazyLock<BiMap<u16>> = LazyLock::new(|| BiMap::from_table(RECORD_TYPES));
static CLASS_MAP: LazyLock<BiMap<u16>> = LazyLock::new(|| BiMap::from_table(RECORD_CLASSES));
static RCODE_MAP: LazyLock<BiMap<u8>> = LazyLock::new(|| BiMap::from_table(RESPONSE_CODES));

/// A DNS record type (QTYPE/TYPE field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordType(pub u16);

impl RecordType {
    /// IPv4 address.
    pub const A: RecordType = RecordType(1);
    /// Authoritative name server.
    pub const NS: RecordType = RecordType(2);
    /// Canonical name.
    pub const CNAME: RecordType = RecordType(5);
    /// Domain name pointer.
    pub const PTR: RecordType = RecordType(12);
    /// Text strings.
    pub const TXT: RecordType = RecordType(16);
    /// IPv6 address.
    pub const AAAA: RecordType = RecordType(28);

    /// Looks up a record type by its canonical name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `DnsError::Encode` if the name is not in the table.
    pub fn from_name(name: &str) -> Result<RecordType, DnsError> {
        TYPE_MAP
            .by_name
            .get(name.to_ascii_uppercase().as_str())
            .map(|&n| RecordType(n))
            .ok_or_else(|| DnsError::Encode(format!("Unknown record type: {}", name)))
    }

    /// Canonical name, if the type is in the table.
    pub fn name(&self) -> Option<&'static str> {
        TYPE_MAP.by_number.get(&self.0).copied()
    }

    /// Numeric value as sent on the wire.
    pub fn number(&self) -> u16 {
        self.0
    }
}

impl FromStr for RecordType {
    type Err = DnsError;

    /// Parses a type name (`AAAA`) or a decimal type number (`28`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u16>() {
            Ok(n) => Ok(RecordType(n)),
            Err(_) => RecordType::from_name(s),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "TYPE{}", self.0),
        }
    }
}

/// A DNS class. Only `IN` is ever sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordClass(pub u16);

impl RecordClass {
    /// Internet.
    pub const IN: RecordClass = RecordClass(1);

    /// Canonical name, if the class is in the table.
    pub fn name(&self) -> Option<&'static str> {
        CLASS_MAP.by_number.get(&self.0).copied()
    }

    /// Looks up a class by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<RecordClass> {
        CLASS_MAP
            .by_name
            .get(name.to_ascii_uppercase().as_str())
            .map(|&n| RecordClass(n))
    }
}

/// Response code from the header's low four bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResponseCode(pub u8);

impl ResponseCode {
    /// No error.
    pub const NO_ERROR: ResponseCode = ResponseCode(0);
    /// The name does not exist.
    pub const NX_DOMAIN: ResponseCode = ResponseCode(3);

    /// Canonical name, if the code is in the table.
    pub fn name(&self) -> Option<&'static str> {
        RCODE_MAP.by_number.get(&self.0).copied()
    }

    /// Looks up a response code by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<ResponseCode> {
        RCODE_MAP
            .by_name
            .get(name.to_ascii_uppercase().as_str())
            .map(|&n| ResponseCode(n))
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "RCODE{}", self.0),
        }
    }
}
