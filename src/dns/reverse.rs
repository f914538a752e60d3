//! Reverse-lookup (PTR) name construction.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Builds the PTR query name for an IPv4 address.
///
/// `192.0.2.1` becomes `1.2.0.192.in-addr.arpa`.
pub fn reverse_name_v4(ip: Ipv4Addr) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{d}.{c}.{b}.{a}.in-addr.arpa")
}

/// Builds the PTR query name for an IPv6 address.
///
/// Every hextet is expanded to four hex digits, the 32 nibbles are reversed
/// and dot-joined, and `.ip6.arpa` is appended.
pub fn reverse_name_v6(ip: Ipv6Addr) -> String {
    let nibbles: String = ip
        .segments()
        .iter()
        .map(|segment| format!("{:04x}", segment))
        .collect();

    let mut name: Vec<String> = nibbles.chars().rev().map(String::from).collect();
    name.push("ip6.arpa".to_string());
    name.join(".")
}

/// Builds the PTR query name for either address family.
pub fn reverse_name(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => reverse_name_v4(v4),
        IpAddr::V6(v6) => reverse_name_v6(v6),
    }
}
