//! DNS codec tests.

use super::*;
use crate::error_handling::DnsError;
use bytes::BytesMut;
use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

fn header(id: u16, flags: u16, counts: [u16; 4]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(12);
    buf.extend_from_slice(&id.to_be_bytes());
    buf.extend_from_slice(&flags.to_be_bytes());
    for count in counts {
        buf.extend_from_slice(&count.to_be_bytes());
    }
    buf
}

fn record(name: &[u8], rtype: u16, ttl: u32, rdata: &[u8]) -> Vec<u8> {
    let mut buf = name.to_vec();
    buf.extend_from_slice(&rtype.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes());
    buf.extend_from_slice(&ttl.to_be_bytes());
    buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    buf.extend_from_slice(rdata);
    buf
}

/// `example.com` question at offset 12, followed by the given answers.
fn response_with(answers: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = header(0x1234, 0x8180, [1, answers.len() as u16, 0, 0]);
    buf.extend_from_slice(b"\x07example\x03com\x00");
    buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    for answer in answers {
        buf.extend_from_slice(answer);
    }
    buf
}

const QNAME_PTR: &[u8] = &[0xC0, 0x0C];

// Encoding

#[test]
fn test_encode_query_layout() {
    let query = DnsQuery::new("example.com", RecordType::A).with_id(0xABCD);
    let bytes = encode_query(&query).unwrap();

    let mut expected = vec![0xAB, 0xCD, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
    expected.extend_from_slice(b"\x07example\x03com\x00");
    expected.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
    assert_eq!(bytes, expected);
}

#[test]
fn test_encode_query_sets_cd_flag() {
    let query = DnsQuery::new("example.com", RecordType::AAAA)
        .with_id(1)
        .with_checking_disabled(true);
    let bytes = encode_query(&query).unwrap();
    assert_eq!(&bytes[2..4], &[0x01, 0x10]);
    assert_eq!(&bytes[bytes.len() - 4..], &[0x00, 0x1C, 0x00, 0x01]);
}

#[test]
fn test_encode_trailing_dot_and_root() {
    let mut a = BytesMut::new();
    let mut b = BytesMut::new();
    encode_domain_name("example.com.", &mut a).unwrap();
    encode_domain_name("example.com", &mut b).unwrap();
    assert_eq!(a, b);

    let mut root = BytesMut::new();
    encode_domain_name(".", &mut root).unwrap();
    assert_eq!(&root[..], &[0]);
}

#[test]
fn test_encode_rejects_long_label() {
    let name = format!("{}.com", "a".repeat(64));
    let err = encode_query(&DnsQuery::new(name, RecordType::A)).unwrap_err();
    assert!(matches!(err, DnsError::Encode(_)));
}

#[test]
fn test_encode_accepts_63_byte_label() {
    let name = format!("{}.com", "a".repeat(63));
    assert!(encode_query(&DnsQuery::new(name, RecordType::A)).is_ok());
}

#[test]
fn test_encode_rejects_empty_label() {
    let err = encode_query(&DnsQuery::new("a..com", RecordType::A)).unwrap_err();
    assert!(matches!(err, DnsError::Encode(_)));
}

#[test]
fn test_encode_rejects_long_name() {
    let name = vec!["a".repeat(63); 5].join(".");
    let err = encode_query(&DnsQuery::new(name, RecordType::A)).unwrap_err();
    assert!(matches!(err, DnsError::Encode(_)));
}

// Domain names

#[test]
fn test_pointer_chain_resume_offset() {
    let mut buf = header(0, 0, [0, 0, 0, 0]);
    buf.extend_from_slice(b"\x07example\x03com\x00"); // 12..25
    buf.extend_from_slice(b"\x03www\xC0\x0C"); // 25..31
    buf.extend_from_slice(&[0xC0, 25]); // 31..33

    let (name, next) = decode_domain_name(&buf, 31).unwrap();
    assert_eq!(name, "www.example.com");
    assert_eq!(next, 33);

    let (name, next) = decode_domain_name(&buf, 25).unwrap();
    assert_eq!(name, "www.example.com");
    assert_eq!(next, 31);
}

#[test]
fn test_self_pointer_is_malformed() {
    let mut buf = header(0, 0, [0, 0, 0, 0]);
    buf.extend_from_slice(&[0xC0, 0x0C]);
    let err = decode_domain_name(&buf, 12).unwrap_err();
    assert!(matches!(err, DnsError::MalformedPacket { .. }));
}

#[test]
fn test_forward_pointer_is_malformed() {
    let mut buf = header(0, 0, [0, 0, 0, 0]);
    buf.extend_from_slice(&[0xC0, 0x0E, 0x00]);
    let err = decode_domain_name(&buf, 12).unwrap_err();
    assert!(matches!(err, DnsError::MalformedPacket { .. }));
}

#[test]
fn test_pointer_loop_between_segments_is_malformed() {
    // 12: "a" -> pointer to 16; 16: "b" -> pointer to 12
    let mut buf = header(0, 0, [0, 0, 0, 0]);
    buf.extend_from_slice(&[1, b'a', 0xC0, 16, 1, b'b', 0xC0, 12]);
    assert!(decode_domain_name(&buf, 12).is_err());
    assert!(decode_domain_name(&buf, 16).is_err());
}

#[test]
fn test_truncated_label_is_malformed() {
    let buf = [0x07, b'e', b'x'];
    match decode_domain_name(&buf, 0).unwrap_err() {
        DnsError::MalformedPacket {
            needed, available, ..
        } => {
            assert_eq!(needed, 7);
            assert_eq!(available, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_reserved_label_type_is_malformed() {
    let buf = [0x40, 0x00];
    assert!(decode_domain_name(&buf, 0).is_err());
}

// Messages

#[test]
fn test_decode_query_question_section() {
    let query = DnsQuery::new("example.com", RecordType::TXT).with_id(7);
    let message = decode_message(&encode_query(&query).unwrap()).unwrap();

    assert_eq!(message.id, 7);
    assert!(message.flags.recursion_desired);
    assert!(!message.flags.response);
    assert_eq!(message.questions.len(), 1);

    let question = &message.questions[0];
    assert_eq!(question.name, "example.com");
    assert_eq!(question.record_type, RecordType::TXT);
    assert_eq!(question.class, RecordClass::IN);
    assert_eq!(question.ttl, None);
    assert_eq!(question.data, RecordData::None);
}

#[test]
fn test_decode_answer_types() {
    let v6: Ipv6Addr = "2001:db8::1".parse().unwrap();
    let buf = response_with(&[
        record(QNAME_PTR, 1, 300, &[93, 184, 216, 34]),
        record(QNAME_PTR, 28, 300, &v6.octets()),
        record(QNAME_PTR, 5, 60, b"\x03www\xC0\x0C"),
        record(QNAME_PTR, 16, 60, b"\x06v=spf1\x04-all"),
        record(QNAME_PTR, 15, 60, &[0x00, 0x0A, 0xC0, 0x0C]),
    ]);

    let message = decode_message(&buf).unwrap();
    assert!(message.flags.response);
    assert!(message.flags.recursion_available);
    assert_eq!(message.flags.response_code, ResponseCode::NO_ERROR);
    assert_eq!(message.answers.len(), 5);

    let data: Vec<String> = message.answers.iter().map(|r| r.data.to_string()).collect();
    assert_eq!(
        data,
        vec![
            "93.184.216.34",
            "2001:db8::1",
            "www.example.com",
            "\"v=spf1\" \"-all\"",
            "000ac00c",
        ]
    );
    assert!(message.answers.iter().all(|r| r.name == "example.com"));
    assert_eq!(message.answers[0].ttl, Some(300));
    assert_eq!(message.answers[1].data.as_ipv6(), Some(v6));
    assert_eq!(message.answers[4].record_type, RecordType(15));
}

#[test]
fn test_rdlength_governs_cursor() {
    // A record with two trailing junk bytes in its rdata
    let buf = response_with(&[
        record(QNAME_PTR, 1, 300, &[10, 0, 0, 1, 0xFF, 0xFF]),
        record(QNAME_PTR, 1, 300, &[10, 0, 0, 2]),
    ]);

    let message = decode_message(&buf).unwrap();
    assert_eq!(
        message.answers[0].data,
        RecordData::A(Ipv4Addr::new(10, 0, 0, 1))
    );
    assert_eq!(
        message.answers[1].data,
        RecordData::A(Ipv4Addr::new(10, 0, 0, 2))
    );
}

#[test]
fn test_short_a_rdata_is_malformed() {
    let buf = response_with(&[record(QNAME_PTR, 1, 300, &[10, 0])]);
    assert!(matches!(
        decode_message(&buf).unwrap_err(),
        DnsError::MalformedPacket { .. }
    ));
}

#[test]
fn test_truncated_rdata_is_malformed() {
    let mut buf = response_with(&[record(QNAME_PTR, 28, 300, &[0u8; 16])]);
    buf.truncate(buf.len() - 3);
    match decode_message(&buf).unwrap_err() {
        DnsError::MalformedPacket { context, .. } => assert_eq!(context, "rdata"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_short_header_is_malformed() {
    let err = decode_message(&[0x12, 0x34, 0x81]).unwrap_err();
    assert!(matches!(
        err,
        DnsError::MalformedPacket {
            context: "header",
            ..
        }
    ));
}

#[test]
fn test_declared_count_past_end_is_malformed() {
    let buf = header(1, 0x8180, [1, 0, 0, 0]);
    assert!(decode_message(&buf).is_err());
}

#[test]
fn test_nxdomain_rcode() {
    let buf = header(1, 0x8183, [0, 0, 0, 0]);
    let message = decode_message(&buf).unwrap();
    assert_eq!(message.flags.response_code, ResponseCode::NX_DOMAIN);
    assert!(message.answers.is_empty());
}

// IPv6 text form

#[test]
fn test_format_ipv6_cases() {
    let cases = [
        ("::", "::"),
        ("::1", "::1"),
        ("1::", "1::"),
        ("2001:db8:0:0:1:0:0:1", "2001:db8::1:0:0:1"),
        ("2001:db8:0:1:1:1:1:1", "2001:db8:0:1:1:1:1:1"),
        ("2001:0:0:1:0:0:0:1", "2001:0:0:1::1"),
        ("fe80:0000:0000:0000:0202:b3ff:fe1e:8329", "fe80::202:b3ff:fe1e:8329"),
    ];
    for (input, expected) in cases {
        let addr: Ipv6Addr = input.parse().unwrap();
        assert_eq!(format_ipv6(&addr.octets()), expected, "input {input}");
    }
}

// Reverse names

#[test]
fn test_reverse_name_v4() {
    assert_eq!(
        reverse_name(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1))),
        "1.2.0.192.in-addr.arpa"
    );
}

#[test]
fn test_reverse_name_v6() {
    let ip: Ipv6Addr = "4321:0:1:2:3:4:567:89ab".parse().unwrap();
    assert_eq!(
        reverse_name_v6(ip),
        "b.a.9.8.7.6.5.0.4.0.0.0.3.0.0.0.2.0.0.0.1.0.0.0.0.0.0.0.1.2.3.4.ip6.arpa"
    );
}

// Properties

fn label() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9-]{0,62}"
}

proptest! {
    #[test]
    fn prop_domain_name_round_trip(labels in prop::collection::vec(label(), 1..=3)) {
        let name = labels.join(".");
        let mut buf = BytesMut::new();
        encode_domain_name(&name, &mut buf).unwrap();

        let (decoded, next) = decode_domain_name(&buf, 0).unwrap();
        prop_assert_eq!(decoded, name);
        prop_assert_eq!(next, buf.len());
    }

    #[test]
    fn prop_pointer_chain_resumes_after_first_pointer(
        labels in prop::collection::vec(label(), 1..=3),
        hops in 1usize..8,
    ) {
        let mut buf = BytesMut::from(&header(0, 0, [0, 0, 0, 0])[..]);
        encode_domain_name(&labels.join("."), &mut buf).unwrap();

        let mut target = 12usize;
        for _ in 0..hops {
            let here = buf.len();
            buf.extend_from_slice(&[0xC0 | (target >> 8) as u8, target as u8]);
            target = here;
        }

        let (name, next) = decode_domain_name(&buf, target).unwrap();
        prop_assert_eq!(name, labels.join("."));
        prop_assert_eq!(next, target + 2);
    }

    #[test]
    fn prop_ipv6_text_round_trip(octets in any::<[u8; 16]>()) {
        let text = format_ipv6(&octets);
        let parsed: Ipv6Addr = text.parse().unwrap();
        prop_assert_eq!(parsed.octets(), octets);
    }

    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_message(&bytes);
    }
}
