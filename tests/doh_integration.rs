//! DoH client tests against a local wiremock provider.

use std::net::IpAddr;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use fetch_hole::dns::{encode_domain_name, RecordType};
use fetch_hole::{DohClient, DohRequest, FetchError};
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Binary answer for `example.com AAAA`: one record, 2001:db8::1, TTL 60.
fn aaaa_answer() -> Vec<u8> {
    let mut buf = BytesMut::new();
    for word in [0u16, 0x8180, 1, 1, 0, 0] {
        buf.put_u16(word);
    }
    encode_domain_name("example.com", &mut buf).unwrap();
    buf.put_u16(28);
    buf.put_u16(1);
    buf.put_u16(0xC00C);
    buf.put_u16(28);
    buf.put_u16(1);
    buf.put_u32(60);
    buf.put_u16(16);
    buf.put_slice(&[0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    buf.to_vec()
}

fn client(server: &MockServer, endpoint: &str) -> DohClient {
    let provider = Url::parse(&format!("{}{}", server.uri(), endpoint)).unwrap();
    DohClient::with_reqwest(provider).expect("Failed to build DoH client")
}

#[tokio::test]
async fn test_binary_query_over_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dns-query"))
        .and(header("content-type", "application/dns-message"))
        .and(header("accept", "application/dns-message"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/dns-message")
                .set_body_bytes(aaaa_answer()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, "/dns-query")
        .query(&DohRequest::new("example.com").with_type(RecordType::AAAA))
        .await
        .unwrap();

    let answer = &response.answers()[0];
    assert_eq!(answer.record_type, 28);
    assert_eq!(answer.ttl, Some(60));
    assert_eq!(answer.data, "2001:db8::1");

    let received = server.received_requests().await.unwrap();
    // Header (12) + name (13) + QTYPE/QCLASS (4).
    assert_eq!(received[0].body.len(), 29);
}

#[tokio::test]
async fn test_json_query_over_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resolve"))
        .and(query_param("name", "example.com"))
        .and(query_param("type", "A"))
        .and(query_param("cd", "true"))
        .and(header("accept", "application/dns-json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"Status":0,"TC":false,"RD":true,"RA":true,"AD":false,"CD":true,
               "Question":[{"name":"example.com","type":1}],
               "Answer":[{"name":"example.com","type":1,"TTL":300,"data":"93.184.216.34"}]}"#,
            "application/dns-json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server, "/resolve")
        .query(&DohRequest::new("example.com").with_checking_disabled(true))
        .await
        .unwrap();
    assert!(response.checking_disabled);
    assert_eq!(response.answers()[0].data, "93.184.216.34");
}

#[tokio::test]
async fn test_provider_status_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"bad"}"#))
        .mount(&server)
        .await;

    match client(&server, "/resolve")
        .query(&DohRequest::new("example.com"))
        .await
        .unwrap_err()
    {
        FetchError::Upstream { status, reason, .. } => {
            assert_eq!(status, 400);
            assert_eq!(reason, "Bad Request");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(aaaa_answer())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = client(&server, "/dns-query")
        .with_timeout(Duration::from_millis(50))
        .query(&DohRequest::new("example.com"))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_reverse_lookup_ipv6() {
    let server = MockServer::start().await;
    let reverse = "1.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa";
    Mock::given(method("GET"))
        .and(query_param("name", reverse))
        .and(query_param("type", "PTR"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"Status":0,"TC":false,"RD":true,"RA":true,"AD":false,"CD":false,
               "Question":[{{"name":"{reverse}","type":12}}],
               "Answer":[{{"name":"{reverse}","type":12,"TTL":60,"data":"host.example."}}]}}"#
        )))
        .expect(1)
        .mount(&server)
        .await;

    let ip: IpAddr = "2001:db8::1".parse().unwrap();
    let name = client(&server, "/resolve").reverse_lookup(ip).await.unwrap();
    assert_eq!(name.as_deref(), Some("host.example"));
}
