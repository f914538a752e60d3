//! End-to-end fetch tests against a local wiremock server using the real
//! reqwest transport.

use std::sync::Arc;
use std::time::Duration;

use fetch_hole::config::CACHE_HIT_HEADER;
use fetch_hole::error_handling::{ErrorType, InfoType};
use fetch_hole::{FetchError, FetchHole, FetchOverrides, FetchRequest, StreamEvent};
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine() -> FetchHole {
    FetchHole::with_reqwest(FetchOverrides::default()).expect("Failed to build engine")
}

#[tokio::test]
async fn test_post_301_is_followed_as_get() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/next"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(ResponseTemplate::new(200).set_body_string("done"))
        .expect(1)
        .mount(&server)
        .await;

    let request = FetchRequest::post(&format!("{}/start", server.uri()), "payload")
        .unwrap()
        .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    let response = engine()
        .fetch(request, &FetchOverrides::default())
        .await
        .unwrap();

    assert!(response.redirected);
    assert_eq!(response.url.path(), "/next");
    assert_eq!(response.url_list.len(), 2);
    assert_eq!(response.text().await.unwrap(), "done");

    let received = server.received_requests().await.unwrap();
    let follow_up = &received[1];
    assert_eq!(follow_up.method.as_str(), "GET");
    assert!(follow_up.body.is_empty());
    assert!(follow_up.headers.get("content-type").is_none());
}

#[tokio::test]
async fn test_cross_origin_redirect_drops_authorization() {
    let origin_a = MockServer::start().await;
    let origin_b = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/landing", origin_b.uri())),
        )
        .mount(&origin_a)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(ResponseTemplate::new(200).set_body_string("b"))
        .expect(1)
        .mount(&origin_b)
        .await;

    let request = FetchRequest::post(&format!("{}/", origin_a.uri()), "data")
        .unwrap()
        .with_header(AUTHORIZATION, HeaderValue::from_static("secret"));
    let fetch_hole = engine();
    fetch_hole
        .fetch(request, &FetchOverrides::default())
        .await
        .unwrap();

    let received = origin_b.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
    assert!(received[0].body.is_empty());
    // Referrer is reduced to the origin when crossing origins.
    assert_eq!(
        received[0]
            .headers
            .get("referer")
            .and_then(|v| v.to_str().ok()),
        Some(format!("{}/", origin_a.uri()).as_str())
    );
    assert_eq!(
        fetch_hole
            .stats()
            .get_info_count(InfoType::CrossOriginRedirect),
        1
    );
}

#[tokio::test]
async fn test_redirect_limit() {
    let server = MockServer::start().await;
    for hop in 0..3 {
        Mock::given(method("GET"))
            .and(path(format!("/hop/{}", hop)))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("/hop/{}", hop + 1)),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/hop/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("end"))
        .mount(&server)
        .await;

    let url = format!("{}/hop/0", server.uri());
    let fetch_hole = engine();

    // A failed fetch stores nothing, so the second call still hits the network.
    let short = FetchOverrides {
        redirect_count: Some(2),
        ..Default::default()
    };
    let err = fetch_hole
        .fetch(FetchRequest::get(&url).unwrap(), &short)
        .await
        .unwrap_err();
    match err {
        FetchError::Network { hops, .. } => assert_eq!(hops, 2),
        other => panic!("unexpected error: {other:?}"),
    }

    let exact = FetchOverrides {
        redirect_count: Some(3),
        ..Default::default()
    };
    let response = fetch_hole
        .fetch(FetchRequest::get(&url).unwrap(), &exact)
        .await
        .unwrap();
    assert_eq!(response.url_list.len(), 4);
    assert_eq!(response.text().await.unwrap(), "end");
}

#[tokio::test]
async fn test_second_fetch_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/cached", server.uri());
    let fetch_hole = engine();

    let first = fetch_hole
        .fetch(FetchRequest::get(&url).unwrap(), &FetchOverrides::default())
        .await
        .unwrap();
    assert!(first.headers.get(CACHE_HIT_HEADER).is_none());
    assert!(first.headers.get("etag").is_some());

    let second = fetch_hole
        .fetch(FetchRequest::get(&url).unwrap(), &FetchOverrides::default())
        .await
        .unwrap();
    assert_eq!(second.headers[CACHE_HIT_HEADER], "memory");
    assert_eq!(second.text().await.unwrap(), "hello");
    assert_eq!(fetch_hole.stats().get_info_count(InfoType::CacheHit), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fetch_runs_on_spawned_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(ResponseTemplate::new(200).set_body_string("shared"))
        .mount(&server)
        .await;

    let url = format!("{}/shared", server.uri());
    let fetch_hole = Arc::new(engine());
    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let fetch_hole = Arc::clone(&fetch_hole);
            let url = url.clone();
            tokio::spawn(async move {
                fetch_hole
                    .fetch(FetchRequest::get(&url).unwrap(), &FetchOverrides::default())
                    .await
            })
        })
        .collect();
    for task in tasks {
        let response = task.await.unwrap().unwrap();
        assert_eq!(response.text().await.unwrap(), "shared");
    }
    assert_eq!(fetch_hole.cache().len(), 1);
}

#[tokio::test]
async fn test_hard_and_soft_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let url = format!("{}/broken", server.uri());
    let fetch_hole = engine();

    let err = fetch_hole
        .fetch(FetchRequest::get(&url).unwrap(), &FetchOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FetchError::Upstream {
            status: 500,
            hops: 0,
            ..
        }
    ));

    let soft = FetchOverrides {
        hard_fail: Some(false),
        ..Default::default()
    };
    let response = fetch_hole
        .fetch(FetchRequest::get(&url).unwrap(), &soft)
        .await
        .unwrap();
    assert_eq!(response.status.as_u16(), 500);
    assert_eq!(
        fetch_hole
            .stats()
            .get_error_count(ErrorType::UpstreamServerError),
        2
    );
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let overrides = FetchOverrides {
        timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    };
    let err = engine()
        .fetch(
            FetchRequest::get(&format!("{}/slow", server.uri())).unwrap(),
            &overrides,
        )
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_event_stream_is_demultiplexed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(": keep-alive\ndata: {\"n\":1}\ndata: {\"n\":2}\n"),
        )
        .mount(&server)
        .await;

    let fetch_hole = engine();
    let mut response = fetch_hole
        .fetch(
            FetchRequest::get(&format!("{}/events", server.uri())).unwrap(),
            &FetchOverrides::default(),
        )
        .await
        .unwrap();
    assert!(fetch_hole.cache().is_empty());

    let mut channels = response.events.take().expect("event channels");
    let mut numbers = Vec::new();
    while let Some(event) = channels.json.recv().await {
        match event {
            StreamEvent::Chunk { data, .. } => numbers.push(data["n"].as_u64().unwrap()),
            StreamEvent::End => break,
        }
    }
    assert_eq!(numbers, vec![1, 2]);
}
