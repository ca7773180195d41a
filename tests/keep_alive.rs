//! Keep-alive and plain response tests.

use std::time::Duration;

mod common;

#[tokio::test]
async fn unmapped_path_gets_empty_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, shutdown) = common::start_server(common::demo_handler(dir.path(), false, 10)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/nowhere", addr))
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 404);
    assert!(res.headers().get("server").unwrap().to_str().unwrap().starts_with("spillway/"));
    assert!(res.bytes().await.unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn connection_is_reused_after_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, shutdown) = common::start_server(common::demo_handler(dir.path(), false, 10)).await;

    let mut stream = common::connect(addr).await;
    let mut buf = Vec::new();
    for path in ["/a", "/b", "/c"] {
        common::send(&mut stream, format!("GET {path} HTTP/1.1\r\nHost: x\r\n\r\n").as_bytes()).await;
        let (head, body) = common::read_sized_response(&mut stream, &mut buf).await;
        assert!(head.starts_with("HTTP/1.1 404 Not Found\r\n"), "{head}");
        assert!(body.is_empty());
    }
    assert!(buf.is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn connection_close_request_ends_connection() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, shutdown) = common::start_server(common::demo_handler(dir.path(), false, 10)).await;

    let mut stream = common::connect(addr).await;
    let mut buf = Vec::new();
    common::send(&mut stream, b"GET /a HTTP/1.1\r\nConnection: close\r\n\r\n").await;
    let (head, _) = common::read_sized_response(&mut stream, &mut buf).await;
    assert_eq!(common::field(&head, "connection"), Some("close"));
    common::expect_closed(&mut stream).await;

    shutdown.trigger();
}

#[tokio::test]
async fn http10_closes_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, shutdown) = common::start_server(common::demo_handler(dir.path(), false, 10)).await;

    let mut stream = common::connect(addr).await;
    let mut buf = Vec::new();
    common::send(&mut stream, b"GET /a HTTP/1.0\r\n\r\n").await;
    let (head, _) = common::read_sized_response(&mut stream, &mut buf).await;
    assert!(head.starts_with("HTTP/1.0 404 Not Found\r\n"));
    common::expect_closed(&mut stream).await;

    shutdown.trigger();
}

#[tokio::test]
async fn malformed_request_is_dropped_silently() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, shutdown) = common::start_server(common::demo_handler(dir.path(), false, 10)).await;

    let mut stream = common::connect(addr).await;
    common::send(&mut stream, b"GARBAGE\r\n\r\n").await;
    common::expect_closed(&mut stream).await;

    // Other connections are unaffected.
    let mut other = common::connect(addr).await;
    let mut buf = Vec::new();
    common::send(&mut other, b"GET / HTTP/1.1\r\n\r\n").await;
    let (head, _) = common::read_sized_response(&mut other, &mut buf).await;
    assert!(head.starts_with("HTTP/1.1 404"));

    shutdown.trigger();
}

#[tokio::test]
async fn sessions_progress_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    // Slow timer: a blocked session must not hold up another connection.
    let (addr, shutdown) = common::start_server(common::demo_handler(dir.path(), false, 500)).await;

    let mut slow = common::connect(addr).await;
    common::send(&mut slow, b"GET /timer HTTP/1.1\r\n\r\n").await;

    let mut fast = common::connect(addr).await;
    let mut buf = Vec::new();
    common::send(&mut fast, b"GET /other HTTP/1.1\r\n\r\n").await;
    let (head, _) = tokio::time::timeout(
        Duration::from_millis(400),
        common::read_sized_response(&mut fast, &mut buf),
    )
    .await
    .expect("second connection was blocked");
    assert!(head.starts_with("HTTP/1.1 404"));

    shutdown.trigger();
}
