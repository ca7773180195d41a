//! Chunked response streaming tests.

use std::time::{Duration, Instant};

use spillway::http::{Exchange, Handler, Response};
use http::StatusCode;

mod common;

#[tokio::test]
async fn timer_streams_ten_ticks_then_serves_next_request() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, shutdown) = common::start_server(common::demo_handler(dir.path(), false, 20)).await;

    let mut stream = common::connect(addr).await;
    let mut buf = Vec::new();
    let started = Instant::now();
    common::send(&mut stream, b"GET /timer HTTP/1.1\r\nHost: x\r\n\r\n").await;

    let (head, chunks) = common::read_chunked_response(&mut stream, &mut buf).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "{head}");
    assert_eq!(common::field(&head, "transfer-encoding"), Some("chunked"));
    assert!(common::field(&head, "content-length").is_none());

    let expected: Vec<Vec<u8>> = (0..10).map(|i| format!("{i}\r\n").into_bytes()).collect();
    assert_eq!(chunks, expected);
    // Ten ticks plus the trailing interval before the terminator.
    assert!(started.elapsed() >= Duration::from_millis(11 * 20));

    // Connection stays usable.
    common::send(&mut stream, b"GET /next HTTP/1.1\r\n\r\n").await;
    let (head, _) = common::read_sized_response(&mut stream, &mut buf).await;
    assert!(head.starts_with("HTTP/1.1 404"));

    shutdown.trigger();
}

/// Sends a fixed chunk sequence inline, without a worker task.
struct ThreeChunks;

impl Handler for ThreeChunks {
    async fn handle(&self, mut exchange: Exchange) {
        let mut res = Response::for_request(StatusCode::OK, &exchange.request().head);
        res.set_chunked(true);
        exchange.send(res).await.unwrap();
        for part in ["c1", "", "chunk-three"] {
            exchange.send_chunk(Some(part.as_bytes())).await.unwrap();
        }
        exchange.send_chunk(Some(b"c2")).await.unwrap();
        exchange.send_chunk(None).await.unwrap();
    }
}

#[tokio::test]
async fn chunk_sequence_is_framed_in_order() {
    let (addr, shutdown) = common::start_server(ThreeChunks).await;

    let mut stream = common::connect(addr).await;
    let mut buf = Vec::new();
    common::send(&mut stream, b"GET / HTTP/1.1\r\n\r\n").await;

    let head = common::read_head(&mut stream, &mut buf).await;
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    let expected = b"2\r\nc1\r\nb\r\nchunk-three\r\n2\r\nc2\r\n0\r\n\r\n";
    while buf.len() < expected.len() {
        let mut tmp = [0u8; 256];
        let n = tokio::io::AsyncReadExt::read(&mut stream, &mut tmp).await.unwrap();
        assert!(n > 0);
        buf.extend_from_slice(&tmp[..n]);
    }
    assert_eq!(&buf[..], &expected[..]);

    shutdown.trigger();
}

/// Never answers; the session must close the connection.
struct Silent;

impl Handler for Silent {
    async fn handle(&self, exchange: Exchange) {
        drop(exchange);
    }
}

#[tokio::test]
async fn dropped_exchange_closes_connection() {
    let (addr, shutdown) = common::start_server(Silent).await;

    let mut stream = common::connect(addr).await;
    common::send(&mut stream, b"GET / HTTP/1.1\r\n\r\n").await;
    common::expect_closed(&mut stream).await;

    shutdown.trigger();
}
