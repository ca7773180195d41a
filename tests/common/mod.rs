//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use spillway::config::{DemoConfig, ListenerConfig, PayloadConfig, SessionConfig};
use spillway::demo::DemoHandler;
use spillway::{Handler, Listener, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Start a server on an ephemeral port.
pub async fn start_server<H: Handler>(handler: H) -> (SocketAddr, Shutdown) {
    let listener = Listener::bind(&ListenerConfig {
        bind_address: "127.0.0.1:0".into(),
        shutdown_grace_secs: 1,
    })
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    tokio::spawn(listener.serve(Arc::new(handler), SessionConfig::default(), shutdown.subscribe()));
    (addr, shutdown)
}

/// Demo handler spilling into `spill_dir` with a fast timer.
pub fn demo_handler(spill_dir: &Path, retain_spilled: bool, timer_interval_ms: u64) -> DemoHandler {
    DemoHandler::new(
        PayloadConfig {
            spill_threshold: 4096,
            spill_dir: Some(spill_dir.to_path_buf()),
            retain_spilled,
        },
        DemoConfig {
            timer_ticks: 10,
            timer_interval_ms,
        },
    )
}

pub async fn connect(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr).await.unwrap()
}

pub async fn send(stream: &mut TcpStream, raw: &[u8]) {
    stream.write_all(raw).await.unwrap();
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Read more bytes into `buf`; panics on EOF or after 5 seconds.
async fn fill(stream: &mut TcpStream, buf: &mut Vec<u8>) {
    let mut tmp = [0u8; 4096];
    let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut tmp))
        .await
        .expect("timed out waiting for server")
        .unwrap();
    assert!(n > 0, "server closed the connection");
    buf.extend_from_slice(&tmp[..n]);
}

/// Read one head section (through the blank line) off the front of `buf`.
pub async fn read_head(stream: &mut TcpStream, buf: &mut Vec<u8>) -> String {
    loop {
        if let Some(end) = find(buf, b"\r\n\r\n") {
            let head: Vec<u8> = buf.drain(..end + 4).collect();
            return String::from_utf8(head).unwrap();
        }
        fill(stream, buf).await;
    }
}

pub fn field<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

/// Read a `Content-Length` framed response.
pub async fn read_sized_response(stream: &mut TcpStream, buf: &mut Vec<u8>) -> (String, Vec<u8>) {
    let head = read_head(stream, buf).await;
    let length: usize = field(&head, "content-length")
        .expect("response has no content-length")
        .parse()
        .unwrap();
    while buf.len() < length {
        fill(stream, buf).await;
    }
    let body = buf.drain(..length).collect();
    (head, body)
}

/// Read a chunked response, returning the head and each chunk's data.
pub async fn read_chunked_response(stream: &mut TcpStream, buf: &mut Vec<u8>) -> (String, Vec<Vec<u8>>) {
    let head = read_head(stream, buf).await;
    let mut chunks = Vec::new();
    loop {
        let line_end = loop {
            if let Some(i) = find(buf, b"\r\n") {
                break i;
            }
            fill(stream, buf).await;
        };
        let size = usize::from_str_radix(std::str::from_utf8(&buf[..line_end]).unwrap(), 16).unwrap();
        while buf.len() < line_end + 2 + size + 2 {
            fill(stream, buf).await;
        }
        let frame: Vec<u8> = buf.drain(..line_end + 2 + size + 2).collect();
        assert_eq!(&frame[frame.len() - 2..], b"\r\n");
        if size == 0 {
            return (head, chunks);
        }
        chunks.push(frame[line_end + 2..line_end + 2 + size].to_vec());
    }
}

/// Assert the peer closes the connection without sending anything more.
pub async fn expect_closed(stream: &mut TcpStream) {
    let mut tmp = [0u8; 64];
    let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut tmp))
        .await
        .expect("connection stayed open")
        .unwrap_or(0);
    assert_eq!(n, 0, "unexpected bytes: {:?}", &tmp[..n]);
}
