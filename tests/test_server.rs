use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use lantern::config::Config;
use lantern::server::listener;
use lantern::server_log::ServerLog;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn start(root: &Path, num_threads: usize) -> SocketAddr {
    let cfg = Config {
        num_threads,
        root_directory: root.to_path_buf(),
        ..Config::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = listener::run(listener, &cfg, ServerLog::disabled()).await;
    });
    addr
}

fn content_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<p>home</p>").unwrap();
    dir
}

/// Sends one request and reads until the server closes the connection.
async fn fetch(stream: &mut TcpStream, request: &str) -> String {
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .expect("server should close the connection")
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_serves_default_document_over_tcp() {
    let root = content_root();
    let addr = start(root.path(), 4).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let response = fetch(&mut stream, "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    assert!(response.contains("content-length: 11\r\n"));
    assert!(response.contains("content-type: text/html; charset=utf-8\r\n"));
    assert!(response.ends_with("\r\n\r\n<p>home</p>"));
}

#[tokio::test]
async fn test_missing_file_over_tcp() {
    let root = content_root();
    let addr = start(root.path(), 4).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let response = fetch(&mut stream, "GET /nope.txt HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(response.contains("content-length: 0\r\n"));
    assert!(response.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn test_keep_alive_serves_several_requests_on_one_socket() {
    let root = content_root();
    let addr = start(root.path(), 4).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let keep = "GET /index.html HTTP/1.1\r\nHost: localhost\r\nConnection: keep-alive\r\n\r\n";
    let last = "GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n";
    let response = fetch(&mut stream, &format!("{keep}{keep}{last}")).await;

    assert_eq!(response.matches("HTTP/1.1 200 OK\r\n").count(), 3);
    assert!(response.contains("keep-alive: timeout=3,max=4\r\n"));
    assert!(response.contains("keep-alive: timeout=3,max=3\r\n"));
    assert_eq!(response.matches("connection: close\r\n").count(), 1);
}

#[tokio::test]
async fn test_connections_beyond_the_bound_wait_for_a_slot() {
    let root = content_root();
    let addr = start(root.path(), 1).await;

    // Holds the only slot: the first request on a connection is not timed
    let idle = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut waiting = TcpStream::connect(addr).await.unwrap();
    waiting
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();

    let mut buf = [0u8; 64];
    let early = tokio::time::timeout(Duration::from_millis(300), waiting.read(&mut buf)).await;
    assert!(early.is_err(), "served while the only slot was busy");

    drop(idle);

    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), waiting.read_to_end(&mut out))
        .await
        .expect("served once the slot was released")
        .unwrap();
    assert!(out.starts_with(b"HTTP/1.1 200 OK\r\n"));
}
