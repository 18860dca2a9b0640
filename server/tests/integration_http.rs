use search_core::IndexBuilder;
use searchd::listener::AddrFamily;
use searchd::HttpServer;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn fish_chips_index() -> Arc<search_core::WordIndex> {
    let mut builder = IndexBuilder::new();
    for _ in 0..3 {
        builder.record("fish", "a.txt");
    }
    for _ in 0..2 {
        builder.record("chips", "a.txt");
    }
    builder.record("fish", "b.txt");
    Arc::new(builder.build())
}

/// Bind on port 0, spawn the accept loop, return the address to dial.
fn start_server(base_dir: &Path) -> SocketAddr {
    let server = HttpServer::bind(
        0,
        AddrFamily::V4,
        base_dir.to_path_buf(),
        fish_chips_index(),
        4,
    )
    .expect("bind");
    let addr = server.local_addr().expect("local addr");
    tokio::spawn(async move { server.serve().await });
    SocketAddr::new([127, 0, 0, 1].into(), addr.port())
}

struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

/// Read one response off the stream. `carry` holds bytes that belong to the
/// next response when the server pipelines answers back-to-back.
async fn read_response(stream: &mut TcpStream, carry: &mut Vec<u8>) -> Response {
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        if let Some(pos) = carry.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await.expect("read");
        assert!(n > 0, "connection closed before header end");
        carry.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8(carry[..header_end].to_vec()).expect("utf-8 head");
    let mut lines = head.split("\r\n");
    let status: u16 = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
        .expect("status line");
    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }
    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .expect("content-length");

    let mut rest = carry.split_off(header_end + 4);
    carry.clear();
    while rest.len() < content_length {
        let n = stream.read(&mut chunk).await.expect("read body");
        assert!(n > 0, "connection closed mid-body");
        rest.extend_from_slice(&chunk[..n]);
    }
    let body = rest[..content_length].to_vec();
    *carry = rest.split_off(content_length);
    Response {
        status,
        headers,
        body,
    }
}

async fn get(addr: SocketAddr, target: &str) -> Response {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream
        .write_all(format!("GET {target} HTTP/1.1\r\n\r\n").as_bytes())
        .await
        .expect("write request");
    let mut carry = Vec::new();
    read_response(&mut stream, &mut carry).await
}

fn body_text(resp: &Response) -> String {
    String::from_utf8(resp.body.clone()).expect("utf-8 body")
}

#[tokio::test]
async fn query_returns_conjunctive_ranked_results() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path());

    let resp = get(addr, "/query?terms=fish+chips").await;
    assert_eq!(resp.status, 200);
    let body = body_text(&resp);
    assert!(body.contains("<a href=\"/static/a.txt\">a.txt</a> [5]"));
    assert!(!body.contains("b.txt"));
}

#[tokio::test]
async fn bare_query_serves_the_landing_page() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path());

    let resp = get(addr, "/query").await;
    assert_eq!(resp.status, 200);
    let body = body_text(&resp);
    assert!(body.contains("<form action=\"/query\""));
    assert!(!body.contains("results found"));
}

#[tokio::test]
async fn static_file_round_trips_with_content_type() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hello world").unwrap();
    let addr = start_server(dir.path());

    let resp = get(addr, "/static/hello.txt").await;
    assert_eq!(resp.status, 200);
    assert_eq!(
        resp.headers.get("content-type").map(String::as_str),
        Some("text/plain")
    );
    assert_eq!(resp.body, b"hello world");
}

#[tokio::test]
async fn path_traversal_is_rejected_with_400() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path());

    let resp = get(addr, "/static/../../etc/passwd").await;
    assert_eq!(resp.status, 400);
    assert!(!body_text(&resp).contains("root:"));
}

#[tokio::test]
async fn missing_file_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path());

    let resp = get(addr, "/static/missing.txt").await;
    assert_eq!(resp.status, 404);
}

#[tokio::test]
async fn pipelined_requests_get_both_responses_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path());

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"GET /query?terms=fish HTTP/1.1\r\n\r\nGET /query?terms=chips HTTP/1.1\r\n\r\n",
        )
        .await
        .unwrap();

    let mut carry = Vec::new();
    let first = read_response(&mut stream, &mut carry).await;
    let second = read_response(&mut stream, &mut carry).await;

    assert_eq!(first.status, 200);
    assert_eq!(second.status, 200);
    let first_body = body_text(&first);
    assert!(first_body.contains("a.txt</a> [3]"));
    assert!(first_body.contains("b.txt</a> [1]"));
    let second_body = body_text(&second);
    assert!(second_body.contains("a.txt</a> [2]"));
    assert!(!second_body.contains("b.txt"));
}

#[tokio::test]
async fn connection_close_header_ends_the_connection_silently() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path());

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /query HTTP/1.1\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty(), "close-requesting request gets no response");
}

#[tokio::test]
async fn malformed_request_closes_without_a_response() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path());

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nno separator here\r\n\r\n")
        .await
        .unwrap();

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn sequential_requests_reuse_one_connection() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hi").unwrap();
    let addr = start_server(dir.path());

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut carry = Vec::new();

    stream
        .write_all(b"GET /static/hello.txt HTTP/1.1\r\n\r\n")
        .await
        .unwrap();
    let first = read_response(&mut stream, &mut carry).await;
    assert_eq!(first.status, 200);

    stream
        .write_all(b"GET /query?terms=fish HTTP/1.1\r\n\r\n")
        .await
        .unwrap();
    let second = read_response(&mut stream, &mut carry).await;
    assert_eq!(second.status, 200);
    assert!(body_text(&second).contains("a.txt"));
}
