use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use preview_server::http::PREVIEW_HEADERS;
use preview_server::server::{self, bind_listener, run_server_loop};
use preview_server::{logger, AppState, Config, ServerError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);
static ACCESS_LOG: OnceLock<PathBuf> = OnceLock::new();

/// All tests in this binary share one access log file
fn access_log_path() -> &'static Path {
    ACCESS_LOG.get_or_init(|| {
        let path = std::env::temp_dir().join(format!(
            "preview-server-it-{}-access.log",
            std::process::id()
        ));
        logger::writer::init(Some(path.to_str().unwrap()), None).unwrap();
        path
    })
}

fn fixture_dir() -> PathBuf {
    let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("preview-server-it-{}-{id}", std::process::id()));
    std::fs::create_dir_all(dir.join("pages").join("home")).unwrap();
    dir
}

struct TestServer {
    addr: SocketAddr,
    root: PathBuf,
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start(root: PathBuf, request_timeout: u64) -> Self {
        access_log_path();

        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.root = root.to_string_lossy().into_owned();
        config.performance.request_timeout = request_timeout;

        let state = Arc::new(AppState::new(&config).unwrap());
        let listener = bind_listener(config.get_socket_addr().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(run_server_loop(listener, state, Arc::clone(&shutdown)));

        Self {
            addr,
            root,
            shutdown,
            handle,
        }
    }

    async fn stop(self) {
        self.shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server loop did not stop")
            .unwrap();
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn assert_preview_headers(&self) {
        for (name, value) in PREVIEW_HEADERS {
            assert_eq!(self.header(name), Some(value), "header {name}");
        }
    }
}

async fn send(addr: SocketAddr, method: &str, target: &str, extra_headers: &[(&str, &str)]) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut request = format!("{method} {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in extra_headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str("\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut raw))
        .await
        .expect("response timed out")
        .unwrap();
    parse_response(&raw)
}

fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator");
    let head = String::from_utf8_lossy(&raw[..split]).into_owned();
    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .expect("bad status line");
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();
    RawResponse {
        status,
        headers,
        body: raw[split + 4..].to_vec(),
    }
}

#[tokio::test]
async fn existing_file_is_returned_byte_for_byte() {
    let root = fixture_dir();
    let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    std::fs::write(root.join("pages/home/avatar.png"), &payload).unwrap();
    let server = TestServer::start(root, 30).await;

    let resp = send(server.addr, "GET", "/pages/home/avatar.png", &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-type"), Some("image/png"));
    assert_eq!(resp.header("content-length"), Some("4096"));
    assert!(resp.header("last-modified").is_some());
    assert_eq!(resp.body, payload);
    resp.assert_preview_headers();

    server.stop().await;
}

#[tokio::test]
async fn missing_file_is_404_with_preview_headers() {
    let server = TestServer::start(fixture_dir(), 30).await;

    let resp = send(server.addr, "GET", "/does/not/exist.js", &[]).await;
    assert_eq!(resp.status, 404);
    resp.assert_preview_headers();

    server.stop().await;
}

#[tokio::test]
async fn probe_path_is_silent_204() {
    let root = fixture_dir();
    std::fs::write(root.join("index.html"), b"<p>preview</p>").unwrap();
    let server = TestServer::start(root, 30).await;

    let resp = send(server.addr, "GET", "/@vite/client", &[]).await;
    assert_eq!(resp.status, 204);
    assert!(resp.body.is_empty());
    resp.assert_preview_headers();

    // A logged request afterwards proves the log is being written
    let marker = format!("/index.html?marker={}", server.addr.port());
    let resp = send(server.addr, "GET", &marker, &[]).await;
    assert_eq!(resp.status, 200);

    let log = std::fs::read_to_string(access_log_path()).unwrap();
    assert!(log.contains(&marker), "access log missing {marker}: {log}");
    assert!(!log.contains("@vite/client"), "probe request was logged: {log}");

    server.stop().await;
}

#[tokio::test]
async fn head_options_and_post() {
    let root = fixture_dir();
    std::fs::write(root.join("app.css"), b"body{}").unwrap();
    let server = TestServer::start(root, 30).await;

    let resp = send(server.addr, "HEAD", "/app.css", &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-length"), Some("6"));
    assert!(resp.body.is_empty());
    resp.assert_preview_headers();

    let resp = send(server.addr, "OPTIONS", "/app.css", &[]).await;
    assert_eq!(resp.status, 204);
    resp.assert_preview_headers();

    let resp = send(server.addr, "POST", "/app.css", &[("Content-Length", "0")]).await;
    assert_eq!(resp.status, 501);
    resp.assert_preview_headers();

    server.stop().await;
}

#[tokio::test]
async fn directory_redirect_index_and_listing() {
    let root = fixture_dir();
    std::fs::write(root.join("pages/home/index.html"), b"<h1>home</h1>").unwrap();
    std::fs::write(root.join("pages/readme.txt"), b"hi").unwrap();
    let server = TestServer::start(root, 30).await;

    let resp = send(server.addr, "GET", "/pages/home?from=tab", &[]).await;
    assert_eq!(resp.status, 301);
    assert_eq!(resp.header("location"), Some("/pages/home/?from=tab"));
    resp.assert_preview_headers();

    let resp = send(server.addr, "GET", "/pages/home/", &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"<h1>home</h1>");

    let resp = send(server.addr, "GET", "/pages/", &[]).await;
    assert_eq!(resp.status, 200);
    let html = String::from_utf8(resp.body).unwrap();
    assert!(html.contains("Directory listing for /pages/"));
    assert!(html.contains("href=\"home/\""));
    assert!(html.contains("href=\"readme.txt\""));

    let resp = send(server.addr, "GET", "/pages/readme.txt/", &[]).await;
    assert_eq!(resp.status, 404);

    server.stop().await;
}

#[tokio::test]
async fn encoded_slash_still_redirects_directory() {
    let root = fixture_dir();
    std::fs::write(root.join("pages/readme.txt"), b"hi").unwrap();
    let server = TestServer::start(root, 30).await;

    let resp = send(server.addr, "GET", "/pages%2F", &[]).await;
    assert_eq!(resp.status, 301);
    assert_eq!(resp.header("location"), Some("/pages%2F/"));
    resp.assert_preview_headers();

    let resp = send(server.addr, "GET", "/pages%2F/", &[]).await;
    assert_eq!(resp.status, 200);
    assert!(String::from_utf8(resp.body).unwrap().contains("href=\"readme.txt\""));

    let resp = send(server.addr, "GET", "/pages/readme.txt%2F", &[]).await;
    assert_eq!(resp.status, 404);

    server.stop().await;
}

#[tokio::test]
async fn parent_segments_stay_inside_root() {
    let root = fixture_dir();
    std::fs::write(root.join("pages/home/data.json"), b"{}").unwrap();
    let server = TestServer::start(root, 30).await;

    let resp = send(server.addr, "GET", "/../../pages/home/data.json", &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"{}");

    let resp = send(server.addr, "GET", "/%2e%2e/%2e%2e/etc/passwd", &[]).await;
    assert_eq!(resp.status, 404);

    server.stop().await;
}

#[tokio::test]
async fn if_modified_since_yields_304() {
    let root = fixture_dir();
    std::fs::write(root.join("main.js"), b"export {}").unwrap();
    let server = TestServer::start(root, 30).await;

    let first = send(server.addr, "GET", "/main.js", &[]).await;
    let last_modified = first.header("last-modified").unwrap().to_string();

    let resp = send(server.addr, "GET", "/main.js", &[("If-Modified-Since", last_modified.as_str())]).await;
    assert_eq!(resp.status, 304);
    assert!(resp.body.is_empty());
    resp.assert_preview_headers();

    let resp = send(
        server.addr,
        "GET",
        "/main.js",
        &[("If-Modified-Since", "Sun, 06 Nov 1994 08:49:37 GMT")],
    )
    .await;
    assert_eq!(resp.status, 200);

    server.stop().await;
}

#[tokio::test]
async fn second_bind_on_same_port_is_handled() {
    let server = TestServer::start(fixture_dir(), 30).await;

    match bind_listener(server.addr) {
        Err(ServerError::AddrInUse { port }) => {
            assert_eq!(port, server.addr.port());
            let message = ServerError::AddrInUse { port }.to_string();
            assert!(message.contains(&port.to_string()));
        }
        other => panic!("expected AddrInUse, got {other:?}"),
    }

    // The first server keeps working
    let resp = send(server.addr, "GET", "/missing", &[]).await;
    assert_eq!(resp.status, 404);

    server.stop().await;
}

#[tokio::test]
async fn run_reports_port_in_use() {
    access_log_path();
    let root = fixture_dir();
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;
    config.server.root = root.to_string_lossy().into_owned();

    let result = tokio::time::timeout(Duration::from_secs(5), server::run(config))
        .await
        .expect("run should fail fast on a taken port");
    match result {
        Err(ServerError::AddrInUse { port: reported }) => assert_eq!(reported, port),
        other => panic!("expected AddrInUse, got {other:?}"),
    }

    drop(occupied);
    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn connections_are_served_one_at_a_time() {
    let root = fixture_dir();
    std::fs::write(root.join("ping.txt"), b"pong").unwrap();
    let server = TestServer::start(root, 1).await;

    // A client that connects and never sends a request holds the loop
    // until the connection timeout expires
    let stalled = TcpStream::connect(server.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    let resp = send(server.addr, "GET", "/ping.txt", &[]).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"pong");
    assert!(
        started.elapsed() >= Duration::from_millis(700),
        "second request was not queued behind the stalled one"
    );

    drop(stalled);
    server.stop().await;
}
