//! Integration tests for `HttpSource` against a local plain-HTTP server.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use verigen::catalog::{Repository, RepositoryCatalog};
use verigen::digest::download::{ArtifactSource, DIGEST_FILE_READ_LIMIT, HttpSource, Timeouts};
use verigen::digest::error::DownloadError;
use verigen::pipeline::{PipelineOptions, run_pipeline};

const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

type Routes = HashMap<&'static str, (u16, Vec<u8>)>;

/// Serve `requests` connections, answering from `routes` and 404 otherwise.
///
/// The join handle yields the request paths in arrival order.
fn spawn_server(routes: Routes, requests: usize) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let handle = std::thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..requests {
            let (mut stream, _) = listener.accept().expect("accept");
            let path = read_request_path(&mut stream);
            let (status, body) = routes
                .get(path.as_str())
                .cloned()
                .unwrap_or((404, b"missing".to_vec()));
            respond(&mut stream, status, &body);
            seen.push(path);
        }
        seen
    });
    (format!("http://{addr}"), handle)
}

fn read_request_path(stream: &mut TcpStream) -> String {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    loop {
        let mut header = String::new();
        let read = reader.read_line(&mut header).expect("header line");
        if read == 0 || header == "\r\n" {
            break;
        }
    }
    request_line
        .split_whitespace()
        .nth(1)
        .expect("request path")
        .to_owned()
}

fn respond(stream: &mut TcpStream, status: u16, body: &[u8]) {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    let head = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    // The client may hang up early once it has read enough.
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.shutdown(Shutdown::Both);
}

/// Accept one connection and read the request, then send nothing until the
/// returned sender is dropped.
fn spawn_stalled_server() -> (String, mpsc::Sender<()>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let (release, wait) = mpsc::channel::<()>();
    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        read_request_path(&mut stream);
        // Err once the sender is dropped.
        let _ = wait.recv();
    });
    (format!("http://{addr}"), release, handle)
}

/// Answer `requests` connections with `body`, each after `delay`.
fn spawn_slow_server(
    delay: Duration,
    body: &'static [u8],
    requests: usize,
) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let handle = std::thread::spawn(move || {
        for _ in 0..requests {
            let (mut stream, _) = listener.accept().expect("accept");
            read_request_path(&mut stream);
            std::thread::sleep(delay);
            respond(&mut stream, 200, body);
        }
    });
    (format!("http://{addr}"), handle)
}

fn timeouts(digest_read: Duration, artifact_read: Duration) -> Timeouts {
    Timeouts {
        digest_connect: Duration::from_secs(1),
        digest_read,
        artifact_connect: Duration::from_secs(1),
        artifact_read,
    }
}

#[test]
fn digest_file_body_is_returned_on_success() {
    let digest = "a".repeat(64);
    let routes = Routes::from([("/a.jar.sha256", (200, digest.clone().into_bytes()))]);
    let (base, server) = spawn_server(routes, 1);

    let body = HttpSource::default()
        .fetch_digest_file(&format!("{base}/a.jar.sha256"))
        .expect("digest file");
    assert_eq!(body, digest.as_bytes());
    assert_eq!(server.join().expect("server thread"), ["/a.jar.sha256"]);
}

#[test]
fn missing_digest_file_maps_to_not_found() {
    let (base, server) = spawn_server(Routes::new(), 1);

    let err = HttpSource::default()
        .fetch_digest_file(&format!("{base}/a.jar.sha256"))
        .expect_err("404");
    assert!(matches!(err, DownloadError::NotFound { .. }), "{err:?}");
    server.join().expect("server thread");
}

#[test]
fn server_error_maps_to_http_error() {
    let routes = Routes::from([("/a.jar.sha256", (500, b"boom".to_vec()))]);
    let (base, server) = spawn_server(routes, 1);

    let err = HttpSource::default()
        .fetch_digest_file(&format!("{base}/a.jar.sha256"))
        .expect_err("500");
    match err {
        DownloadError::HttpError { reason, .. } => assert!(reason.contains("500"), "{reason}"),
        other => panic!("expected HttpError, got {other:?}"),
    }
    server.join().expect("server thread");
}

#[test]
fn oversized_digest_file_is_truncated_at_read_limit() {
    let routes = Routes::from([("/a.jar.sha256", (200, vec![b'f'; 10_000]))]);
    let (base, server) = spawn_server(routes, 1);

    let body = HttpSource::default()
        .fetch_digest_file(&format!("{base}/a.jar.sha256"))
        .expect("digest file");
    assert_eq!(body.len() as u64, DIGEST_FILE_READ_LIMIT);
    server.join().expect("server thread");
}

#[test]
fn artifact_body_is_streamed() {
    let routes = Routes::from([("/a.jar", (200, b"hello".to_vec()))]);
    let (base, server) = spawn_server(routes, 1);

    let mut reader = HttpSource::default()
        .open_artifact(&format!("{base}/a.jar"))
        .expect("artifact");
    let mut body = Vec::new();
    reader.read_to_end(&mut body).expect("read body");
    assert_eq!(body, b"hello");
    server.join().expect("server thread");
}

#[test]
fn refused_connection_maps_to_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let err = HttpSource::default()
        .fetch_digest_file(&format!("http://{addr}/a.jar.sha256"))
        .expect_err("connection refused");
    assert!(matches!(err, DownloadError::HttpError { .. }), "{err:?}");
}

#[test]
fn stalled_digest_request_times_out_on_the_digest_budget() {
    let (base, release, server) = spawn_stalled_server();
    let source = HttpSource::new(&timeouts(Duration::from_millis(200), Duration::from_secs(30)));

    let started = Instant::now();
    let err = source
        .fetch_digest_file(&format!("{base}/a.jar.sha256"))
        .expect_err("stalled server");
    let elapsed = started.elapsed();

    assert!(matches!(err, DownloadError::HttpError { .. }), "{err:?}");
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    drop(release);
    server.join().expect("server thread");
}

#[test]
fn stalled_artifact_request_times_out_on_the_artifact_budget() {
    let (base, release, server) = spawn_stalled_server();
    let source = HttpSource::new(&timeouts(Duration::from_secs(30), Duration::from_millis(200)));

    let started = Instant::now();
    let result = source.open_artifact(&format!("{base}/a.jar"));
    let elapsed = started.elapsed();

    match result {
        Err(DownloadError::HttpError { .. }) => {}
        Err(other) => panic!("expected HttpError, got {other:?}"),
        Ok(_) => panic!("stalled server produced a response"),
    }
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    drop(release);
    server.join().expect("server thread");
}

#[test]
fn artifact_budget_outlasts_a_response_too_slow_for_digest_files() {
    // digest request (abandoned), then artifact request
    let (base, server) = spawn_slow_server(Duration::from_millis(500), b"hello", 2);
    let source = HttpSource::new(&timeouts(Duration::from_millis(100), Duration::from_secs(10)));

    let err = source
        .fetch_digest_file(&format!("{base}/a.jar.sha256"))
        .expect_err("digest budget exceeded");
    assert!(matches!(err, DownloadError::HttpError { .. }), "{err:?}");

    let mut reader = source
        .open_artifact(&format!("{base}/a.jar"))
        .expect("artifact within budget");
    let mut body = Vec::new();
    reader.read_to_end(&mut body).expect("read body");
    assert_eq!(body, b"hello");
    server.join().expect("server thread");
}

#[test]
fn pipeline_resolves_against_configured_repository() {
    let routes = Routes::from([
        (
            "/maven2/com/example/foo/1.0/foo-1.0.jar.sha256",
            (200, "0".repeat(64).into_bytes()),
        ),
        (
            "/maven2/com/example/foo/1.0/foo-1.0.pom",
            (200, b"hello".to_vec()),
        ),
    ]);
    // jar digest, pom digest (404), pom body
    let (base, server) = spawn_server(routes, 3);

    let mut catalog = RepositoryCatalog::builtin();
    catalog.insert(Repository::new("Local", &format!("{base}/maven2")).expect("repository"));
    let input = concat!(
        "    - foo-1.0.jar (com.example:foo:1.0) from repository Local\n",
        "    - foo-1.0.pom (com.example:foo:1.0) from repository Local\n",
    );

    let mut stderr = Vec::new();
    let report = run_pipeline(
        input,
        &catalog,
        &HttpSource::default(),
        PipelineOptions::default(),
        &mut stderr,
    )
    .expect("pipeline succeeds");

    let expected = format!(
        concat!(
            "<component group=\"com.example\" name=\"foo\" version=\"1.0\">\n",
            "    <artifact name=\"foo-1.0.jar\">\n",
            "        <sha256 value=\"{zeros}\" origin=\"127.0.0.1\"/>\n",
            "    </artifact>\n",
            "    <artifact name=\"foo-1.0.pom\">\n",
            "        <sha256 value=\"{hello}\" origin=\"127.0.0.1\"/>\n",
            "    </artifact>\n",
            "</component>\n",
        ),
        zeros = "0".repeat(64),
        hello = HELLO_SHA256,
    );
    assert_eq!(report.render(), expected);

    let mut paths = server.join().expect("server thread");
    paths.sort();
    assert_eq!(
        paths,
        [
            "/maven2/com/example/foo/1.0/foo-1.0.jar.sha256",
            "/maven2/com/example/foo/1.0/foo-1.0.pom",
            "/maven2/com/example/foo/1.0/foo-1.0.pom.sha256",
        ]
    );
}
