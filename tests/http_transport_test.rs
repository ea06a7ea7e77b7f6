//! `HttpTransport` against a loopback server.

use kload::bootstrap::Bootstrap;
use kload::config::TomlConfig;
use kload::error::FetchError;
use kload::fetch::{HttpTransport, Transport};
use kload::host::StandaloneHost;
use std::io::{BufRead, BufReader, Cursor, Read, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Serve `requests` connections. Paths found in `routes` get a 200 with the
/// body, anything else a 404. Returns the base URL.
fn serve(routes: Vec<(String, Vec<u8>)>, requests: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming().take(requests) {
            let mut stream = stream.unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
            }

            let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
            match routes.iter().find(|(p, _)| *p == path) {
                Some((_, body)) => {
                    let head = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        body.len()
                    );
                    stream.write_all(head.as_bytes()).unwrap();
                    stream.write_all(body).unwrap();
                }
                None => {
                    stream
                        .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                        .unwrap();
                }
            }
            stream.flush().unwrap();
        }
    });

    format!("http://{}/", addr)
}

fn jar_bytes(class: &str) -> Vec<u8> {
    let mut jar = zip::ZipWriter::new(Cursor::new(Vec::new()));
    jar.start_file(class, SimpleFileOptions::default()).unwrap();
    jar.write_all(b"\xCA\xFE\xBA\xBE").unwrap();
    jar.finish().unwrap().into_inner()
}

#[test]
fn ok_response_streams_body() {
    let base = serve(vec![("/a.jar".to_string(), b"jar body".to_vec())], 1);

    let download = HttpTransport::new().open(&format!("{base}a.jar")).unwrap();
    assert_eq!(download.length, Some(8));

    let mut body = Vec::new();
    let mut reader = download.reader;
    reader.read_to_end(&mut body).unwrap();
    assert_eq!(body, b"jar body");
}

#[test]
fn not_found_is_a_network_error() {
    let base = serve(Vec::new(), 1);

    let url = format!("{base}missing.jar");
    match HttpTransport::new().open(&url) {
        Err(FetchError::Network { url: failed, .. }) => assert_eq!(failed, url),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("404 must not be a download"),
    }
}

#[test]
fn bootstrap_over_http() {
    let routes = vec![
        (
            "/org/jetbrains/kotlinx/kotlinx-coroutines-jdk8/1.6.4/kotlinx-coroutines-jdk8-1.6.4.jar".to_string(),
            jar_bytes("kotlinx/coroutines/Job.class"),
        ),
        (
            "/org/jetbrains/kotlin/kotlin-stdlib-jdk8/1.8.0/kotlin-stdlib-jdk8-1.8.0.jar".to_string(),
            jar_bytes("kotlin/Unit.class"),
        ),
    ];
    // reflect is not served
    let base = serve(routes, 3);

    let temp = TempDir::new().unwrap();
    let config = TomlConfig::parse(&format!(
        "[kotlin]\nrepository = \"{base}\"\n\n[kotlin.library]\ncoroutines = \"1.6.4\"\nstdlib = \"1.8.0\"\nreflect = \"1.8.0\"\n"
    ))
    .unwrap();
    let host = StandaloneHost::with_config(temp.path(), config);

    let report = Bootstrap::new().run(&host);

    assert_eq!(report.linked().count(), 2);
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.entries[2].library, "reflect");
    assert!(!host.cache_folder().join("kotlin-reflect-1.8.0.jar").exists());
    assert!(host.class_path().find_resource("kotlin/Unit.class").is_some());
}
