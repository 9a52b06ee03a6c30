//! Scraper behaviour against a throwaway local HTTP server.

use medstat_rs::Error;
use medstat_rs::models::Unit;
use medstat_rs::scrape::{FetchConfig, Scraper, scrape};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

const PAGE: &str = r#"<!DOCTYPE html><html><body>
<table class="statistical-data-table">
  <thead><tr><th>2021</th><th>2022</th><th>2023</th></tr></thead>
  <tbody>
    <tr><td>Primary sector</td></tr>
    <tr><td>N06A</td><td>DDD</td><td>-</td><td>1.234,5</td><td>99</td></tr>
    <tr><td>N06AB</td><td>DDD</td><td>-</td><td>7</td><td>-</td></tr>
  </tbody>
</table></body></html>"#;

/// Serve one request with `status` and `body`, returning the URL to hit.
fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 {
            if line == "\r\n" {
                break;
            }
            line.clear();
        }
        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        stream.flush().unwrap();
    });
    format!("http://{addr}/en/viewDataTables/medicineAndMedicalGroups/x")
}

#[test]
fn fetch_parse_normalize_in_order() {
    let url = serve_once("200 OK", PAGE);
    let mut s = Scraper::with_config(
        url,
        FetchConfig {
            timeout: Some(Duration::from_secs(10)),
            ..Default::default()
        },
    );
    assert!(matches!(s.parse(), Err(Error::State(_))));

    s.fetch().unwrap();
    assert!(s.html().unwrap().contains("statistical-data-table"));
    assert!(matches!(s.normalize(), Err(Error::State(_))));

    let rows = s.parse().unwrap();
    assert_eq!(rows.len(), 4);

    let t = s.normalize().unwrap();
    assert_eq!(t.unit, Unit::Ddd);
    assert_eq!(t.setting, "Primary sector");
    assert_eq!(t.years, vec!["2022", "2023"]);
    assert_eq!(t.removed_years, vec!["2021"]);
    assert_eq!(t.value("N06A", "2022"), Some(1.2345));
    assert_eq!(t.value("N06AB", "2022"), Some(7.0));
    assert_eq!(t.value("N06AB", "2023"), None);
}

#[test]
fn http_error_status_is_a_fetch_error() {
    let url = serve_once("404 Not Found", "gone");
    let mut s = Scraper::new(url.clone());
    match s.fetch() {
        Err(Error::Fetch { url: u, .. }) => assert_eq!(u, url),
        other => panic!("expected fetch error, got {other:?}"),
    }
    assert!(s.html().is_none());
}

#[test]
fn page_without_table_is_not_found() {
    let url = serve_once("200 OK", "<html><body><p>No data</p></body></html>");
    assert!(matches!(scrape(&url), Err(Error::NotFound(_))));
}

#[test]
fn unreachable_host_is_a_fetch_error() {
    // Bind then drop to get a port nothing listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let url = format!("http://127.0.0.1:{port}/");
    assert!(matches!(scrape(&url), Err(Error::Fetch { .. })));
}
