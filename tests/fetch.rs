use solarlog_rs::api;
use solarlog_rs::model::{Field, Timezone};
use solarlog_rs::{Error, TelemetrySnapshot};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const GETJP: &str = include_str!("../resources/test/getjp.json");
const GETJP_MISSING_FIELD: &str = include_str!("../resources/test/getjp_missing_field.json");
const INVALID_JSON: &str = include_str!("../resources/test/invalid_json.json");

/// Request as received by the responder; header names lowercased.
struct Request {
    head: String,
    body: String,
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Serve a single HTTP exchange on a local port, answering with `status` and `body`.
async fn respond_once(status: &'static str, body: String) -> (String, JoinHandle<Request>) {
    let response = format!(
        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    respond_raw(response).await
}

/// Serve a single HTTP exchange on a local port, writing `response` verbatim and closing.
async fn respond_raw(response: String) -> (String, JoinHandle<Request>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let body_start = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before end of headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..body_start]).to_lowercase();
        let length = content_length(&head);
        while buf.len() < body_start + length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before end of body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let request_body = String::from_utf8_lossy(&buf[body_start..body_start + length]).to_string();

        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        Request {
            head,
            body: request_body,
        }
    });

    (host, handle)
}

#[tokio::test]
async fn fetch_sends_fixed_query() {
    let (host, server) = respond_once("200 OK", GETJP.to_string()).await;
    let api = api::api(host, Timezone::default()).unwrap();

    let fields = api::fetch(&api).await.unwrap();
    let request = server.await.unwrap();

    assert!(request.head.starts_with("post /getjp http/1.1\r\n"), "{}", request.head);
    assert!(request.head.contains("content-type: application/json"), "{}", request.head);
    assert_eq!(r#"{"801":{"170":null}}"#, request.body);

    assert_eq!(17, fields.len());
    assert_eq!(Some(&serde_json::Value::from(94)), fields.get(Field::PowerAc));
}

#[tokio::test]
async fn snapshot_fetch() {
    let (host, server) = respond_once("200 OK", GETJP.to_string()).await;
    let api = api::api(format!("{}/", host), "+0200".parse().unwrap()).unwrap();

    let snapshot = TelemetrySnapshot::fetch(&api).await.unwrap();
    server.await.unwrap();

    assert_eq!("2023-06-01T14:30:00+02:00", snapshot.time().to_rfc3339());
    assert_eq!(0.94, snapshot.efficiency());
    assert_eq!(6, snapshot.alternator_loss());
    assert_eq!(44, snapshot.power_available());
    assert_eq!(0.01, snapshot.capacity());
}

#[tokio::test]
async fn server_error_is_not_empty_result() {
    let (host, server) = respond_once("500 Internal Server Error", String::new()).await;
    let api = api::api(host, Timezone::default()).unwrap();

    let result = TelemetrySnapshot::fetch(&api).await;
    server.await.unwrap();

    match result {
        Err(Error::DeviceUnreachable(s)) => assert!(s.contains("500"), "{}", s),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn endpoint_not_found() {
    let (host, server) = respond_once("404 Not Found", String::new()).await;
    let api = api::api(host, Timezone::default()).unwrap();

    let result = api::fetch(&api).await;
    server.await.unwrap();

    assert!(matches!(result, Err(Error::DeviceUnreachable(_))));
}

#[tokio::test]
async fn connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let api = api::api(host, Timezone::default()).unwrap();
    assert!(matches!(
        TelemetrySnapshot::fetch(&api).await,
        Err(Error::DeviceUnreachable(_))
    ));
}

#[tokio::test]
async fn malformed_json() {
    let (host, server) = respond_once("200 OK", INVALID_JSON.to_string()).await;
    let api = api::api(host, Timezone::default()).unwrap();

    let result = api::fetch(&api).await;
    server.await.unwrap();

    match result {
        Err(Error::InvalidResponse(body, _)) => assert_eq!(INVALID_JSON, body),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn missing_field() {
    let (host, server) = respond_once("200 OK", GETJP_MISSING_FIELD.to_string()).await;
    let api = api::api(host, Timezone::default()).unwrap();

    let result = TelemetrySnapshot::fetch(&api).await;
    server.await.unwrap();

    assert!(matches!(result, Err(Error::MissingField(114))));
}

#[tokio::test]
async fn malformed_timestamp() {
    let body = GETJP.replace("01.06.23 14:30:00", "2023-06-01T14:30:00");
    let (host, server) = respond_once("200 OK", body).await;
    let api = api::api(host, Timezone::default()).unwrap();

    let result = TelemetrySnapshot::fetch(&api).await;
    server.await.unwrap();

    match result {
        Err(Error::TimestampParse(value, _)) => assert_eq!("2023-06-01T14:30:00", value),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn connection_dropped_mid_body() {
    let response = String::from(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 5000\r\n\r\n{\"801\":",
    );
    let (host, server) = respond_raw(response).await;
    let api = api::api(host, Timezone::default()).unwrap();

    let result = api::fetch(&api).await;
    server.await.unwrap();

    assert!(
        matches!(result, Err(Error::DeviceUnreachable(_))),
        "unexpected result: {:?}",
        result
    );
}
